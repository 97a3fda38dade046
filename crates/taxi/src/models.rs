//! Fleet models.
//!
//! A [`Driver`] is an account extended with a license number; every account
//! in the fleet is a driver. A [`Car`] is built by a [`Manufacturer`] and may
//! be driven by any number of drivers.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use taxi_auth::User;
use taxi_core::TaxiError;
use taxi_db::fields::{FieldDef, FieldType};
use taxi_db::model::{Model, ModelMeta};
use taxi_db::row::Row;
use taxi_db::value::Value;

static DRIVER_META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
    app_label: "taxi",
    model_name: "driver",
    db_table: "taxi_driver",
    verbose_name: "driver".to_string(),
    fields: vec![
        FieldDef::new("id", FieldType::AutoField).primary_key(),
        FieldDef::new("username", FieldType::CharField)
            .max_length(150)
            .unique(),
        FieldDef::new("password", FieldType::CharField).max_length(128),
        FieldDef::new("first_name", FieldType::CharField)
            .max_length(150)
            .blank(),
        FieldDef::new("last_name", FieldType::CharField)
            .max_length(150)
            .blank(),
        FieldDef::new("email", FieldType::EmailField).blank(),
        FieldDef::new("is_staff", FieldType::BooleanField).default(false),
        FieldDef::new("is_active", FieldType::BooleanField).default(true),
        FieldDef::new("is_superuser", FieldType::BooleanField).default(false),
        FieldDef::new("date_joined", FieldType::DateTimeField).editable(false),
        // length is enforced by the license rules, not the column
        FieldDef::new("license_number", FieldType::CharField)
            .unique()
            .verbose_name("license number"),
    ],
});

static MANUFACTURER_META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
    app_label: "taxi",
    model_name: "manufacturer",
    db_table: "taxi_manufacturer",
    verbose_name: "manufacturer".to_string(),
    fields: vec![
        FieldDef::new("id", FieldType::AutoField).primary_key(),
        FieldDef::new("name", FieldType::CharField)
            .max_length(255)
            .unique(),
        FieldDef::new("country", FieldType::CharField).max_length(255),
    ],
});

static CAR_META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
    app_label: "taxi",
    model_name: "car",
    db_table: "taxi_car",
    verbose_name: "car".to_string(),
    fields: vec![
        FieldDef::new("id", FieldType::AutoField).primary_key(),
        FieldDef::new("model", FieldType::CharField).max_length(255),
        FieldDef::new(
            "manufacturer",
            FieldType::ForeignKey {
                to: "taxi.manufacturer".to_string(),
            },
        ),
        FieldDef::new(
            "drivers",
            FieldType::ManyToManyField {
                to: "taxi.driver".to_string(),
            },
        )
        .blank(),
    ],
});

/// A licensed driver account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    /// The account fields.
    #[serde(flatten)]
    pub user: User,
    /// Three uppercase letters followed by five digits, unique per driver.
    pub license_number: String,
}

impl Driver {
    /// Creates an unsaved driver with an unusable password.
    pub fn new(username: impl Into<String>, license_number: impl Into<String>) -> Self {
        Self {
            user: User::new(username),
            license_number: license_number.into(),
        }
    }

    /// Creates an unsaved driver for an existing (unsaved) account.
    pub fn from_user(user: User, license_number: impl Into<String>) -> Self {
        Self {
            user,
            license_number: license_number.into(),
        }
    }

    pub const fn id(&self) -> Option<i64> {
        self.user.id
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }
}

impl Model for Driver {
    fn meta() -> &'static ModelMeta {
        &DRIVER_META
    }

    fn pk(&self) -> Option<i64> {
        self.user.id
    }

    fn set_pk(&mut self, pk: i64) {
        self.user.id = Some(pk);
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        let u = &self.user;
        vec![
            ("id", u.id.into()),
            ("username", u.username.as_str().into()),
            ("password", u.password.as_str().into()),
            ("first_name", u.first_name.as_str().into()),
            ("last_name", u.last_name.as_str().into()),
            ("email", u.email.as_str().into()),
            ("is_staff", u.is_staff.into()),
            ("is_active", u.is_active.into()),
            ("is_superuser", u.is_superuser.into()),
            ("date_joined", u.date_joined.into()),
            ("license_number", self.license_number.as_str().into()),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, TaxiError> {
        Ok(Self {
            user: User {
                id: row.get("id")?,
                username: row.get("username")?,
                password: row.get("password")?,
                first_name: row.get("first_name")?,
                last_name: row.get("last_name")?,
                email: row.get("email")?,
                is_staff: row.get("is_staff")?,
                is_active: row.get("is_active")?,
                is_superuser: row.get("is_superuser")?,
                date_joined: row.get("date_joined")?,
            },
            license_number: row.get("license_number")?,
        })
    }
}

/// A car manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: Option<i64>,
    pub name: String,
    pub country: String,
}

impl Manufacturer {
    /// Creates an unsaved manufacturer.
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            country: country.into(),
        }
    }
}

impl Model for Manufacturer {
    fn meta() -> &'static ModelMeta {
        &MANUFACTURER_META
    }

    fn pk(&self) -> Option<i64> {
        self.id
    }

    fn set_pk(&mut self, pk: i64) {
        self.id = Some(pk);
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("name", self.name.as_str().into()),
            ("country", self.country.as_str().into()),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, TaxiError> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            country: row.get("country")?,
        })
    }
}

/// A car in the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub id: Option<i64>,
    pub model: String,
    /// Primary key of the manufacturer.
    pub manufacturer_id: i64,
    /// Primary keys of the drivers assigned to this car, in ascending order.
    pub drivers: Vec<i64>,
}

impl Car {
    /// Creates an unsaved car with no drivers.
    pub fn new(model: impl Into<String>, manufacturer_id: i64) -> Self {
        Self {
            id: None,
            model: model.into(),
            manufacturer_id,
            drivers: Vec::new(),
        }
    }

    /// Sets the assigned drivers, sorted and without duplicates.
    #[must_use]
    pub fn with_drivers(mut self, mut drivers: Vec<i64>) -> Self {
        drivers.sort_unstable();
        drivers.dedup();
        self.drivers = drivers;
        self
    }
}

impl Model for Car {
    fn meta() -> &'static ModelMeta {
        &CAR_META
    }

    fn pk(&self) -> Option<i64> {
        self.id
    }

    fn set_pk(&mut self, pk: i64) {
        self.id = Some(pk);
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("model", self.model.as_str().into()),
            ("manufacturer_id", self.manufacturer_id.into()),
        ]
    }

    /// Reads the car's own columns; `drivers` is left empty for the caller
    /// to fill from the link table.
    fn from_row(row: &Row) -> Result<Self, TaxiError> {
        Ok(Self {
            id: row.get("id")?,
            model: row.get("model")?,
            manufacturer_id: row.get("manufacturer_id")?,
            drivers: Vec::new(),
        })
    }
}
