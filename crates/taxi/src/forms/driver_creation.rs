use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use taxi_auth::UserCreationForm;
use taxi_core::logging::form_span;
use taxi_core::{Settings, TaxiError, TaxiResult};
use taxi_db::value::Value;
use taxi_forms::fields::{FormFieldDef, FormFieldType};
use taxi_forms::form::Form;
use taxi_forms::model_form::ModelForm;
use taxi_forms::querydict::QueryDict;
use tracing::Instrument;

use super::reject_on_save;
use crate::license::{is_license_conflict, LicenseNumberCleaner, LicenseRule, LICENSE_FIELD};
use crate::models::Driver;
use crate::repository::{DriverRepository, TaxiStore};

/// Registers a new driver: an account with a license number and a name.
///
/// Fields: `username`, `password1`, `password2`, `license_number`,
/// `first_name`, `last_name`, all required.
pub struct DriverCreationForm {
    inner: UserCreationForm,
    store: Arc<dyn TaxiStore>,
}

impl DriverCreationForm {
    /// Creates the form. Passwords need at least `min_password_length` characters.
    pub fn new(store: Arc<dyn TaxiStore>, min_password_length: usize) -> Self {
        let mut inner = UserCreationForm::new(Arc::clone(&store).into_users(), min_password_length);
        let base = inner.base_mut();
        base.add_field(
            FormFieldDef::new(LICENSE_FIELD, FormFieldType::char(None)).label("License number"),
        );
        base.add_field(
            FormFieldDef::new("first_name", FormFieldType::char(Some(150))).label("First name"),
        );
        base.add_field(
            FormFieldDef::new("last_name", FormFieldType::char(Some(150))).label("Last name"),
        );
        base.add_field_cleaner(Box::new(LicenseNumberCleaner::new(
            Arc::clone(&store).into_drivers(),
        )));
        Self { inner, store }
    }

    /// Creates the form with the password policy from settings.
    pub fn from_settings(store: Arc<dyn TaxiStore>, settings: &Settings) -> Self {
        Self::new(store, settings.password_min_length)
    }
}

#[async_trait]
impl Form for DriverCreationForm {
    fn fields(&self) -> &[FormFieldDef] {
        self.inner.fields()
    }

    fn initial(&self) -> &HashMap<String, Value> {
        self.inner.initial()
    }

    fn bind(&mut self, data: &QueryDict) {
        self.inner.bind(data);
    }

    fn is_bound(&self) -> bool {
        self.inner.is_bound()
    }

    fn is_validated(&self) -> bool {
        self.inner.is_validated()
    }

    async fn is_valid(&mut self) -> bool {
        self.inner
            .is_valid()
            .instrument(form_span("driver_creation"))
            .await
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        self.inner.errors()
    }

    fn cleaned_data(&self) -> &HashMap<String, Value> {
        self.inner.cleaned_data()
    }

    fn add_error(&mut self, field: &str, message: String) {
        self.inner.add_error(field, message);
    }
}

#[async_trait]
impl ModelForm for DriverCreationForm {
    type Model = Driver;

    fn instance(&self) -> Option<&Driver> {
        None
    }

    /// Creates the driver with a hashed password.
    async fn save(&mut self) -> TaxiResult<Driver> {
        async move {
            let user = self.inner.build_user().await?;
            let license_number = self
                .cleaned_data()
                .get(LICENSE_FIELD)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            let created = self
                .store
                .create_driver(Driver::from_user(user, license_number))
                .await;
            match created {
                Ok(driver) => {
                    tracing::info!(pk = driver.id(), username = driver.username(), "driver created");
                    Ok(driver)
                }
                Err(e) if is_license_conflict(&e) => {
                    Err(reject_on_save(self, LICENSE_FIELD, LicenseRule::Unique.message()))
                }
                Err(TaxiError::IntegrityError(m)) if m.contains("username") => Err(reject_on_save(
                    self,
                    "username",
                    "A user with that username already exists.",
                )),
                Err(e) => Err(e),
            }
        }
        .instrument(form_span("driver_creation"))
        .await
    }
}
