//! A store over any [`DatabaseBackend`].
//!
//! Run [`migrate`](crate::schema::migrate) once before use.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use taxi_auth::{User, UserRepository};
use taxi_core::TaxiResult;
use taxi_db::backend::{DatabaseBackend, Transaction};
use taxi_db::model::{create_model, create_model_in, update_model_fields, Model};
use taxi_db::value::Value;

use crate::license::LICENSE_FIELD;
use crate::models::{Car, Driver, Manufacturer};
use crate::repository::{CarRepository, DriverRepository, ManufacturerRepository};

/// A store that reads and writes through a database backend.
#[derive(Clone)]
pub struct SqlStore {
    db: Arc<dyn DatabaseBackend>,
}

impl std::fmt::Debug for SqlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlStore")
            .field("vendor", &self.db.vendor())
            .finish()
    }
}

impl SqlStore {
    /// Creates a store over the given backend.
    pub fn new(db: Arc<dyn DatabaseBackend>) -> Self {
        Self { db }
    }

    /// Returns the backend.
    pub fn backend(&self) -> &dyn DatabaseBackend {
        self.db.as_ref()
    }

    async fn count(&self, sql: &str, params: &[Value]) -> TaxiResult<i64> {
        self.db.query_one(sql, params).await?.get("n")
    }

    async fn fetch_all<M: Model>(&self) -> TaxiResult<Vec<M>> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY {}",
            M::table_name(),
            M::pk_field_name()
        );
        self.db
            .query(&sql, &[])
            .await?
            .iter()
            .map(M::from_row)
            .collect()
    }

    /// Loads driver links for the given cars, keyed by car id.
    async fn driver_links(&self, car_id: Option<i64>) -> TaxiResult<HashMap<i64, Vec<i64>>> {
        let rows = match car_id {
            Some(pk) => {
                self.db
                    .query(
                        "SELECT car_id, driver_id FROM taxi_car_drivers \
                         WHERE car_id = ? ORDER BY driver_id",
                        &[Value::Int(pk)],
                    )
                    .await?
            }
            None => {
                self.db
                    .query(
                        "SELECT car_id, driver_id FROM taxi_car_drivers ORDER BY car_id, driver_id",
                        &[],
                    )
                    .await?
            }
        };
        let mut links: HashMap<i64, Vec<i64>> = HashMap::new();
        for row in rows {
            links
                .entry(row.get("car_id")?)
                .or_default()
                .push(row.get("driver_id")?);
        }
        Ok(links)
    }
}

/// Inserts a car and its driver links inside `txn`.
async fn insert_car(car: &mut Car, txn: &mut dyn Transaction) -> TaxiResult<()> {
    create_model_in(car, txn).await?;
    let car_id = car.pk().unwrap_or_default();
    for driver_id in &car.drivers {
        txn.execute(
            "INSERT INTO taxi_car_drivers (car_id, driver_id) VALUES (?, ?)",
            &[Value::Int(car_id), Value::Int(*driver_id)],
        )
        .await?;
    }
    Ok(())
}

#[async_trait]
impl UserRepository for SqlStore {
    async fn username_exists(&self, username: &str) -> TaxiResult<bool> {
        let n = self
            .count(
                "SELECT COUNT(*) AS n FROM taxi_driver WHERE username = ?",
                &[Value::from(username)],
            )
            .await?;
        Ok(n > 0)
    }

    async fn list_users(&self) -> TaxiResult<Vec<User>> {
        Ok(self
            .fetch_all::<Driver>()
            .await?
            .into_iter()
            .map(|d| d.user)
            .collect())
    }
}

#[async_trait]
impl DriverRepository for SqlStore {
    async fn exists_with_license_number(
        &self,
        license_number: &str,
        exclude_pk: Option<i64>,
    ) -> TaxiResult<bool> {
        let n = match exclude_pk {
            Some(pk) => {
                self.count(
                    "SELECT COUNT(*) AS n FROM taxi_driver WHERE license_number = ? AND id <> ?",
                    &[Value::from(license_number), Value::Int(pk)],
                )
                .await?
            }
            None => {
                self.count(
                    "SELECT COUNT(*) AS n FROM taxi_driver WHERE license_number = ?",
                    &[Value::from(license_number)],
                )
                .await?
            }
        };
        Ok(n > 0)
    }

    async fn create_driver(&self, mut driver: Driver) -> TaxiResult<Driver> {
        create_model(&mut driver, self.db.as_ref()).await?;
        Ok(driver)
    }

    async fn get_driver(&self, pk: i64) -> TaxiResult<Driver> {
        let row = self
            .db
            .query_one("SELECT * FROM taxi_driver WHERE id = ?", &[Value::Int(pk)])
            .await?;
        Driver::from_row(&row)
    }

    async fn list_drivers(&self) -> TaxiResult<Vec<Driver>> {
        self.fetch_all().await
    }

    async fn update_license_number(&self, pk: i64, license_number: &str) -> TaxiResult<()> {
        let mut driver = self.get_driver(pk).await?;
        driver.license_number = license_number.to_string();
        update_model_fields(&driver, &[LICENSE_FIELD], self.db.as_ref()).await
    }
}

#[async_trait]
impl ManufacturerRepository for SqlStore {
    async fn create_manufacturer(&self, mut manufacturer: Manufacturer) -> TaxiResult<Manufacturer> {
        create_model(&mut manufacturer, self.db.as_ref()).await?;
        Ok(manufacturer)
    }

    async fn list_manufacturers(&self) -> TaxiResult<Vec<Manufacturer>> {
        self.fetch_all().await
    }
}

#[async_trait]
impl CarRepository for SqlStore {
    async fn create_car(&self, car: Car) -> TaxiResult<Car> {
        let drivers = car.drivers.clone();
        let mut car = car.with_drivers(drivers);

        let mut txn = self.db.begin_transaction().await?;
        match insert_car(&mut car, txn.as_mut()).await {
            Ok(()) => {
                txn.commit().await?;
                Ok(car)
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    async fn get_car(&self, pk: i64) -> TaxiResult<Car> {
        let row = self
            .db
            .query_one("SELECT * FROM taxi_car WHERE id = ?", &[Value::Int(pk)])
            .await?;
        let mut car = Car::from_row(&row)?;
        car.drivers = self
            .driver_links(Some(pk))
            .await?
            .remove(&pk)
            .unwrap_or_default();
        Ok(car)
    }

    async fn list_cars(&self) -> TaxiResult<Vec<Car>> {
        let mut links = self.driver_links(None).await?;
        let mut cars: Vec<Car> = self.fetch_all().await?;
        for car in &mut cars {
            if let Some(pk) = car.id {
                car.drivers = links.remove(&pk).unwrap_or_default();
            }
        }
        Ok(cars)
    }
}
