//! Store traits.
//!
//! Forms depend on these traits rather than on a concrete store. Each trait
//! covers one model; [`TaxiStore`] bundles them so a single store value can
//! be shared by every form.

use std::sync::Arc;

use async_trait::async_trait;
use taxi_core::TaxiResult;

use crate::models::{Car, Driver, Manufacturer};

pub use taxi_auth::UserRepository;

/// Driver lookups and writes.
#[async_trait]
pub trait DriverRepository: Send + Sync {
    /// Returns `true` if a driver other than `exclude_pk` holds this license number.
    async fn exists_with_license_number(
        &self,
        license_number: &str,
        exclude_pk: Option<i64>,
    ) -> TaxiResult<bool>;

    /// Inserts a driver and returns it with its primary key.
    ///
    /// A duplicate username or license number is a
    /// [`TaxiError::IntegrityError`](taxi_core::TaxiError) naming the column.
    async fn create_driver(&self, driver: Driver) -> TaxiResult<Driver>;

    /// Fetches one driver, or [`TaxiError::DoesNotExist`](taxi_core::TaxiError).
    async fn get_driver(&self, pk: i64) -> TaxiResult<Driver>;

    /// Returns every driver, ordered by primary key.
    async fn list_drivers(&self) -> TaxiResult<Vec<Driver>>;

    /// Sets the license number of an existing driver.
    async fn update_license_number(&self, pk: i64, license_number: &str) -> TaxiResult<()>;
}

/// Manufacturer lookups and writes.
#[async_trait]
pub trait ManufacturerRepository: Send + Sync {
    /// Inserts a manufacturer and returns it with its primary key.
    async fn create_manufacturer(&self, manufacturer: Manufacturer) -> TaxiResult<Manufacturer>;

    /// Returns every manufacturer, ordered by primary key.
    async fn list_manufacturers(&self) -> TaxiResult<Vec<Manufacturer>>;
}

/// Car lookups and writes.
#[async_trait]
pub trait CarRepository: Send + Sync {
    /// Inserts a car and its driver links.
    ///
    /// An unknown manufacturer or driver is a
    /// [`TaxiError::IntegrityError`](taxi_core::TaxiError) and nothing is written.
    async fn create_car(&self, car: Car) -> TaxiResult<Car>;

    /// Fetches one car with its drivers.
    async fn get_car(&self, pk: i64) -> TaxiResult<Car>;

    /// Returns every car with its drivers, ordered by primary key.
    async fn list_cars(&self) -> TaxiResult<Vec<Car>>;
}

/// Everything the fleet forms need from a store.
///
/// Implemented for every type that implements the four repository traits.
/// The `into_*` methods hand out the store as a single repository.
pub trait TaxiStore:
    UserRepository + DriverRepository + ManufacturerRepository + CarRepository
{
    fn into_users(self: Arc<Self>) -> Arc<dyn UserRepository>;

    fn into_drivers(self: Arc<Self>) -> Arc<dyn DriverRepository>;
}

impl<T> TaxiStore for T
where
    T: UserRepository + DriverRepository + ManufacturerRepository + CarRepository + 'static,
{
    fn into_users(self: Arc<Self>) -> Arc<dyn UserRepository> {
        self
    }

    fn into_drivers(self: Arc<Self>) -> Arc<dyn DriverRepository> {
        self
    }
}
