//! An in-memory store.
//!
//! Keeps every table in one `RwLock` and enforces the same unique and
//! foreign key constraints as the SQL schema, with the same error shapes.

use async_trait::async_trait;
use taxi_auth::{User, UserRepository};
use taxi_core::{TaxiError, TaxiResult};
use tokio::sync::RwLock;

use crate::models::{Car, Driver, Manufacturer};
use crate::repository::{CarRepository, DriverRepository, ManufacturerRepository};

#[derive(Debug, Default)]
struct Tables {
    drivers: Vec<Driver>,
    manufacturers: Vec<Manufacturer>,
    cars: Vec<Car>,
    next_driver_id: i64,
    next_manufacturer_id: i64,
    next_car_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

fn unique_violation(column: &str) -> TaxiError {
    TaxiError::IntegrityError(format!("UNIQUE constraint failed: {column}"))
}

/// A store that lives in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn username_exists(&self, username: &str) -> TaxiResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.drivers.iter().any(|d| d.user.username == username))
    }

    async fn list_users(&self) -> TaxiResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables.drivers.iter().map(|d| d.user.clone()).collect())
    }
}

#[async_trait]
impl DriverRepository for MemoryStore {
    async fn exists_with_license_number(
        &self,
        license_number: &str,
        exclude_pk: Option<i64>,
    ) -> TaxiResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .drivers
            .iter()
            .any(|d| d.license_number == license_number && d.id() != exclude_pk))
    }

    async fn create_driver(&self, mut driver: Driver) -> TaxiResult<Driver> {
        let mut tables = self.tables.write().await;
        if tables.drivers.iter().any(|d| d.user.username == driver.user.username) {
            return Err(unique_violation("taxi_driver.username"));
        }
        if tables
            .drivers
            .iter()
            .any(|d| d.license_number == driver.license_number)
        {
            return Err(unique_violation("taxi_driver.license_number"));
        }
        driver.user.id = Some(next_id(&mut tables.next_driver_id));
        tables.drivers.push(driver.clone());
        Ok(driver)
    }

    async fn get_driver(&self, pk: i64) -> TaxiResult<Driver> {
        let tables = self.tables.read().await;
        tables
            .drivers
            .iter()
            .find(|d| d.id() == Some(pk))
            .cloned()
            .ok_or_else(|| TaxiError::DoesNotExist(format!("driver with pk {pk}")))
    }

    async fn list_drivers(&self) -> TaxiResult<Vec<Driver>> {
        Ok(self.tables.read().await.drivers.clone())
    }

    async fn update_license_number(&self, pk: i64, license_number: &str) -> TaxiResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .drivers
            .iter()
            .any(|d| d.license_number == license_number && d.id() != Some(pk))
        {
            return Err(unique_violation("taxi_driver.license_number"));
        }
        let driver = tables
            .drivers
            .iter_mut()
            .find(|d| d.id() == Some(pk))
            .ok_or_else(|| TaxiError::DoesNotExist(format!("driver with pk {pk}")))?;
        driver.license_number = license_number.to_string();
        Ok(())
    }
}

#[async_trait]
impl ManufacturerRepository for MemoryStore {
    async fn create_manufacturer(&self, mut manufacturer: Manufacturer) -> TaxiResult<Manufacturer> {
        let mut tables = self.tables.write().await;
        if tables.manufacturers.iter().any(|m| m.name == manufacturer.name) {
            return Err(unique_violation("taxi_manufacturer.name"));
        }
        manufacturer.id = Some(next_id(&mut tables.next_manufacturer_id));
        tables.manufacturers.push(manufacturer.clone());
        Ok(manufacturer)
    }

    async fn list_manufacturers(&self) -> TaxiResult<Vec<Manufacturer>> {
        Ok(self.tables.read().await.manufacturers.clone())
    }
}

#[async_trait]
impl CarRepository for MemoryStore {
    async fn create_car(&self, mut car: Car) -> TaxiResult<Car> {
        let mut tables = self.tables.write().await;
        let manufacturer_known = tables
            .manufacturers
            .iter()
            .any(|m| m.id == Some(car.manufacturer_id));
        let drivers_known = car
            .drivers
            .iter()
            .all(|pk| tables.drivers.iter().any(|d| d.id() == Some(*pk)));
        if !manufacturer_known || !drivers_known {
            return Err(TaxiError::IntegrityError(
                "FOREIGN KEY constraint failed".to_string(),
            ));
        }

        let drivers = std::mem::take(&mut car.drivers);
        let mut car = car.with_drivers(drivers);
        car.id = Some(next_id(&mut tables.next_car_id));
        tables.cars.push(car.clone());
        Ok(car)
    }

    async fn get_car(&self, pk: i64) -> TaxiResult<Car> {
        let tables = self.tables.read().await;
        tables
            .cars
            .iter()
            .find(|c| c.id == Some(pk))
            .cloned()
            .ok_or_else(|| TaxiError::DoesNotExist(format!("car with pk {pk}")))
    }

    async fn list_cars(&self) -> TaxiResult<Vec<Car>> {
        Ok(self.tables.read().await.cars.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_driver_constraints() {
        let store = MemoryStore::new();
        let ann = store.create_driver(Driver::new("ann", "ABC12345")).await.unwrap();
        assert_eq!(ann.id(), Some(1));

        let err = store
            .create_driver(Driver::new("bob", "ABC12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, TaxiError::IntegrityError(m) if m.contains("license_number")));
        let err = store
            .create_driver(Driver::new("ann", "XYZ12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, TaxiError::IntegrityError(m) if m.contains("username")));

        assert!(store.exists_with_license_number("ABC12345", None).await.unwrap());
        assert!(!store.exists_with_license_number("ABC12345", Some(1)).await.unwrap());
        assert!(store.username_exists("ann").await.unwrap());
        assert!(!store.username_exists("Ann").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_license_number() {
        let store = MemoryStore::new();
        store.create_driver(Driver::new("ann", "ABC12345")).await.unwrap();
        store.create_driver(Driver::new("bob", "BOB12345")).await.unwrap();

        store.update_license_number(1, "ANN00001").await.unwrap();
        assert_eq!(store.get_driver(1).await.unwrap().license_number, "ANN00001");
        // keeping one's own number is not a conflict
        store.update_license_number(1, "ANN00001").await.unwrap();
        assert!(store.update_license_number(1, "BOB12345").await.is_err());
        assert!(matches!(
            store.update_license_number(9, "ZZZ99999").await,
            Err(TaxiError::DoesNotExist(_))
        ));
    }

    #[tokio::test]
    async fn test_car_foreign_keys() {
        let store = MemoryStore::new();
        let lincoln = store
            .create_manufacturer(Manufacturer::new("Lincoln", "USA"))
            .await
            .unwrap();
        let ann = store.create_driver(Driver::new("ann", "ABC12345")).await.unwrap();
        let pk = lincoln.id.unwrap();

        let car = store
            .create_car(Car::new("Continental", pk).with_drivers(vec![ann.id().unwrap()]))
            .await
            .unwrap();
        assert_eq!(store.get_car(car.id.unwrap()).await.unwrap().drivers, vec![1]);

        assert!(store.create_car(Car::new("Ghost", 42)).await.is_err());
        assert!(store
            .create_car(Car::new("Navigator", pk).with_drivers(vec![5]))
            .await
            .is_err());
        assert_eq!(store.list_cars().await.unwrap().len(), 1);
    }
}
