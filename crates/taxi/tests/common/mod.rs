//! Shared fixtures for the fleet integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use taxi::{
    Driver, DriverRepository, Manufacturer, ManufacturerRepository, MemoryStore, SqlStore,
    TaxiStore,
};
use taxi_db::sqlite::SqliteBackend;

pub const PASSWORD: &str = "Cobalt-Fern-71";

/// One store of each kind, both empty and ready.
pub async fn stores() -> Vec<(&'static str, Arc<dyn TaxiStore>)> {
    let backend = SqliteBackend::memory().unwrap();
    taxi::schema::migrate(&backend).await.unwrap();
    vec![
        ("memory", Arc::new(MemoryStore::new())),
        ("sqlite", Arc::new(SqlStore::new(Arc::new(backend)))),
    ]
}

pub async fn add_driver(store: &Arc<dyn TaxiStore>, username: &str, license: &str) -> Driver {
    store
        .create_driver(Driver::new(username, license))
        .await
        .unwrap()
}

pub async fn add_manufacturer(store: &Arc<dyn TaxiStore>, name: &str) -> i64 {
    store
        .create_manufacturer(Manufacturer::new(name, "USA"))
        .await
        .unwrap()
        .id
        .unwrap()
}

/// A complete driver registration body.
pub fn registration(username: &str, license: &str) -> String {
    format!(
        "username={username}&password1={PASSWORD}&password2={PASSWORD}\
         &license_number={license}&first_name=John&last_name=Doe"
    )
}
