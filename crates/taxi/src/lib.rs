//! # taxi
//!
//! The taxi fleet application: drivers, manufacturers, and cars, with the
//! forms that create and update them.
//!
//! ## Modules
//!
//! - [`models`] - [`Driver`], [`Manufacturer`], and [`Car`]
//! - [`repository`] - Store traits the forms read from and save to
//! - [`store`] - In-memory and SQL-backed stores
//! - [`schema`] - Table creation from model metadata
//! - [`license`] - License number rules and the cleaner that applies them
//! - [`forms`] - Driver creation, driver license update, and car creation forms
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use taxi::forms::DriverLicenseUpdateForm;
//! use taxi::store::MemoryStore;
//! use taxi::{Driver, DriverRepository};
//! use taxi_forms::{Form, QueryDict};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let store = Arc::new(MemoryStore::new());
//! let driver = store.create_driver(Driver::new("jdoe", "ABC12345")).await.unwrap();
//!
//! let mut form = DriverLicenseUpdateForm::new(store, driver);
//! form.bind(&QueryDict::parse("license_number=abc12345"));
//! assert!(!form.is_valid().await);
//! assert_eq!(
//!     form.errors()["license_number"],
//!     vec!["The first 3 characters must be uppercase letters.".to_string()]
//! );
//! # });
//! ```

// - result_large_err: TaxiError is the crate-wide error type
#![allow(clippy::result_large_err)]

pub mod forms;
pub mod license;
pub mod models;
pub mod repository;
pub mod schema;
pub mod store;

pub use license::{clean_license_number, LicenseNumberCleaner};
pub use models::{Car, Driver, Manufacturer};
pub use repository::{
    CarRepository, DriverRepository, ManufacturerRepository, TaxiStore, UserRepository,
};
pub use store::{MemoryStore, SqlStore};
