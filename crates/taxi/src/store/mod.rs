//! Store implementations.
//!
//! - [`MemoryStore`] - everything in process memory
//! - [`SqlStore`] - any [`DatabaseBackend`](taxi_db::DatabaseBackend)
//!
//! [`open`] picks one from the settings' default database.

mod memory;
mod sql;

use std::sync::Arc;

use taxi_core::settings::{ENGINE_MEMORY, ENGINE_SQLITE};
use taxi_core::{Settings, TaxiError, TaxiResult};
use taxi_db::sqlite::SqliteBackend;

pub use memory::MemoryStore;
pub use sql::SqlStore;

use crate::repository::TaxiStore;

/// Opens the store configured by `settings.databases["default"]`.
///
/// SQLite stores are migrated before they are returned.
pub async fn open(settings: &Settings) -> TaxiResult<Arc<dyn TaxiStore>> {
    let database = settings.default_database();
    match database.engine.as_str() {
        ENGINE_MEMORY => Ok(Arc::new(MemoryStore::new())),
        ENGINE_SQLITE => {
            let backend = SqliteBackend::open(&database.name)?;
            crate::schema::migrate(&backend).await?;
            Ok(Arc::new(SqlStore::new(Arc::new(backend))))
        }
        other => Err(TaxiError::ImproperlyConfigured(format!(
            "Unknown database engine '{other}'"
        ))),
    }
}
