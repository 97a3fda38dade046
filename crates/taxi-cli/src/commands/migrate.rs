//! The `migrate` management command.

use async_trait::async_trait;
use taxi_core::settings::{ENGINE_MEMORY, ENGINE_SQLITE};
use taxi_core::{Settings, TaxiError, TaxiResult};
use taxi_db::sqlite::SqliteBackend;

use crate::command::ManagementCommand;

/// Creates the fleet tables in the configured database.
///
/// Existing tables are left alone, so running it twice is harmless.
pub struct MigrateCommand;

#[async_trait]
impl ManagementCommand for MigrateCommand {
    fn name(&self) -> &'static str {
        "migrate"
    }

    fn help(&self) -> &'static str {
        "Create the fleet tables"
    }

    async fn handle(&self, _matches: &clap::ArgMatches, settings: &Settings) -> TaxiResult<()> {
        let database = settings.default_database();
        match database.engine.as_str() {
            ENGINE_SQLITE => {
                let backend = SqliteBackend::open(&database.name)?;
                taxi::schema::migrate(&backend).await?;
                tracing::info!(database = %database.name, "migrations applied");
                println!("Tables ready in {}", database.name);
                Ok(())
            }
            ENGINE_MEMORY => {
                println!("The memory engine has no tables to create");
                Ok(())
            }
            other => Err(TaxiError::ImproperlyConfigured(format!(
                "Unknown database engine '{other}'"
            ))),
        }
    }
}
