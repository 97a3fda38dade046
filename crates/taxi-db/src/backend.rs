//! The database backend trait.
//!
//! All methods are async. Backends built on synchronous drivers (like
//! `rusqlite`) run their work in `spawn_blocking` to keep this interface.
//! Multi-statement writes go through a [`Transaction`].

use taxi_core::{TaxiError, TaxiResult};

use crate::row::Row;
use crate::value::Value;

/// The core trait for database backends.
#[async_trait::async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Returns the vendor name (e.g. "sqlite").
    fn vendor(&self) -> &str;

    /// Executes a SQL statement that does not return rows.
    ///
    /// Returns the number of rows affected.
    async fn execute(&self, sql: &str, params: &[Value]) -> TaxiResult<u64>;

    /// Executes several `;`-separated statements without parameters.
    async fn execute_batch(&self, sql: &str) -> TaxiResult<()>;

    /// Executes a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> TaxiResult<Vec<Row>>;

    /// Executes a SQL query and returns exactly one row.
    ///
    /// Returns [`TaxiError::DoesNotExist`] if no rows are returned, or
    /// [`TaxiError::MultipleObjectsReturned`] if more than one is.
    async fn query_one(&self, sql: &str, params: &[Value]) -> TaxiResult<Row> {
        let mut rows = self.query(sql, params).await?;
        match rows.len() {
            0 => Err(TaxiError::DoesNotExist("No rows returned".to_string())),
            1 => rows
                .pop()
                .ok_or_else(|| TaxiError::InternalError("row vanished".to_string())),
            n => Err(TaxiError::MultipleObjectsReturned(format!(
                "Expected 1 row, got {n}"
            ))),
        }
    }

    /// Executes an INSERT and returns the generated row id.
    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> TaxiResult<i64>;

    /// Starts a transaction that owns the connection until it ends.
    ///
    /// Other statements on this backend wait until the transaction is
    /// committed, rolled back, or dropped.
    async fn begin_transaction(&self) -> TaxiResult<Box<dyn Transaction>>;
}

/// A unit of work on one connection.
///
/// Must be explicitly committed. Dropping it without committing rolls it
/// back. Statements after [`commit`](Self::commit) or
/// [`rollback`](Self::rollback) fail with [`TaxiError::DatabaseError`].
#[async_trait::async_trait]
pub trait Transaction: Send {
    /// Executes a statement inside the transaction.
    async fn execute(&mut self, sql: &str, params: &[Value]) -> TaxiResult<u64>;

    /// Executes an INSERT inside the transaction and returns the new row id.
    async fn insert_returning_id(&mut self, sql: &str, params: &[Value]) -> TaxiResult<i64>;

    /// Commits and releases the connection.
    async fn commit(&mut self) -> TaxiResult<()>;

    /// Rolls back and releases the connection.
    async fn rollback(&mut self) -> TaxiResult<()>;
}
