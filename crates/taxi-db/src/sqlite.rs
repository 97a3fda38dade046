//! SQLite database backend using `rusqlite`.
//!
//! [`SqliteBackend`] implements [`DatabaseBackend`] by running every
//! statement on a blocking thread against one shared connection.
//!
//! - WAL mode for file databases, foreign keys always on
//! - In-memory databases via the `:memory:` path
//! - Constraint failures surface as [`TaxiError::IntegrityError`]
//! - [`SqliteTransaction`] keeps the connection locked from `BEGIN` to the end

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::types::ValueRef;
use taxi_core::{TaxiError, TaxiResult};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::backend::{DatabaseBackend, Transaction};
use crate::row::Row;
use crate::value::Value;

/// A SQLite database backend.
pub struct SqliteBackend {
    /// The path to the database file (or ":memory:").
    path: PathBuf,
    /// The connection, guarded by an async mutex.
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Opens a SQLite database at the given path.
    ///
    /// If the path is `:memory:`, an in-memory database is created.
    ///
    /// # Errors
    ///
    /// Returns [`TaxiError::OperationalError`] if the database cannot be
    /// opened or the pragmas fail.
    pub fn open(path: impl Into<PathBuf>) -> TaxiResult<Self> {
        let path = path.into();
        let in_memory = path.to_str() == Some(":memory:");
        let conn = if in_memory {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| TaxiError::OperationalError(format!("SQLite open failed: {e}")))?;

        let pragmas = if in_memory {
            "PRAGMA foreign_keys=ON;"
        } else {
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;"
        };
        conn.execute_batch(pragmas)
            .map_err(|e| TaxiError::OperationalError(format!("Failed to set pragmas: {e}")))?;

        tracing::debug!(path = %path.display(), "opened sqlite database");
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn memory() -> TaxiResult<Self> {
        Self::open(":memory:")
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Binds `Value`s to a `rusqlite` statement.
    fn bind_params(stmt: &mut rusqlite::Statement<'_>, params: &[Value]) -> TaxiResult<()> {
        for (i, param) in params.iter().enumerate() {
            let idx = i + 1;
            match param {
                Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
                Value::Bool(b) => stmt.raw_bind_parameter(idx, b),
                Value::Int(v) => stmt.raw_bind_parameter(idx, v),
                Value::Float(v) => stmt.raw_bind_parameter(idx, v),
                Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
                Value::DateTime(dt) => stmt.raw_bind_parameter(idx, dt.to_rfc3339()),
                Value::List(vals) => {
                    let items: Vec<String> = vals.iter().map(ToString::to_string).collect();
                    let json = serde_json::to_string(&items)
                        .map_err(|e| TaxiError::SerializationError(e.to_string()))?;
                    stmt.raw_bind_parameter(idx, json)
                }
            }
            .map_err(|e| TaxiError::DatabaseError(format!("Bind error: {e}")))?;
        }
        Ok(())
    }

    /// Converts a `rusqlite::Row` to our generic `Row`.
    fn convert_row(sqlite_row: &rusqlite::Row<'_>, column_names: &[String]) -> Row {
        let values = (0..column_names.len())
            .map(|i| match sqlite_row.get_ref(i).unwrap_or(ValueRef::Null) {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(v) => Value::Int(v),
                ValueRef::Real(v) => Value::Float(v),
                ValueRef::Text(b) | ValueRef::Blob(b) => {
                    Value::String(String::from_utf8_lossy(b).to_string())
                }
            })
            .collect();
        Row::new(column_names.to_vec(), values)
    }

    /// Runs `f` against the connection on a blocking thread.
    async fn with_conn<T, F>(&self, f: F) -> TaxiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> TaxiResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await
        .map_err(|e| TaxiError::InternalError(format!("Task join error: {e}")))?
    }
}

/// Maps a `rusqlite` error, separating constraint violations from the rest.
fn map_sqlite_error(e: rusqlite::Error) -> TaxiError {
    match &e {
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            TaxiError::IntegrityError(msg.clone().unwrap_or_else(|| e.to_string()))
        }
        _ => TaxiError::DatabaseError(e.to_string()),
    }
}

/// Runs one statement and returns the number of rows it changed.
fn execute_on(conn: &rusqlite::Connection, sql: &str, params: &[Value]) -> TaxiResult<u64> {
    let mut stmt = conn.prepare(sql).map_err(map_sqlite_error)?;
    SqliteBackend::bind_params(&mut stmt, params)?;
    let count = stmt.raw_execute().map_err(map_sqlite_error)?;
    Ok(count as u64)
}

/// Runs an INSERT and returns the new row id.
fn insert_on(conn: &rusqlite::Connection, sql: &str, params: &[Value]) -> TaxiResult<i64> {
    let mut stmt = conn.prepare(sql).map_err(map_sqlite_error)?;
    SqliteBackend::bind_params(&mut stmt, params)?;
    stmt.raw_execute().map_err(map_sqlite_error)?;
    Ok(conn.last_insert_rowid())
}

#[async_trait::async_trait]
impl DatabaseBackend for SqliteBackend {
    fn vendor(&self) -> &str {
        "sqlite"
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> TaxiResult<u64> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(move |conn| execute_on(conn, &sql, &params))
            .await
    }

    async fn execute_batch(&self, sql: &str) -> TaxiResult<()> {
        let sql = sql.to_string();
        self.with_conn(move |conn| conn.execute_batch(&sql).map_err(map_sqlite_error))
            .await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> TaxiResult<Vec<Row>> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(map_sqlite_error)?;
            let column_names: Vec<String> =
                stmt.column_names().into_iter().map(String::from).collect();
            Self::bind_params(&mut stmt, &params)?;

            let mut raw_rows = stmt.raw_query();
            let mut rows = Vec::new();
            while let Some(row) = raw_rows.next().map_err(map_sqlite_error)? {
                rows.push(Self::convert_row(row, &column_names));
            }
            Ok(rows)
        })
        .await
    }

    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> TaxiResult<i64> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(move |conn| insert_on(conn, &sql, &params))
            .await
    }

    async fn begin_transaction(&self) -> TaxiResult<Box<dyn Transaction>> {
        let conn = Arc::clone(&self.conn).lock_owned().await;
        let mut txn = SqliteTransaction { conn: Some(conn) };
        if let Err(e) = txn
            .run(|conn| conn.execute_batch("BEGIN").map_err(map_sqlite_error))
            .await
        {
            // nothing to roll back
            txn.conn = None;
            return Err(e);
        }
        tracing::debug!("transaction started");
        Ok(Box::new(txn))
    }
}

/// A SQLite transaction holding the connection lock.
///
/// Rolls back on drop unless committed.
pub struct SqliteTransaction {
    conn: Option<OwnedMutexGuard<rusqlite::Connection>>,
}

impl std::fmt::Debug for SqliteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTransaction")
            .field("open", &self.conn.is_some())
            .finish()
    }
}

impl SqliteTransaction {
    /// Runs `f` on a blocking thread and takes the connection back afterwards.
    async fn run<T, F>(&mut self, f: F) -> TaxiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> TaxiResult<T> + Send + 'static,
    {
        let conn = self.conn.take().ok_or_else(|| {
            TaxiError::DatabaseError("Transaction already finished".to_string())
        })?;
        let (conn, result) = tokio::task::spawn_blocking(move || {
            let result = f(&conn);
            (conn, result)
        })
        .await
        .map_err(|e| TaxiError::InternalError(format!("Task join error: {e}")))?;
        self.conn = Some(conn);
        result
    }

    async fn finish(&mut self, sql: &'static str) -> TaxiResult<()> {
        self.run(move |conn| conn.execute_batch(sql).map_err(map_sqlite_error))
            .await?;
        self.conn = None;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Transaction for SqliteTransaction {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> TaxiResult<u64> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.run(move |conn| execute_on(conn, &sql, &params)).await
    }

    async fn insert_returning_id(&mut self, sql: &str, params: &[Value]) -> TaxiResult<i64> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.run(move |conn| insert_on(conn, &sql, &params)).await
    }

    async fn commit(&mut self) -> TaxiResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(&mut self) -> TaxiResult<()> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %e, "rollback of abandoned transaction failed");
            } else {
                tracing::debug!("abandoned transaction rolled back");
            }
        }
    }
}
