//! # taxi-db
//!
//! Storage layer for taxi-rs. Models describe themselves through
//! [`ModelMeta`](model::ModelMeta) so forms can be generated from them, and
//! persist through any [`DatabaseBackend`](backend::DatabaseBackend).
//!
//! ## Module Overview
//!
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`row`] - Result rows and typed column access
//! - [`fields`] - Field definitions ([`FieldDef`](fields::FieldDef)) and types
//! - [`model`] - The [`Model`](model::Model) trait, metadata, and insert/update helpers
//! - [`backend`] - The async [`DatabaseBackend`](backend::DatabaseBackend) and
//!   [`Transaction`](backend::Transaction) traits
//! - [`sqlite`] - SQLite backend built on `rusqlite`

// - doc_markdown: SQLite and friends trip the backtick lint
// - result_large_err: TaxiError is the crate-wide error type
#![allow(clippy::doc_markdown)]
#![allow(clippy::result_large_err)]

pub mod backend;
pub mod fields;
pub mod model;
pub mod row;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod value;

pub use backend::{DatabaseBackend, Transaction};
pub use fields::{FieldDef, FieldType};
pub use model::{create_model, create_model_in, update_model_fields, Model, ModelMeta};
pub use row::{FromValue, Row};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
pub use value::Value;
