//! # taxi-core
//!
//! Core types, settings, and error types shared by every taxi-rs crate.
//! This crate has no internal dependencies.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Application settings with defaults
//! - [`settings_loader`] - Loading settings from TOML/JSON files and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{TaxiError, TaxiResult, ValidationError};
pub use settings::{DatabaseSettings, Settings};
