//! Core error types for taxi-rs.
//!
//! [`TaxiError`] covers storage, validation, configuration, and IO failures.
//! [`ValidationError`] is the payload raised by field and form validators;
//! form pipelines catch it and attach its message to the offending field.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Represents a validation error with optional field-level errors.
///
/// A validation error is either simple (a single message with a code) or
/// compound (a map of per-field error lists).
///
/// # Examples
///
/// ```
/// use taxi_core::error::ValidationError;
///
/// let err = ValidationError::new("License number already exists.", "unique");
/// assert_eq!(err.to_string(), "License number already exists.");
///
/// let mut field_errors = std::collections::HashMap::new();
/// field_errors.insert(
///     "license_number".to_string(),
///     vec![ValidationError::new("License number already exists.", "unique")],
/// );
/// let err = ValidationError::with_field_errors(field_errors);
/// assert!(err.to_string().starts_with("license_number: "));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "unique").
    pub code: String,
    /// Additional parameters providing context for the message.
    pub params: HashMap<String, String>,
    /// Per-field validation errors, keyed by field name.
    pub field_errors: HashMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: HashMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            params: HashMap::new(),
            field_errors,
        }
    }

    /// Builds a compound error from the string error map a form collects.
    pub fn from_form_errors(errors: &HashMap<String, Vec<String>>) -> Self {
        let field_errors = errors
            .iter()
            .map(|(field, messages)| {
                let list = messages
                    .iter()
                    .map(|m| Self::new(m.clone(), "invalid"))
                    .collect();
                (field.clone(), list)
            })
            .collect();
        Self::with_field_errors(field_errors)
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Returns every message carried by this error, field errors included.
    pub fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.message.is_empty() {
            out.push(self.message.clone());
        }
        let mut fields: Vec<&String> = self.field_errors.keys().collect();
        fields.sort();
        for field in fields {
            for error in &self.field_errors[field] {
                out.extend(error.messages());
            }
        }
        out
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else if !self.field_errors.is_empty() {
            let mut fields: Vec<&String> = self.field_errors.keys().collect();
            fields.sort();
            let mut first = true;
            for field in fields {
                for error in &self.field_errors[field] {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for taxi-rs.
#[derive(Error, Debug)]
pub enum TaxiError {
    // ── Storage ──────────────────────────────────────────────────────

    /// A lookup expected exactly one result but found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// A lookup expected exactly one result but found several.
    #[error("Multiple objects returned when one expected: {0}")]
    MultipleObjectsReturned(String),

    /// A generic database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A database integrity constraint was violated.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    /// An operational database error (cannot open, pragma failure, ...).
    #[error("Operational error: {0}")]
    OperationalError(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The application is improperly configured.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // ── Misc ─────────────────────────────────────────────────────────

    /// Data that should never reach this point did (immutable dict mutation, etc.).
    #[error("Suspicious operation: {0}")]
    SuspiciousOperation(String),

    /// An unexpected internal failure (task join, hashing backend, ...).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl TaxiError {
    /// Returns `true` for errors caused by user input rather than the system.
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::DoesNotExist(_) | Self::IntegrityError(_)
        )
    }
}

impl From<ValidationError> for TaxiError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

/// A convenience type alias for `Result<T, TaxiError>`.
pub type TaxiResult<T> = Result<T, TaxiError>;
