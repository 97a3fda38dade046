//! Reusable value validators.
//!
//! Validators attach to a [`FormFieldDef`](crate::fields::FormFieldDef) and
//! run after type-level cleaning succeeds. Lengths are counted in characters.

use std::fmt;

use taxi_core::ValidationError;
use taxi_db::value::Value;

/// A synchronous check on one cleaned value.
///
/// # Examples
///
/// ```
/// use taxi_forms::validators::{MaxLengthValidator, Validator};
/// use taxi_db::value::Value;
///
/// let v = MaxLengthValidator::new(5);
/// assert!(v.validate(&Value::from("hi")).is_ok());
/// assert!(v.validate(&Value::from("toolong")).is_err());
/// ```
pub trait Validator: Send + Sync + fmt::Debug {
    /// Validates the given value.
    fn validate(&self, value: &Value) -> Result<(), ValidationError>;

    /// Returns a human-readable name for this validator.
    fn name(&self) -> &str;
}

/// Rejects strings longer than `max_length` characters.
#[derive(Debug, Clone)]
pub struct MaxLengthValidator {
    /// The maximum allowed length.
    pub max_length: usize,
}

impl MaxLengthValidator {
    /// Creates a new `MaxLengthValidator`.
    pub const fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Validator for MaxLengthValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if let Value::String(s) = value {
            let len = s.chars().count();
            if len > self.max_length {
                return Err(ValidationError::new(
                    format!(
                        "Ensure this value has at most {} characters (it has {len}).",
                        self.max_length
                    ),
                    "max_length",
                )
                .with_param("limit_value", self.max_length.to_string()));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "MaxLengthValidator"
    }
}

/// Requires string values to match a regular expression.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    regex: regex::Regex,
    message: String,
    code: String,
}

impl RegexValidator {
    /// Creates a `RegexValidator` with the default message.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error for an invalid pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: regex::Regex::new(pattern)?,
            message: "Enter a valid value.".to_string(),
            code: "invalid".to_string(),
        })
    }

    /// Sets the error message and code.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>, code: impl Into<String>) -> Self {
        self.message = message.into();
        self.code = code.into();
        self
    }
}

impl Validator for RegexValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::String(s) if !self.regex.is_match(s) => {
                Err(ValidationError::new(self.message.clone(), self.code.clone()))
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "RegexValidator"
    }
}
