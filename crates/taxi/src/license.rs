//! License number rules.
//!
//! A license number is three uppercase letters followed by five digits, e.g.
//! `ABC12345`, and no two drivers share one. The rules are checked in a
//! fixed order and the first failure is reported:
//!
//! 1. exactly 8 characters
//! 2. the last 5 are digits (any script)
//! 3. the first 3 are letters, with at least one uppercase and none lowercase
//! 4. no other driver holds it
//!
//! [`LicenseNumberCleaner`] plugs the rules into any form with a
//! `license_number` field.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use taxi_core::{TaxiError, TaxiResult, ValidationError};
use taxi_db::value::Value;
use taxi_forms::form::FieldCleaner;

use crate::repository::DriverRepository;

/// The name of the license number field on every driver form.
pub const LICENSE_FIELD: &str = "license_number";

const LICENSE_LENGTH: usize = 8;
const CODE_LENGTH: usize = 3;

/// One license number rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseRule {
    Length,
    Digits,
    Code,
    Unique,
}

impl LicenseRule {
    /// The message shown to the user when this rule fails.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Length => "License number must be exactly 8 digits long.",
            Self::Digits => "The last 5 characters must be digits",
            Self::Code => "The first 3 characters must be uppercase letters.",
            Self::Unique => "License number already exists.",
        }
    }

    /// The machine-readable error code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Length => "invalid_length",
            Self::Digits => "invalid_digits",
            Self::Code => "invalid_code",
            Self::Unique => "unique",
        }
    }

    /// The validation error for a failure of this rule.
    pub fn error(self) -> ValidationError {
        ValidationError::new(self.message(), self.code())
    }
}

/// Neither upper nor lower case, but cased: `ǅ`, `ǈ`, and friends.
fn is_titlecase(c: char) -> bool {
    !c.is_uppercase()
        && !c.is_lowercase()
        && c.to_uppercase().ne(std::iter::once(c))
        && c.to_lowercase().ne(std::iter::once(c))
}

/// Uncased letters (e.g. `中`) are allowed next to uppercase ones.
fn is_uppercase_code(code: &[char]) -> bool {
    code.iter().all(|c| c.is_alphabetic())
        && !code.iter().any(|&c| c.is_lowercase() || is_titlecase(c))
        && code.iter().any(|c| c.is_uppercase())
}

/// Checks the format rules (length, digits, code) without touching the store.
pub fn check_license_format(value: &str) -> Result<(), LicenseRule> {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() != LICENSE_LENGTH {
        return Err(LicenseRule::Length);
    }
    let (code, number) = chars.split_at(CODE_LENGTH);
    if !number.iter().all(|c| c.is_numeric()) {
        return Err(LicenseRule::Digits);
    }
    if !is_uppercase_code(code) {
        return Err(LicenseRule::Code);
    }
    Ok(())
}

/// Validates a license number and returns it unchanged.
///
/// `exclude_pk` is the driver being edited, whose own number does not count
/// as taken; `None` when creating a driver.
///
/// # Errors
///
/// Returns [`TaxiError::ValidationError`] carrying the first failed rule's
/// message, or the store's error if the uniqueness lookup fails.
pub async fn clean_license_number(
    value: &str,
    exclude_pk: Option<i64>,
    drivers: &dyn DriverRepository,
) -> TaxiResult<String> {
    check_license_format(value).map_err(|rule| TaxiError::ValidationError(rule.error()))?;
    if drivers.exists_with_license_number(value, exclude_pk).await? {
        return Err(TaxiError::ValidationError(LicenseRule::Unique.error()));
    }
    Ok(value.to_string())
}

/// Returns `true` if a store error is a unique violation on the license number.
///
/// Covers the window between validation and save, when another driver takes
/// the number first.
pub fn is_license_conflict(error: &TaxiError) -> bool {
    matches!(error, TaxiError::IntegrityError(message) if message.contains(LICENSE_FIELD))
}

/// Applies the license number rules to the `license_number` field.
pub struct LicenseNumberCleaner {
    drivers: Arc<dyn DriverRepository>,
    instance_pk: Option<i64>,
}

impl LicenseNumberCleaner {
    /// A cleaner for a new driver.
    pub fn new(drivers: Arc<dyn DriverRepository>) -> Self {
        Self {
            drivers,
            instance_pk: None,
        }
    }

    /// A cleaner for an existing driver, whose own number is allowed.
    pub fn for_instance(drivers: Arc<dyn DriverRepository>, pk: Option<i64>) -> Self {
        Self {
            drivers,
            instance_pk: pk,
        }
    }
}

#[async_trait]
impl FieldCleaner for LicenseNumberCleaner {
    fn field_name(&self) -> &str {
        LICENSE_FIELD
    }

    async fn clean(&self, value: Value, _: &HashMap<String, Value>) -> TaxiResult<Value> {
        let raw = value.as_str().unwrap_or_default();
        let cleaned = clean_license_number(raw, self.instance_pk, self.drivers.as_ref()).await?;
        tracing::debug!(license_number = %cleaned, "license number accepted");
        Ok(Value::String(cleaned))
    }
}
