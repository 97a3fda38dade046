//! The validation pipeline.
//!
//! 1. [`clean_fields`]: type-level cleaning of every field
//! 2. [`run_field_cleaners`]: per-field async cleaners, in registration order
//! 3. [`run_form_cleaners`]: cross-field cleaners
//!
//! Errors accumulate rather than short-circuiting, so every problem is
//! reported at once.

use std::collections::HashMap;

use taxi_core::{TaxiError, TaxiResult, ValidationError};
use taxi_db::value::Value;

use crate::fields::{clean_field_value, FormFieldDef};
use crate::form::{FieldCleaner, Form, FormCleaner, NON_FIELD_ERRORS};

/// Performs type-level validation for all fields.
///
/// Disabled fields skip validation and take their initial value (the field's
/// own, else the form's).
pub fn clean_fields(
    field_defs: &[FormFieldDef],
    initial: &HashMap<String, Value>,
    raw_data: &HashMap<String, Vec<String>>,
    cleaned_data: &mut HashMap<String, Value>,
    errors: &mut HashMap<String, Vec<String>>,
) {
    for field in field_defs {
        if field.disabled {
            if let Some(value) = field.initial.as_ref().or_else(|| initial.get(&field.name)) {
                cleaned_data.insert(field.name.clone(), value.clone());
            }
            continue;
        }

        let raw = raw_data.get(&field.name).map_or(&[][..], Vec::as_slice);
        match clean_field_value(field, raw) {
            Ok(value) => {
                cleaned_data.insert(field.name.clone(), value);
            }
            Err(field_errors) => {
                errors.insert(field.name.clone(), field_errors);
            }
        }
    }
}

/// Runs field cleaners in order against the type-cleaned data.
///
/// A cleaner is skipped when its field already failed. On success the
/// returned value replaces the cleaned value; on failure the field leaves
/// `cleaned_data`.
pub async fn run_field_cleaners(
    cleaners: &[Box<dyn FieldCleaner>],
    cleaned_data: &mut HashMap<String, Value>,
    errors: &mut HashMap<String, Vec<String>>,
) {
    for cleaner in cleaners {
        let name = cleaner.field_name();
        if errors.contains_key(name) {
            continue;
        }
        let Some(value) = cleaned_data.get(name).cloned() else {
            continue;
        };

        match cleaner.clean(value, cleaned_data).await {
            Ok(cleaned) => {
                cleaned_data.insert(name.to_string(), cleaned);
            }
            Err(TaxiError::ValidationError(e)) => {
                tracing::debug!(field = name, code = %e.code, "field cleaner rejected value");
                cleaned_data.remove(name);
                errors.entry(name.to_string()).or_default().extend(e.messages());
            }
            Err(other) => {
                tracing::error!(field = name, error = %other, "field cleaner failed");
                cleaned_data.remove(name);
                errors
                    .entry(NON_FIELD_ERRORS.to_string())
                    .or_default()
                    .push(other.to_string());
            }
        }
    }
}

/// Runs the cross-field cleaners against the cleaned data.
pub async fn run_form_cleaners(
    cleaners: &[Box<dyn FormCleaner>],
    cleaned_data: &mut HashMap<String, Value>,
    errors: &mut HashMap<String, Vec<String>>,
) {
    for cleaner in cleaners {
        if let Err(e) = cleaner.clean(cleaned_data).await {
            attach_error(e, cleaned_data, errors);
        }
    }
}

/// Attaches a (possibly compound) validation error to the error map.
pub fn attach_error(
    error: ValidationError,
    cleaned_data: &mut HashMap<String, Value>,
    errors: &mut HashMap<String, Vec<String>>,
) {
    if !error.message.is_empty() {
        errors
            .entry(NON_FIELD_ERRORS.to_string())
            .or_default()
            .push(error.message.clone());
    }
    for (field, field_errors) in error.field_errors {
        cleaned_data.remove(&field);
        let messages = errors.entry(field).or_default();
        for e in field_errors {
            messages.extend(e.messages());
        }
    }
}

/// Builds a compound error carrying one message for one field.
pub fn field_error(field: &str, error: ValidationError) -> ValidationError {
    ValidationError::with_field_errors(HashMap::from([(field.to_string(), vec![error])]))
}

/// Validates a form and returns its errors as sorted `(field, messages)` pairs.
pub async fn full_clean(form: &mut dyn Form) -> Result<(), Vec<(String, Vec<String>)>> {
    if form.is_valid().await {
        Ok(())
    } else {
        let mut errors: Vec<(String, Vec<String>)> = form
            .errors()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        errors.sort_by(|a, b| a.0.cmp(&b.0));
        Err(errors)
    }
}

/// Ensures a form is bound and valid before it is saved.
///
/// A bound form that has not been validated yet is validated here.
///
/// # Errors
///
/// Returns [`TaxiError::ValidationError`] for an unbound or invalid form,
/// carrying the form's field errors.
pub async fn require_valid(form: &mut dyn Form) -> TaxiResult<()> {
    if !form.is_bound() {
        return Err(TaxiError::ValidationError(ValidationError::new(
            "The form is not bound to any data.",
            "unbound",
        )));
    }
    if !form.is_validated() {
        form.is_valid().await;
    }
    if form.errors().is_empty() {
        Ok(())
    } else {
        Err(TaxiError::ValidationError(ValidationError::from_form_errors(
            form.errors(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FormFieldType;
    use crate::form::BaseForm;
    use crate::querydict::QueryDict;

    fn char_field(name: &str) -> FormFieldDef {
        FormFieldDef::new(name, FormFieldType::char(None))
    }

    #[test]
    fn test_clean_fields_errors_accumulate() {
        let fields = vec![char_field("name"), FormFieldDef::new("email", FormFieldType::Email)];
        let mut cleaned = HashMap::new();
        let mut errors = HashMap::new();
        clean_fields(&fields, &HashMap::new(), &HashMap::new(), &mut cleaned, &mut errors);

        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("email"));
        assert!(cleaned.is_empty());
    }

    #[test]
    fn test_clean_fields_disabled_uses_initial() {
        let fields = vec![char_field("license_number").disabled(true)];
        let initial = HashMap::from([("license_number".to_string(), Value::from("ABC12345"))]);
        let raw = HashMap::from([("license_number".to_string(), vec!["hacked".to_string()])]);
        let mut cleaned = HashMap::new();
        let mut errors = HashMap::new();
        clean_fields(&fields, &initial, &raw, &mut cleaned, &mut errors);

        assert!(errors.is_empty());
        assert_eq!(cleaned["license_number"], Value::from("ABC12345"));
    }

    #[test]
    fn test_attach_compound_error() {
        let mut cleaned = HashMap::from([("password2".to_string(), Value::from("x"))]);
        let mut errors = HashMap::new();
        let err = field_error(
            "password2",
            ValidationError::new("The two password fields didn't match.", "password_mismatch"),
        );
        attach_error(err, &mut cleaned, &mut errors);

        assert!(cleaned.is_empty());
        assert_eq!(
            errors["password2"],
            vec!["The two password fields didn't match.".to_string()]
        );
        assert!(!errors.contains_key(NON_FIELD_ERRORS));
    }

    #[test]
    fn test_attach_simple_error() {
        let mut cleaned = HashMap::new();
        let mut errors = HashMap::new();
        attach_error(ValidationError::new("Nope.", "invalid"), &mut cleaned, &mut errors);
        assert_eq!(errors[NON_FIELD_ERRORS], vec!["Nope.".to_string()]);
    }

    #[tokio::test]
    async fn test_full_clean_sorted_errors() {
        let mut form = BaseForm::new(vec![char_field("b"), char_field("a")]);
        form.bind(&QueryDict::new());
        let errors = full_clean(&mut form).await.unwrap_err();
        let names: Vec<&str> = errors.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_require_valid() {
        let mut form = BaseForm::new(vec![char_field("model")]);
        assert!(matches!(
            require_valid(&mut form).await,
            Err(TaxiError::ValidationError(e)) if e.code == "unbound"
        ));

        form.bind(&QueryDict::new());
        let err = require_valid(&mut form).await.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: model: This field is required.");

        form.bind(&QueryDict::parse("model=Model+S"));
        assert!(require_valid(&mut form).await.is_ok());
        assert!(form.is_validated());
    }
}
