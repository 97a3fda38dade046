//! Form field definitions and type-level cleaning.
//!
//! Each [`FormFieldDef`] describes one form field: its type, widget,
//! validators, and messages. [`clean_field_value`] turns the raw submitted
//! strings for a field into a typed [`Value`] or a list of error messages.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use taxi_db::value::Value;

use crate::validators::Validator;
use crate::widgets::WidgetType;

/// The type of a form field, with its type-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormFieldType {
    /// A character (string) field.
    Char {
        /// Minimum length (characters).
        min_length: Option<usize>,
        /// Maximum length (characters).
        max_length: Option<usize>,
        /// Whether to strip leading/trailing whitespace.
        strip: bool,
    },
    /// An integer field.
    Integer {
        /// Minimum allowed value.
        min_value: Option<i64>,
        /// Maximum allowed value.
        max_value: Option<i64>,
    },
    /// A boolean (checkbox) field.
    Boolean,
    /// An email address field.
    Email,
    /// A date-time field (RFC 3339 or `YYYY-MM-DD HH:MM[:SS]`).
    DateTime,
    /// A single related object, chosen by primary key.
    ModelChoice {
        /// Available choices as `(pk, label)` pairs.
        choices: Vec<(i64, String)>,
    },
    /// Any number of related objects, chosen by primary key.
    ModelMultipleChoice {
        /// Available choices as `(pk, label)` pairs.
        choices: Vec<(i64, String)>,
    },
}

impl FormFieldType {
    /// A plain stripped char field with an optional maximum length.
    pub const fn char(max_length: Option<usize>) -> Self {
        Self::Char {
            min_length: None,
            max_length,
            strip: true,
        }
    }

    /// Returns the choices of a model choice field.
    pub fn choices(&self) -> Option<&[(i64, String)]> {
        match self {
            Self::ModelChoice { choices } | Self::ModelMultipleChoice { choices } => {
                Some(choices)
            }
            _ => None,
        }
    }
}

/// Complete definition of a form field.
#[derive(Debug)]
pub struct FormFieldDef {
    /// The field name (submitted data key).
    pub name: String,
    /// The field type, controlling parsing and coercion.
    pub field_type: FormFieldType,
    /// Whether this field is required.
    pub required: bool,
    /// Default/initial value.
    pub initial: Option<Value>,
    /// Help text displayed alongside the field.
    pub help_text: String,
    /// Human-readable label.
    pub label: String,
    /// The widget type used for presentation.
    pub widget: WidgetType,
    /// Additional validators applied after type coercion.
    pub validators: Vec<Box<dyn Validator>>,
    /// Custom error messages keyed by error code.
    pub error_messages: HashMap<String, String>,
    /// Whether the field is disabled (keeps its initial value).
    pub disabled: bool,
}

impl FormFieldDef {
    /// Creates a required field with the default widget for its type.
    pub fn new(name: impl Into<String>, field_type: FormFieldType) -> Self {
        let name = name.into();
        let widget = default_widget_for_field_type(&field_type);
        let label = name.replace('_', " ");
        Self {
            name,
            field_type,
            required: true,
            initial: None,
            help_text: String::new(),
            label,
            widget,
            validators: Vec::new(),
            error_messages: HashMap::new(),
            disabled: false,
        }
    }

    /// Sets whether this field is required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the initial value.
    #[must_use]
    pub fn initial(mut self, value: Value) -> Self {
        self.initial = Some(value);
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the widget type.
    #[must_use]
    pub const fn widget(mut self, widget: WidgetType) -> Self {
        self.widget = widget;
        self
    }

    /// Adds a validator.
    #[must_use]
    pub fn validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Sets a custom error message for a given code.
    #[must_use]
    pub fn error_message(mut self, code: impl Into<String>, msg: impl Into<String>) -> Self {
        self.error_messages.insert(code.into(), msg.into());
        self
    }

    /// Sets whether this field is disabled.
    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    fn message(&self, code: &str, default: impl FnOnce() -> String) -> String {
        self.error_messages.get(code).cloned().unwrap_or_else(default)
    }
}

/// Returns the default widget type for a given form field type.
pub const fn default_widget_for_field_type(field_type: &FormFieldType) -> WidgetType {
    match field_type {
        FormFieldType::Char { .. } => WidgetType::TextInput,
        FormFieldType::Integer { .. } => WidgetType::NumberInput,
        FormFieldType::Boolean => WidgetType::CheckboxInput,
        FormFieldType::Email => WidgetType::EmailInput,
        FormFieldType::DateTime => WidgetType::DateTimeInput,
        FormFieldType::ModelChoice { .. } => WidgetType::Select,
        FormFieldType::ModelMultipleChoice { .. } => WidgetType::SelectMultiple,
    }
}

/// Cleans the raw submitted values of one field into a typed `Value`.
///
/// Single-valued types read the last submitted value; model multiple choice
/// reads them all. Steps:
/// 1. Whitespace stripping (char fields with `strip`)
/// 2. Required check
/// 3. Type coercion and type-specific constraints
/// 4. Custom validators, only when the earlier steps produced no errors
pub fn clean_field_value(field: &FormFieldDef, raw: &[String]) -> Result<Value, Vec<String>> {
    let required_msg = || field.message("required", || "This field is required.".to_string());

    if let FormFieldType::ModelMultipleChoice { choices } = &field.field_type {
        let selected: Vec<&str> = raw.iter().map(String::as_str).filter(|s| !s.is_empty()).collect();
        if selected.is_empty() {
            return if field.required {
                Err(vec![required_msg()])
            } else {
                Ok(Value::List(Vec::new()))
            };
        }
        let value = clean_multiple_choice(field, choices, &selected)?;
        return run_validators(field, value);
    }

    let last = raw.last().map_or("", String::as_str);
    let raw_str = match field.field_type {
        FormFieldType::Char { strip: true, .. } | FormFieldType::Email => last.trim(),
        _ => last,
    };

    if let FormFieldType::Boolean = field.field_type {
        let checked = !matches!(raw_str.to_lowercase().as_str(), "" | "false" | "0" | "off");
        if field.required && !checked {
            return Err(vec![required_msg()]);
        }
        return Ok(Value::Bool(checked));
    }

    if raw_str.is_empty() {
        return if field.required {
            Err(vec![required_msg()])
        } else {
            Ok(field.initial.clone().unwrap_or(Value::Null))
        };
    }

    let mut errors = Vec::new();

    let value = match &field.field_type {
        FormFieldType::Char {
            min_length,
            max_length,
            ..
        } => {
            let len = raw_str.chars().count();
            if let Some(min) = min_length {
                if len < *min {
                    errors.push(format!(
                        "Ensure this value has at least {min} characters (it has {len})."
                    ));
                }
            }
            if let Some(max) = max_length {
                if len > *max {
                    errors.push(format!(
                        "Ensure this value has at most {max} characters (it has {len})."
                    ));
                }
            }
            Value::String(raw_str.to_string())
        }

        FormFieldType::Integer {
            min_value,
            max_value,
        } => match raw_str.trim().parse::<i64>() {
            Ok(n) => {
                if let Some(min) = min_value {
                    if n < *min {
                        errors.push(format!(
                            "Ensure this value is greater than or equal to {min}."
                        ));
                    }
                }
                if let Some(max) = max_value {
                    if n > *max {
                        errors.push(format!("Ensure this value is less than or equal to {max}."));
                    }
                }
                Value::Int(n)
            }
            Err(_) => {
                errors.push(field.message("invalid", || "Enter a whole number.".to_string()));
                Value::Null
            }
        },

        FormFieldType::Email => {
            if !is_valid_email(raw_str) {
                errors.push(field.message("invalid", || {
                    "Enter a valid email address.".to_string()
                }));
            }
            Value::String(raw_str.to_string())
        }

        FormFieldType::DateTime => parse_datetime(raw_str.trim()).map_or_else(
            || {
                errors.push(field.message("invalid", || "Enter a valid date/time.".to_string()));
                Value::Null
            },
            Value::DateTime,
        ),

        FormFieldType::ModelChoice { choices } => {
            let pk = raw_str.trim().parse::<i64>().ok();
            match pk.filter(|pk| choices.iter().any(|(c, _)| c == pk)) {
                Some(pk) => Value::Int(pk),
                None => {
                    errors.push(field.message("invalid_choice", || {
                        "Select a valid choice. That choice is not one of the available choices."
                            .to_string()
                    }));
                    Value::Null
                }
            }
        }

        FormFieldType::Boolean | FormFieldType::ModelMultipleChoice { .. } => Value::Null,
    };

    if errors.is_empty() {
        run_validators(field, value)
    } else {
        Err(errors)
    }
}

fn clean_multiple_choice(
    field: &FormFieldDef,
    choices: &[(i64, String)],
    selected: &[&str],
) -> Result<Value, Vec<String>> {
    let mut pks: Vec<i64> = Vec::with_capacity(selected.len());
    for raw in selected {
        let Ok(pk) = raw.trim().parse::<i64>() else {
            return Err(vec![field.message("invalid_pk_value", || {
                format!("\u{201c}{raw}\u{201d} is not a valid value.")
            })]);
        };
        if !choices.iter().any(|(c, _)| *c == pk) {
            return Err(vec![field.message("invalid_choice", || {
                format!("Select a valid choice. {pk} is not one of the available choices.")
            })]);
        }
        if !pks.contains(&pk) {
            pks.push(pk);
        }
    }
    Ok(Value::List(pks.into_iter().map(Value::Int).collect()))
}

fn run_validators(field: &FormFieldDef, value: Value) -> Result<Value, Vec<String>> {
    let errors: Vec<String> = field
        .validators
        .iter()
        .filter_map(|v| v.validate(&value).err())
        .map(|e| e.to_string())
        .collect();
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

/// A pragmatic email check: one `@`, a non-empty local part, a dotted domain.
fn is_valid_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
