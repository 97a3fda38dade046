//! The form trait and `BaseForm`.
//!
//! [`Form`] is the lifecycle every form type implements: bind raw data,
//! validate asynchronously, then read errors or cleaned data. Validation is
//! async because field cleaners may consult the store (uniqueness checks).
//!
//! [`BaseForm`] is the general-purpose implementation. Richer forms wrap a
//! `BaseForm` and register [`FieldCleaner`]s and [`FormCleaner`]s on it
//! instead of overriding hooks.

use std::collections::HashMap;

use async_trait::async_trait;
use taxi_core::{TaxiResult, ValidationError};
use taxi_db::value::Value;

use crate::fields::FormFieldDef;
use crate::querydict::QueryDict;
use crate::validation;

/// The error key for errors that belong to the form rather than one field.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// The core form trait.
#[async_trait]
pub trait Form: Send + Sync {
    /// Returns the form's field definitions.
    fn fields(&self) -> &[FormFieldDef];

    /// Returns the initial (default) values for fields.
    fn initial(&self) -> &HashMap<String, Value>;

    /// Binds raw submitted data to this form, discarding earlier results.
    fn bind(&mut self, data: &QueryDict);

    /// Returns `true` if this form has been bound to data.
    fn is_bound(&self) -> bool;

    /// Returns `true` once the current data has been through validation.
    fn is_validated(&self) -> bool;

    /// Validates the form. Returns `true` if valid.
    ///
    /// Afterwards `errors()` and `cleaned_data()` are populated. An unbound
    /// form is never valid.
    async fn is_valid(&mut self) -> bool;

    /// Returns per-field error messages, keyed by field name.
    fn errors(&self) -> &HashMap<String, Vec<String>>;

    /// Returns the cleaned (validated and coerced) data.
    fn cleaned_data(&self) -> &HashMap<String, Value>;

    /// Attaches an error to a field (or [`NON_FIELD_ERRORS`]) after validation.
    ///
    /// The field is removed from the cleaned data.
    fn add_error(&mut self, field: &str, message: String);
}

/// A validation step for one field, run after type-level cleaning.
///
/// Cleaners run in registration order and only for fields that cleaned
/// without errors. The returned value replaces the field's cleaned value.
/// Returning [`TaxiError::ValidationError`](taxi_core::TaxiError) attaches
/// the messages to the field; any other error is a storage or system
/// failure and is reported as a non-field error.
#[async_trait]
pub trait FieldCleaner: Send + Sync {
    /// The name of the field this cleaner applies to.
    fn field_name(&self) -> &str;

    /// Cleans the value. `cleaned_data` holds the fields cleaned so far.
    async fn clean(&self, value: Value, cleaned_data: &HashMap<String, Value>)
        -> TaxiResult<Value>;
}

/// A cross-field validation step, run after all field cleaners.
///
/// A compound [`ValidationError`] (with field errors) attaches each message
/// to its field; a simple one becomes a non-field error.
#[async_trait]
pub trait FormCleaner: Send + Sync {
    /// Validates the cleaned data as a whole.
    async fn clean(&self, cleaned_data: &HashMap<String, Value>) -> Result<(), ValidationError>;
}

/// A general-purpose form built from a list of field definitions.
pub struct BaseForm {
    field_defs: Vec<FormFieldDef>,
    initial_data: HashMap<String, Value>,
    prefix: Option<String>,
    bound: bool,
    validated: bool,
    raw_data: HashMap<String, Vec<String>>,
    errors: HashMap<String, Vec<String>>,
    cleaned_data: HashMap<String, Value>,
    field_cleaners: Vec<Box<dyn FieldCleaner>>,
    form_cleaners: Vec<Box<dyn FormCleaner>>,
}

impl std::fmt::Debug for BaseForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseForm")
            .field("fields", &self.field_defs.iter().map(|f| &f.name).collect::<Vec<_>>())
            .field("bound", &self.bound)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl BaseForm {
    /// Creates a new `BaseForm` with the given field definitions.
    pub fn new(fields: Vec<FormFieldDef>) -> Self {
        Self {
            field_defs: fields,
            initial_data: HashMap::new(),
            prefix: None,
            bound: false,
            validated: false,
            raw_data: HashMap::new(),
            errors: HashMap::new(),
            cleaned_data: HashMap::new(),
            field_cleaners: Vec::new(),
            form_cleaners: Vec::new(),
        }
    }

    /// Sets initial (default) values for fields.
    #[must_use]
    pub fn with_initial(mut self, initial: HashMap<String, Value>) -> Self {
        self.initial_data = initial;
        self
    }

    /// Sets the form prefix (submitted keys become `prefix-field`).
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Registers a field cleaner.
    #[must_use]
    pub fn with_field_cleaner(mut self, cleaner: impl FieldCleaner + 'static) -> Self {
        self.add_field_cleaner(Box::new(cleaner));
        self
    }

    /// Registers a form cleaner.
    #[must_use]
    pub fn with_form_cleaner(mut self, cleaner: impl FormCleaner + 'static) -> Self {
        self.add_form_cleaner(Box::new(cleaner));
        self
    }

    /// Registers a field cleaner after construction.
    pub fn add_field_cleaner(&mut self, cleaner: Box<dyn FieldCleaner>) {
        self.field_cleaners.push(cleaner);
    }

    /// Registers a form cleaner after construction.
    pub fn add_form_cleaner(&mut self, cleaner: Box<dyn FormCleaner>) {
        self.form_cleaners.push(cleaner);
    }

    /// Appends a field definition.
    pub fn add_field(&mut self, field: FormFieldDef) {
        self.field_defs.push(field);
    }

    /// Replaces the definition of an existing field, or appends it.
    pub fn set_field(&mut self, field: FormFieldDef) {
        match self.field_defs.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.field_defs.push(field),
        }
    }

    /// Returns the field definition with the given name.
    pub fn field(&self, name: &str) -> Option<&FormFieldDef> {
        self.field_defs.iter().find(|f| f.name == name)
    }

    /// Returns the form prefix.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the raw submitted values for a field.
    pub fn raw_value(&self, name: &str) -> &[String] {
        self.raw_data.get(name).map_or(&[], Vec::as_slice)
    }

    /// Returns the non-field (form-level) errors.
    pub fn non_field_errors(&self) -> &[String] {
        self.errors.get(NON_FIELD_ERRORS).map_or(&[], Vec::as_slice)
    }
}

#[async_trait]
impl Form for BaseForm {
    fn fields(&self) -> &[FormFieldDef] {
        &self.field_defs
    }

    fn initial(&self) -> &HashMap<String, Value> {
        &self.initial_data
    }

    fn bind(&mut self, data: &QueryDict) {
        self.bound = true;
        self.validated = false;
        self.raw_data.clear();
        self.errors.clear();
        self.cleaned_data.clear();

        for field in &self.field_defs {
            let key = match &self.prefix {
                Some(p) => format!("{p}-{}", field.name),
                None => field.name.clone(),
            };
            let values = data.get_list(&key).cloned().unwrap_or_default();
            self.raw_data.insert(field.name.clone(), values);
        }
    }

    fn is_bound(&self) -> bool {
        self.bound
    }

    fn is_validated(&self) -> bool {
        self.validated
    }

    async fn is_valid(&mut self) -> bool {
        if !self.bound {
            return false;
        }

        self.errors.clear();
        self.cleaned_data.clear();

        validation::clean_fields(
            &self.field_defs,
            &self.initial_data,
            &self.raw_data,
            &mut self.cleaned_data,
            &mut self.errors,
        );

        validation::run_field_cleaners(
            &self.field_cleaners,
            &mut self.cleaned_data,
            &mut self.errors,
        )
        .await;

        validation::run_form_cleaners(
            &self.form_cleaners,
            &mut self.cleaned_data,
            &mut self.errors,
        )
        .await;

        self.validated = true;
        tracing::debug!(
            valid = self.errors.is_empty(),
            error_fields = self.errors.len(),
            "form validated"
        );
        self.errors.is_empty()
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        &self.errors
    }

    fn cleaned_data(&self) -> &HashMap<String, Value> {
        &self.cleaned_data
    }

    fn add_error(&mut self, field: &str, message: String) {
        self.cleaned_data.remove(field);
        self.errors.entry(field.to_string()).or_default().push(message);
    }
}
