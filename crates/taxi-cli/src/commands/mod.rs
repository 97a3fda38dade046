//! Built-in management commands.
//!
//! - `migrate` - create the fleet tables
//! - `createmanufacturer` - add a manufacturer
//! - `createdriver` - register a driver through [`DriverCreationForm`](taxi::forms::DriverCreationForm)
//! - `updatelicense` - change a license number through [`DriverLicenseUpdateForm`](taxi::forms::DriverLicenseUpdateForm)
//! - `createcar` - add a car through [`CarCreationForm`](taxi::forms::CarCreationForm)
//! - `listdrivers`, `listcars` - print the stored records

pub mod createcar;
pub mod createdriver;
pub mod createmanufacturer;
pub mod listcars;
pub mod listdrivers;
pub mod migrate;
pub mod updatelicense;

use std::collections::HashMap;

use taxi_core::{TaxiError, TaxiResult, ValidationError};
use taxi_forms::fields::FormFieldDef;
use taxi_forms::form::Form;
use taxi_forms::model_form::ModelForm;
use taxi_forms::querydict::QueryDict;

use crate::command::CommandRegistry;

/// Registers every built-in command.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(migrate::MigrateCommand));
    registry.register(Box::new(createmanufacturer::CreateManufacturerCommand));
    registry.register(Box::new(createdriver::CreateDriverCommand));
    registry.register(Box::new(updatelicense::UpdateLicenseCommand));
    registry.register(Box::new(createcar::CreateCarCommand));
    registry.register(Box::new(listdrivers::ListDriversCommand));
    registry.register(Box::new(listcars::ListCarsCommand));
}

/// Builds submitted form data from `(field, value)` pairs.
///
/// A field may appear more than once for multi-valued fields.
pub fn form_data<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> TaxiResult<QueryDict> {
    let mut data = QueryDict::new_mutable();
    for (key, value) in pairs {
        data.append(key, value)?;
    }
    Ok(data)
}

/// Formats form errors as `field: message` lines.
///
/// Fields come in form order, then any errors not tied to a declared field.
pub fn error_lines(fields: &[FormFieldDef], errors: &HashMap<String, Vec<String>>) -> Vec<String> {
    let mut names: Vec<&str> = fields
        .iter()
        .map(|f| f.name.as_str())
        .filter(|name| errors.contains_key(*name))
        .collect();
    let mut rest: Vec<&str> = errors
        .keys()
        .map(String::as_str)
        .filter(|key| !fields.iter().any(|f| f.name == *key))
        .collect();
    rest.sort_unstable();
    names.extend(rest);

    names
        .into_iter()
        .flat_map(|name| {
            errors[name]
                .iter()
                .map(move |message| format!("{name}: {message}"))
        })
        .collect()
}

/// Validates a bound form and saves it, printing field errors on failure.
///
/// # Errors
///
/// Returns [`TaxiError::ValidationError`] if the form is invalid or the save
/// is rejected with field errors, or the store's error otherwise.
pub async fn validate_and_save<F: ModelForm>(form: &mut F) -> TaxiResult<F::Model> {
    if !form.is_valid().await {
        return Err(report(&*form));
    }
    match form.save().await {
        Err(TaxiError::ValidationError(_)) => Err(report(&*form)),
        other => other,
    }
}

fn report(form: &dyn Form) -> TaxiError {
    for line in error_lines(form.fields(), form.errors()) {
        eprintln!("{line}");
    }
    TaxiError::ValidationError(ValidationError::from_form_errors(form.errors()))
}

/// Reads a required string argument.
fn required_arg<'a>(matches: &'a clap::ArgMatches, name: &str) -> TaxiResult<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| TaxiError::ConfigurationError(format!("Missing required argument --{name}")))
}

/// Reads a required integer argument.
fn required_pk(matches: &clap::ArgMatches, name: &str) -> TaxiResult<i64> {
    matches
        .get_one::<i64>(name)
        .copied()
        .ok_or_else(|| TaxiError::ConfigurationError(format!("Missing required argument --{name}")))
}

/// Serializes rows as pretty JSON.
fn to_json<T: serde::Serialize>(rows: &T) -> TaxiResult<String> {
    serde_json::to_string_pretty(rows).map_err(|e| TaxiError::SerializationError(e.to_string()))
}
