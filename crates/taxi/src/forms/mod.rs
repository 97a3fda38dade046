//! Fleet forms.
//!
//! - [`DriverCreationForm`] - account creation plus license number and name
//! - [`DriverLicenseUpdateForm`] - changes one driver's license number
//! - [`CarCreationForm`] - a car with its manufacturer and optional drivers
//!
//! Each implements [`Form`] for validation and
//! [`ModelForm`](taxi_forms::ModelForm) for saving.

mod car_creation;
mod driver_creation;
mod driver_license_update;

pub use car_creation::CarCreationForm;
pub use driver_creation::DriverCreationForm;
pub use driver_license_update::DriverLicenseUpdateForm;

use taxi_core::{TaxiError, ValidationError};
use taxi_forms::form::Form;

/// Records a save-time conflict as a field error and returns the failure.
///
/// Used when the store rejects a value that passed validation because a
/// concurrent submission claimed it first.
fn reject_on_save(form: &mut dyn Form, field: &str, message: &str) -> TaxiError {
    tracing::warn!(field, message, "unique constraint raced validation");
    form.add_error(field, message.to_string());
    TaxiError::ValidationError(ValidationError::from_form_errors(form.errors()))
}
