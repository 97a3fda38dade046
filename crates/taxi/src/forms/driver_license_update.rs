use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use taxi_core::logging::form_span;
use taxi_core::{TaxiError, TaxiResult};
use taxi_db::model::Model;
use taxi_db::value::Value;
use taxi_forms::fields::FormFieldDef;
use taxi_forms::form::{BaseForm, Form};
use taxi_forms::model_form::{
    generate_form_fields, model_to_initial, ModelForm, ModelFormConfig, ModelFormFields,
};
use taxi_forms::querydict::QueryDict;
use taxi_forms::validation::require_valid;
use tracing::Instrument;

use super::reject_on_save;
use crate::license::{is_license_conflict, LicenseNumberCleaner, LicenseRule, LICENSE_FIELD};
use crate::models::Driver;
use crate::repository::{DriverRepository, TaxiStore};

/// Changes the license number of one existing driver.
///
/// The driver's current number is the initial value and does not count as
/// taken by someone else.
pub struct DriverLicenseUpdateForm {
    inner: BaseForm,
    store: Arc<dyn TaxiStore>,
    instance: Driver,
}

impl DriverLicenseUpdateForm {
    /// Creates the form for a saved driver.
    pub fn new(store: Arc<dyn TaxiStore>, instance: Driver) -> Self {
        let config = ModelFormConfig::new(Driver::meta())
            .with_fields(ModelFormFields::Include(vec![LICENSE_FIELD.to_string()]));
        let fields = generate_form_fields(&config);
        let initial = model_to_initial(&instance, &fields);

        let inner = BaseForm::new(fields)
            .with_initial(initial)
            .with_field_cleaner(LicenseNumberCleaner::for_instance(
                Arc::clone(&store).into_drivers(),
                instance.id(),
            ));
        Self {
            inner,
            store,
            instance,
        }
    }

    /// Loads the driver with primary key `pk` and creates the form for it.
    pub async fn load(store: Arc<dyn TaxiStore>, pk: i64) -> TaxiResult<Self> {
        let instance = store.get_driver(pk).await?;
        Ok(Self::new(store, instance))
    }
}

#[async_trait]
impl Form for DriverLicenseUpdateForm {
    fn fields(&self) -> &[FormFieldDef] {
        self.inner.fields()
    }

    fn initial(&self) -> &HashMap<String, Value> {
        self.inner.initial()
    }

    fn bind(&mut self, data: &QueryDict) {
        self.inner.bind(data);
    }

    fn is_bound(&self) -> bool {
        self.inner.is_bound()
    }

    fn is_validated(&self) -> bool {
        self.inner.is_validated()
    }

    async fn is_valid(&mut self) -> bool {
        self.inner
            .is_valid()
            .instrument(form_span("driver_license_update"))
            .await
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        self.inner.errors()
    }

    fn cleaned_data(&self) -> &HashMap<String, Value> {
        self.inner.cleaned_data()
    }

    fn add_error(&mut self, field: &str, message: String) {
        self.inner.add_error(field, message);
    }
}

#[async_trait]
impl ModelForm for DriverLicenseUpdateForm {
    type Model = Driver;

    fn instance(&self) -> Option<&Driver> {
        Some(&self.instance)
    }

    /// Writes the new license number and returns the updated driver.
    async fn save(&mut self) -> TaxiResult<Driver> {
        async move {
            require_valid(self).await?;
            let pk = self.instance.id().ok_or_else(|| {
                TaxiError::DatabaseError("Cannot update a driver that was never saved".to_string())
            })?;
            let license_number = self
                .inner
                .cleaned_data()
                .get(LICENSE_FIELD)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            let updated = self.store.update_license_number(pk, &license_number).await;
            match updated {
                Ok(()) => {
                    tracing::info!(pk, license_number = %license_number, "license number updated");
                    self.instance.license_number = license_number;
                    Ok(self.instance.clone())
                }
                Err(e) if is_license_conflict(&e) => {
                    Err(reject_on_save(self, LICENSE_FIELD, LicenseRule::Unique.message()))
                }
                Err(e) => Err(e),
            }
        }
        .instrument(form_span("driver_license_update"))
        .await
    }
}
