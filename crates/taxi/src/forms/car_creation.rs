use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use taxi_core::logging::form_span;
use taxi_core::{TaxiError, TaxiResult};
use taxi_db::model::Model;
use taxi_db::value::Value;
use taxi_forms::fields::FormFieldDef;
use taxi_forms::form::{BaseForm, Form};
use taxi_forms::model_form::{generate_form_fields, ModelForm, ModelFormConfig};
use taxi_forms::querydict::QueryDict;
use taxi_forms::validation::require_valid;
use taxi_forms::widgets::WidgetType;
use tracing::Instrument;

use crate::models::Car;
use crate::repository::{CarRepository, ManufacturerRepository, TaxiStore, UserRepository};

const DRIVERS_FIELD: &str = "drivers";

/// Creates a car.
///
/// Fields: `model`, `manufacturer` (one of the stored manufacturers), and
/// `drivers`, an optional checkbox list of every account.
pub struct CarCreationForm {
    inner: BaseForm,
    store: Arc<dyn TaxiStore>,
}

impl CarCreationForm {
    /// Creates the form, loading manufacturer and driver choices from the store.
    pub async fn new(store: Arc<dyn TaxiStore>) -> TaxiResult<Self> {
        let manufacturers: Vec<(i64, String)> = store
            .list_manufacturers()
            .await?
            .into_iter()
            .filter_map(|m| Some((m.id?, format!("{} {}", m.name, m.country))))
            .collect();
        let users: Vec<(i64, String)> = store
            .list_users()
            .await?
            .into_iter()
            .filter_map(|u| Some((u.id?, u.display_name())))
            .collect();

        let config = ModelFormConfig::new(Car::meta())
            .with_choices("manufacturer", manufacturers)
            .with_choices(DRIVERS_FIELD, users)
            .with_widget(DRIVERS_FIELD, WidgetType::CheckboxSelectMultiple);
        let mut fields = generate_form_fields(&config);
        if let Some(drivers) = fields.iter_mut().find(|f| f.name == DRIVERS_FIELD) {
            drivers.required = false;
        }

        Ok(Self {
            inner: BaseForm::new(fields),
            store,
        })
    }
}

#[async_trait]
impl Form for CarCreationForm {
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
            .instrument(form_span("car_creation"))
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
impl ModelForm for CarCreationForm {
    type Model = Car;

    fn instance(&self) -> Option<&Car> {
        None
    }

    /// Creates the car and links its drivers.
    async fn save(&mut self) -> TaxiResult<Car> {
        async move {
            require_valid(self).await?;
            let data = self.inner.cleaned_data();
            let model = data
                .get("model")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let manufacturer_id = data
                .get("manufacturer")
                .and_then(Value::as_int)
                .ok_or_else(|| TaxiError::InternalError("manufacturer was not cleaned".into()))?;
            let drivers = data
                .get(DRIVERS_FIELD)
                .and_then(Value::as_int_list)
                .unwrap_or_default();

            let car = self
                .store
                .create_car(Car::new(model, manufacturer_id).with_drivers(drivers))
                .await?;
            tracing::info!(pk = car.id, drivers = car.drivers.len(), "car created");
            Ok(car)
        }
        .instrument(form_span("car_creation"))
        .await
    }
}
