//! Model-backed forms.
//!
//! [`ModelFormConfig`] says how to build form fields from a model's
//! [`ModelMeta`]; [`generate_form_fields`] builds them. Relational fields
//! become model choice fields whose choices the caller supplies, since
//! loading them is the store's job.

use std::collections::HashMap;

use async_trait::async_trait;
use taxi_core::TaxiResult;
use taxi_db::fields::{FieldDef, FieldType};
use taxi_db::model::{Model, ModelMeta};
use taxi_db::value::Value;

use crate::fields::{FormFieldDef, FormFieldType};
use crate::form::Form;
use crate::widgets::WidgetType;

/// Specifies which model fields to include in a model form.
#[derive(Debug, Clone)]
pub enum ModelFormFields {
    /// Include all editable fields.
    All,
    /// Include only the specified fields, in the given order.
    Include(Vec<String>),
    /// Include all editable fields except the specified ones.
    Exclude(Vec<String>),
}

/// Configuration for generating a model-backed form.
pub struct ModelFormConfig {
    /// The model metadata to generate fields from.
    pub model_meta: &'static ModelMeta,
    /// Which model fields to include in the form.
    pub fields: ModelFormFields,
    /// Widget overrides keyed by field name.
    pub widgets: HashMap<String, WidgetType>,
    /// Label overrides keyed by field name.
    pub labels: HashMap<String, String>,
    /// Help text overrides keyed by field name.
    pub help_texts: HashMap<String, String>,
    /// Choices for relational fields, keyed by field name.
    pub choices: HashMap<String, Vec<(i64, String)>>,
}

impl ModelFormConfig {
    /// Creates a new `ModelFormConfig` with all fields included.
    pub fn new(model_meta: &'static ModelMeta) -> Self {
        Self {
            model_meta,
            fields: ModelFormFields::All,
            widgets: HashMap::new(),
            labels: HashMap::new(),
            help_texts: HashMap::new(),
            choices: HashMap::new(),
        }
    }

    /// Sets which fields to include.
    #[must_use]
    pub fn with_fields(mut self, fields: ModelFormFields) -> Self {
        self.fields = fields;
        self
    }

    /// Adds a widget override for a specific field.
    #[must_use]
    pub fn with_widget(mut self, field_name: impl Into<String>, widget: WidgetType) -> Self {
        self.widgets.insert(field_name.into(), widget);
        self
    }

    /// Adds a label override for a specific field.
    #[must_use]
    pub fn with_label(mut self, field_name: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(field_name.into(), label.into());
        self
    }

    /// Adds a help text override for a specific field.
    #[must_use]
    pub fn with_help_text(mut self, field_name: impl Into<String>, text: impl Into<String>) -> Self {
        self.help_texts.insert(field_name.into(), text.into());
        self
    }

    /// Supplies the choices for a relational field.
    #[must_use]
    pub fn with_choices(
        mut self,
        field_name: impl Into<String>,
        choices: Vec<(i64, String)>,
    ) -> Self {
        self.choices.insert(field_name.into(), choices);
        self
    }

    fn includes(&self, name: &str) -> bool {
        match &self.fields {
            ModelFormFields::All => true,
            ModelFormFields::Include(include) => include.iter().any(|f| f == name),
            ModelFormFields::Exclude(exclude) => !exclude.iter().any(|f| f == name),
        }
    }
}

/// Generates form field definitions from a model form configuration.
///
/// Primary keys and non-editable fields are skipped. A field is required
/// unless the model allows it to be null or blank, or gives it a default.
/// With [`ModelFormFields::Include`] the listed order is kept.
pub fn generate_form_fields(config: &ModelFormConfig) -> Vec<FormFieldDef> {
    let meta = config.model_meta;
    let candidates: Vec<&FieldDef> = match &config.fields {
        ModelFormFields::Include(names) => names
            .iter()
            .filter_map(|name| meta.get_field(name))
            .collect(),
        _ => meta.fields.iter().collect(),
    };

    candidates
        .into_iter()
        .filter(|f| f.editable && !f.primary_key && config.includes(f.name))
        .map(|model_field| build_form_field(config, model_field))
        .collect()
}

fn build_form_field(config: &ModelFormConfig, model_field: &FieldDef) -> FormFieldDef {
    let name = model_field.name;
    let mut form_field = FormFieldDef::new(name, model_field_to_form_field_type(config, model_field));

    form_field.required = !model_field.null && !model_field.blank && model_field.default.is_none();

    if let Some(widget) = config.widgets.get(name) {
        form_field.widget = *widget;
    }
    form_field.label = config
        .labels
        .get(name)
        .cloned()
        .unwrap_or_else(|| model_field.verbose_name.clone());
    form_field.help_text = config
        .help_texts
        .get(name)
        .cloned()
        .unwrap_or_else(|| model_field.help_text.clone());
    if let Some(default) = &model_field.default {
        form_field.initial = Some(default.clone());
    }

    form_field
}

/// Converts a model field type to a form field type.
fn model_field_to_form_field_type(config: &ModelFormConfig, field_def: &FieldDef) -> FormFieldType {
    let choices = || config.choices.get(field_def.name).cloned().unwrap_or_default();
    match &field_def.field_type {
        FieldType::CharField | FieldType::TextField => FormFieldType::char(field_def.max_length),
        FieldType::EmailField => FormFieldType::Email,
        FieldType::BooleanField => FormFieldType::Boolean,
        FieldType::DateTimeField => FormFieldType::DateTime,
        FieldType::IntegerField | FieldType::AutoField => FormFieldType::Integer {
            min_value: None,
            max_value: None,
        },
        FieldType::ForeignKey { .. } => FormFieldType::ModelChoice { choices: choices() },
        FieldType::ManyToManyField { .. } => FormFieldType::ModelMultipleChoice {
            choices: choices(),
        },
    }
}

/// Builds the initial values of a form from a saved model instance.
///
/// Only fields present in `fields` are taken from the instance.
pub fn model_to_initial<M: Model>(instance: &M, fields: &[FormFieldDef]) -> HashMap<String, Value> {
    instance
        .field_values()
        .into_iter()
        .filter(|(name, _)| fields.iter().any(|f| f.name == *name))
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// A form that creates or updates a model instance.
#[async_trait]
pub trait ModelForm: Form {
    /// The model this form saves.
    type Model: Model;

    /// The instance being edited, if any.
    fn instance(&self) -> Option<&Self::Model>;

    /// Validates if needed, then persists and returns the instance.
    ///
    /// # Errors
    ///
    /// Returns [`TaxiError::ValidationError`](taxi_core::TaxiError) if the
    /// form is unbound or invalid, or the store's error if persisting fails.
    async fn save(&mut self) -> TaxiResult<Self::Model>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;
    use taxi_core::TaxiError;
    use taxi_db::row::Row;

    static CAR_META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
        app_label: "taxi",
        model_name: "car",
        db_table: "taxi_car",
        verbose_name: "car".to_string(),
        fields: vec![
            FieldDef::new("id", FieldType::AutoField).primary_key(),
            FieldDef::new("model", FieldType::CharField)
                .max_length(255)
                .verbose_name("Model"),
            FieldDef::new(
                "manufacturer",
                FieldType::ForeignKey {
                    to: "taxi.manufacturer".into(),
                },
            ),
            FieldDef::new(
                "drivers",
                FieldType::ManyToManyField {
                    to: "taxi.driver".into(),
                },
            )
            .help_text("Who may drive this car"),
            FieldDef::new("created", FieldType::DateTimeField).editable(false),
            FieldDef::new("seats", FieldType::IntegerField).default(4),
        ],
    });

    struct Car {
        id: Option<i64>,
        model: String,
    }

    impl Model for Car {
        fn meta() -> &'static ModelMeta {
            &CAR_META
        }
        fn pk(&self) -> Option<i64> {
            self.id
        }
        fn set_pk(&mut self, pk: i64) {
            self.id = Some(pk);
        }
        fn field_values(&self) -> Vec<(&'static str, Value)> {
            vec![("id", self.id.into()), ("model", self.model.as_str().into())]
        }
        fn from_row(row: &Row) -> Result<Self, TaxiError> {
            Ok(Self {
                id: row.get("id")?,
                model: row.get("model")?,
            })
        }
    }

    fn names(fields: &[FormFieldDef]) -> Vec<&str> {
        fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_all_fields_skip_pk_and_non_editable() {
        let fields = generate_form_fields(&ModelFormConfig::new(&CAR_META));
        assert_eq!(names(&fields), vec!["model", "manufacturer", "drivers", "seats"]);
    }

    #[test]
    fn test_relational_fields_become_model_choices() {
        let config = ModelFormConfig::new(&CAR_META)
            .with_choices("manufacturer", vec![(1, "Lincoln".into())])
            .with_choices("drivers", vec![(1, "ann".into()), (2, "bob".into())]);
        let fields = generate_form_fields(&config);

        assert_eq!(
            fields[1].field_type,
            FormFieldType::ModelChoice {
                choices: vec![(1, "Lincoln".into())]
            }
        );
        assert_eq!(fields[1].widget, WidgetType::Select);
        assert_eq!(fields[2].field_type.choices().map(<[_]>::len), Some(2));
        assert_eq!(fields[2].widget, WidgetType::SelectMultiple);
        assert!(fields[2].required);
        assert_eq!(fields[2].help_text, "Who may drive this car");
    }

    #[test]
    fn test_required_and_initial_from_default() {
        let fields = generate_form_fields(&ModelFormConfig::new(&CAR_META));
        let seats = fields.iter().find(|f| f.name == "seats").unwrap();
        assert!(!seats.required);
        assert_eq!(seats.initial, Some(Value::Int(4)));
        assert_eq!(fields[0].label, "Model");
        assert_eq!(
            fields[0].field_type,
            FormFieldType::char(Some(255))
        );
    }

    #[test]
    fn test_include_keeps_order() {
        let config = ModelFormConfig::new(&CAR_META).with_fields(ModelFormFields::Include(vec![
            "drivers".into(),
            "model".into(),
            "id".into(),
        ]));
        assert_eq!(names(&generate_form_fields(&config)), vec!["drivers", "model"]);
    }

    #[test]
    fn test_exclude_and_overrides() {
        let config = ModelFormConfig::new(&CAR_META)
            .with_fields(ModelFormFields::Exclude(vec!["seats".into()]))
            .with_widget("drivers", WidgetType::CheckboxSelectMultiple)
            .with_label("model", "Car model");
        let fields = generate_form_fields(&config);
        assert_eq!(names(&fields), vec!["model", "manufacturer", "drivers"]);
        assert_eq!(fields[0].label, "Car model");
        assert_eq!(fields[2].widget, WidgetType::CheckboxSelectMultiple);
    }

    #[test]
    fn test_model_to_initial() {
        let car = Car {
            id: Some(3),
            model: "Model S".into(),
        };
        let fields = generate_form_fields(
            &ModelFormConfig::new(&CAR_META)
                .with_fields(ModelFormFields::Include(vec!["model".into()])),
        );
        let initial = model_to_initial(&car, &fields);
        assert_eq!(initial.len(), 1);
        assert_eq!(initial["model"], Value::from("Model S"));
    }
}
