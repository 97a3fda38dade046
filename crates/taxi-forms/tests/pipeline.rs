//! End-to-end tests of the validation pipeline ordering.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use taxi_core::{TaxiError, TaxiResult, ValidationError};
use taxi_db::value::Value;
use taxi_forms::validation::{field_error, full_clean};
use taxi_forms::{
    BaseForm, FieldCleaner, Form, FormCleaner, FormFieldDef, FormFieldType, QueryDict,
    NON_FIELD_ERRORS,
};

/// Records the order in which steps ran.
type Log = Arc<Mutex<Vec<String>>>;

struct Recording {
    field: &'static str,
    log: Log,
    reject: Option<&'static str>,
}

#[async_trait]
impl FieldCleaner for Recording {
    fn field_name(&self) -> &str {
        self.field
    }

    async fn clean(&self, value: Value, _: &HashMap<String, Value>) -> TaxiResult<Value> {
        self.log.lock().unwrap().push(format!("field:{}", self.field));
        match self.reject {
            Some(msg) => Err(TaxiError::ValidationError(ValidationError::new(msg, "invalid"))),
            None => Ok(value),
        }
    }
}

struct SamePair {
    log: Log,
}

#[async_trait]
impl FormCleaner for SamePair {
    async fn clean(&self, cleaned_data: &HashMap<String, Value>) -> Result<(), ValidationError> {
        self.log.lock().unwrap().push("form".to_string());
        match (cleaned_data.get("first"), cleaned_data.get("second")) {
            (Some(a), Some(b)) if a != b => Err(field_error(
                "second",
                ValidationError::new("Values differ.", "mismatch"),
            )),
            _ => Ok(()),
        }
    }
}

struct Always;

#[async_trait]
impl FormCleaner for Always {
    async fn clean(&self, _: &HashMap<String, Value>) -> Result<(), ValidationError> {
        Err(ValidationError::new("Fleet is closed.", "closed"))
    }
}

fn form(log: &Log, reject_first: Option<&'static str>) -> BaseForm {
    BaseForm::new(vec![
        FormFieldDef::new("first", FormFieldType::char(Some(8))),
        FormFieldDef::new("second", FormFieldType::char(Some(8))),
    ])
    .with_field_cleaner(Recording {
        field: "first",
        log: Arc::clone(log),
        reject: reject_first,
    })
    .with_field_cleaner(Recording {
        field: "second",
        log: Arc::clone(log),
        reject: None,
    })
    .with_form_cleaner(SamePair {
        log: Arc::clone(log),
    })
}

#[tokio::test]
async fn field_cleaners_run_in_order_before_form_cleaners() {
    let log = Log::default();
    let mut f = form(&log, None);
    f.bind(&QueryDict::parse("first=abc&second=abc"));
    assert!(f.is_valid().await);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["field:first", "field:second", "form"]
    );
}

#[tokio::test]
async fn field_cleaner_skipped_when_type_cleaning_failed() {
    let log = Log::default();
    let mut f = form(&log, None);
    f.bind(&QueryDict::parse("first=waytoolongvalue&second=abc"));
    assert!(!f.is_valid().await);
    assert_eq!(*log.lock().unwrap(), vec!["field:second", "form"]);
    assert_eq!(f.errors()["first"].len(), 1);
}

#[tokio::test]
async fn form_cleaner_error_lands_on_named_field() {
    let log = Log::default();
    let mut f = form(&log, None);
    f.bind(&QueryDict::parse("first=abc&second=xyz"));
    let errors = full_clean(&mut f).await.unwrap_err();
    assert_eq!(
        errors,
        vec![("second".to_string(), vec!["Values differ.".to_string()])]
    );
    assert!(!f.cleaned_data().contains_key("second"));
    assert!(f.cleaned_data().contains_key("first"));
}

#[tokio::test]
async fn rejected_field_is_absent_for_form_cleaner() {
    let log = Log::default();
    let mut f = form(&log, Some("Bad first."));
    f.bind(&QueryDict::parse("first=abc&second=xyz"));
    assert!(!f.is_valid().await);
    // the pair check sees no "first" and stays quiet
    assert_eq!(f.errors().len(), 1);
    assert_eq!(f.errors()["first"], vec!["Bad first.".to_string()]);
}

#[tokio::test]
async fn simple_form_error_is_non_field() {
    let mut f = BaseForm::new(vec![FormFieldDef::new("first", FormFieldType::char(None))])
        .with_form_cleaner(Always);
    f.bind(&QueryDict::parse("first=abc"));
    assert!(!f.is_valid().await);
    assert_eq!(f.non_field_errors().to_vec(), vec!["Fleet is closed.".to_string()]);
    assert_eq!(f.errors()[NON_FIELD_ERRORS].len(), 1);
}

#[tokio::test]
async fn multi_valued_field_reads_every_value() {
    let mut f = BaseForm::new(vec![FormFieldDef::new(
        "drivers",
        FormFieldType::ModelMultipleChoice {
            choices: vec![(1, "ann".into()), (2, "bob".into())],
        },
    )
    .required(false)]);
    f.bind(&QueryDict::parse("drivers=2&drivers=1"));
    assert!(f.is_valid().await);
    assert_eq!(
        f.cleaned_data()["drivers"].as_int_list(),
        Some(vec![2, 1])
    );
}
