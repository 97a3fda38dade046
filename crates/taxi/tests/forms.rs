//! Driver and car forms end to end: bind, validate, save.

mod common;

use std::sync::Arc;

use common::{add_driver, add_manufacturer, registration, stores, PASSWORD};
use taxi::forms::{CarCreationForm, DriverCreationForm, DriverLicenseUpdateForm};
use taxi::{CarRepository, Driver, DriverRepository, MemoryStore, TaxiStore};
use taxi_core::{Settings, TaxiError};
use taxi_forms::{Form, ModelForm, QueryDict, WidgetType};

#[tokio::test]
async fn driver_creation_saves_hashed_account() {
    for (name, store) in stores().await {
        let mut form = DriverCreationForm::from_settings(store.clone(), &Settings::default());
        form.bind(&QueryDict::parse(&registration("jdoe", "JDO12345")));
        assert!(form.is_valid().await, "{name}: {:?}", form.errors());

        let driver = form.save().await.unwrap();
        assert!(driver.id().is_some());
        assert_eq!(driver.license_number, "JDO12345");
        assert_eq!(driver.user.get_full_name(), "John Doe");

        let stored = store.get_driver(driver.id().unwrap()).await.unwrap();
        assert_ne!(stored.user.password, PASSWORD);
        assert!(stored.user.check_password(PASSWORD).await.unwrap(), "{name}");
    }
}

#[tokio::test]
async fn driver_creation_field_order() {
    let form = DriverCreationForm::new(Arc::new(MemoryStore::new()), 8);
    let names: Vec<&str> = form.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["username", "password1", "password2", "license_number", "first_name", "last_name"]
    );
    assert!(form.fields().iter().all(|f| f.required));
}

#[tokio::test]
async fn driver_creation_reports_every_problem() {
    let store: Arc<dyn TaxiStore> = Arc::new(MemoryStore::new());
    add_driver(&store, "ann", "XYZ12345").await;

    let mut form = DriverCreationForm::new(store, 8);
    form.bind(&QueryDict::parse(
        "username=ann&password1=abc&password2=abd&license_number=xyz12345",
    ));
    assert!(!form.is_valid().await);

    let errors = form.errors();
    assert_eq!(
        errors["username"],
        vec!["A user with that username already exists.".to_string()]
    );
    assert_eq!(
        errors["password2"],
        vec!["The two password fields didn't match.".to_string()]
    );
    assert_eq!(
        errors["license_number"],
        vec!["The first 3 characters must be uppercase letters.".to_string()]
    );
    assert_eq!(errors["first_name"], vec!["This field is required.".to_string()]);
    assert_eq!(errors["last_name"], vec!["This field is required.".to_string()]);
}

#[tokio::test]
async fn driver_creation_password_policy_from_settings() {
    let settings = Settings {
        password_min_length: 20,
        ..Settings::default()
    };
    let mut form = DriverCreationForm::from_settings(Arc::new(MemoryStore::new()), &settings);
    form.bind(&QueryDict::parse(&registration("jdoe", "JDO12345")));
    assert!(!form.is_valid().await);
    assert_eq!(
        form.errors()["password2"],
        vec!["This password is too short. It must contain at least 20 characters.".to_string()]
    );
}

#[tokio::test]
async fn license_taken_between_validation_and_save() {
    for (name, store) in stores().await {
        let mut form = DriverCreationForm::new(store.clone(), 8);
        form.bind(&QueryDict::parse(&registration("jdoe", "JDO12345")));
        assert!(form.is_valid().await, "{name}");

        // another submission wins the race
        add_driver(&store, "ann", "JDO12345").await;

        let err = form.save().await.unwrap_err();
        assert!(matches!(err, TaxiError::ValidationError(_)), "{name}");
        assert_eq!(
            form.errors()["license_number"],
            vec!["License number already exists.".to_string()]
        );
        assert_eq!(store.list_drivers().await.unwrap().len(), 1, "{name}");
    }
}

#[tokio::test]
async fn license_update_saves_and_keeps_the_rest() {
    for (name, store) in stores().await {
        let ann = add_driver(&store, "ann", "XYZ12345").await;
        let pk = ann.id().unwrap();

        let mut form = DriverLicenseUpdateForm::load(store.clone(), pk).await.unwrap();
        assert_eq!(form.initial()["license_number"].as_str(), Some("XYZ12345"));
        assert_eq!(form.fields().len(), 1);

        form.bind(&QueryDict::parse("license_number=ANN00001"));
        let updated = form.save().await.unwrap();
        assert_eq!(updated.license_number, "ANN00001");
        assert_eq!(form.instance().unwrap().license_number, "ANN00001");

        let stored = store.get_driver(pk).await.unwrap();
        assert_eq!(stored.license_number, "ANN00001", "{name}");
        assert_eq!(stored.user.username, "ann");
    }
}

#[tokio::test]
async fn license_update_rejects_invalid_without_writing() {
    let store: Arc<dyn TaxiStore> = Arc::new(MemoryStore::new());
    let ann = add_driver(&store, "ann", "XYZ12345").await;
    let pk = ann.id().unwrap();

    let mut form = DriverLicenseUpdateForm::new(store.clone(), ann);
    form.bind(&QueryDict::parse("license_number=XY123456"));
    let err = form.save().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: license_number: The first 3 characters must be uppercase letters."
    );
    assert_eq!(store.get_driver(pk).await.unwrap().license_number, "XYZ12345");
}

#[tokio::test]
async fn license_update_for_missing_driver() {
    let store: Arc<dyn TaxiStore> = Arc::new(MemoryStore::new());
    assert!(matches!(
        DriverLicenseUpdateForm::load(store, 7).await,
        Err(TaxiError::DoesNotExist(_))
    ));
}

#[tokio::test]
async fn unsaved_driver_cannot_be_updated() {
    let mut form = DriverLicenseUpdateForm::new(
        Arc::new(MemoryStore::new()),
        Driver::new("ghost", "GHO00001"),
    );
    form.bind(&QueryDict::parse("license_number=GHO00002"));
    assert!(matches!(form.save().await, Err(TaxiError::DatabaseError(_))));
}

#[tokio::test]
async fn car_form_fields() {
    let store: Arc<dyn TaxiStore> = Arc::new(MemoryStore::new());
    add_manufacturer(&store, "Lincoln").await;
    add_driver(&store, "ann", "XYZ12345").await;
    add_driver(&store, "bob", "BOB12345").await;

    let form = CarCreationForm::new(store).await.unwrap();
    let names: Vec<&str> = form.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["model", "manufacturer", "drivers"]);

    let drivers = &form.fields()[2];
    assert!(!drivers.required);
    assert_eq!(drivers.widget, WidgetType::CheckboxSelectMultiple);
    assert_eq!(
        drivers.field_type.choices().unwrap().to_vec(),
        vec![(1, "ann".to_string()), (2, "bob".to_string())]
    );
    assert!(form.fields()[1].required);
}

#[tokio::test]
async fn car_accepts_zero_one_or_many_drivers() {
    for (name, store) in stores().await {
        let m = add_manufacturer(&store, "Lincoln").await;
        let ann = add_driver(&store, "ann", "XYZ12345").await.id().unwrap();
        let bob = add_driver(&store, "bob", "BOB12345").await.id().unwrap();

        for (body, expected) in [
            (format!("model=Continental&manufacturer={m}"), vec![]),
            (format!("model=Navigator&manufacturer={m}&drivers={ann}"), vec![ann]),
            (
                format!("model=Aviator&manufacturer={m}&drivers={bob}&drivers={ann}"),
                vec![ann, bob],
            ),
        ] {
            let mut form = CarCreationForm::new(store.clone()).await.unwrap();
            form.bind(&QueryDict::parse(&body));
            assert!(form.is_valid().await, "{name}: {body}: {:?}", form.errors());
            let car = form.save().await.unwrap();
            assert_eq!(car.drivers, expected, "{name}: {body}");
            assert_eq!(store.get_car(car.id.unwrap()).await.unwrap().drivers, expected);
        }
        assert_eq!(store.list_cars().await.unwrap().len(), 3);
    }
}

#[tokio::test]
async fn car_rejects_unknown_choices() {
    let store: Arc<dyn TaxiStore> = Arc::new(MemoryStore::new());
    let m = add_manufacturer(&store, "Lincoln").await;
    add_driver(&store, "ann", "XYZ12345").await;

    let mut form = CarCreationForm::new(store.clone()).await.unwrap();
    form.bind(&QueryDict::parse("model=Ghost&manufacturer=9&drivers=1&drivers=99"));
    assert!(!form.is_valid().await);
    assert_eq!(
        form.errors()["manufacturer"],
        vec!["Select a valid choice. That choice is not one of the available choices.".to_string()]
    );
    assert_eq!(
        form.errors()["drivers"],
        vec!["Select a valid choice. 99 is not one of the available choices.".to_string()]
    );

    form.bind(&QueryDict::parse(&format!("manufacturer={m}")));
    assert!(!form.is_valid().await);
    assert_eq!(form.errors()["model"], vec!["This field is required.".to_string()]);
    assert!(store.list_cars().await.unwrap().is_empty());
}

#[tokio::test]
async fn unbound_form_cannot_save() {
    let store: Arc<dyn TaxiStore> = Arc::new(MemoryStore::new());
    let mut form = CarCreationForm::new(store).await.unwrap();
    assert!(matches!(
        form.save().await,
        Err(TaxiError::ValidationError(e)) if e.code == "unbound"
    ));
}
