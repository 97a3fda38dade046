//! End-to-end runs of the management commands against a SQLite file.

use taxi::{CarRepository, DriverRepository};
use taxi_cli::command::CommandRegistry;
use taxi_cli::commands::register_builtin_commands;
use taxi_core::{settings_loader, Settings, TaxiError, TaxiResult};

const PASSWORD: &str = "Cobalt-Fern-71";

struct Fleet {
    registry: CommandRegistry,
    settings: Settings,
    _dir: tempfile::TempDir,
}

impl Fleet {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let db = dir.path().join("fleet.sqlite3");
        std::fs::write(
            &path,
            format!(
                "debug = false\n\n[databases.default]\nengine = \"sqlite\"\nname = \"{}\"\n",
                db.display()
            ),
        )
        .unwrap();

        let mut registry = CommandRegistry::new();
        register_builtin_commands(&mut registry);
        Self {
            registry,
            settings: settings_loader::from_file(&path).unwrap(),
            _dir: dir,
        }
    }

    async fn run(&self, args: &[&str]) -> TaxiResult<()> {
        let matches = self
            .registry
            .build_cli()
            .try_get_matches_from(std::iter::once("taxi").chain(args.iter().copied()))
            .unwrap();
        self.registry.execute(&matches, &self.settings).await
    }

    async fn create_driver(&self, username: &str, license: &str) -> TaxiResult<()> {
        self.run(&[
            "createdriver",
            "--username",
            username,
            "--password",
            PASSWORD,
            "--license-number",
            license,
            "--first-name",
            "John",
            "--last-name",
            "Doe",
        ])
        .await
    }
}

fn field_messages(err: TaxiError, field: &str) -> Vec<String> {
    match err {
        TaxiError::ValidationError(e) => e.field_errors[field]
            .iter()
            .map(ToString::to_string)
            .collect(),
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_migrate_then_register_drivers() {
    let fleet = Fleet::new();
    fleet.run(&["migrate"]).await.unwrap();
    fleet.run(&["migrate"]).await.unwrap();

    fleet.create_driver("jdoe", "ABC12345").await.unwrap();
    let err = fleet.create_driver("asmith", "ABC12345").await.unwrap_err();
    assert_eq!(
        field_messages(err, "license_number"),
        vec!["License number already exists."]
    );
    let err = fleet.create_driver("asmith", "abc12345").await.unwrap_err();
    assert_eq!(
        field_messages(err, "license_number"),
        vec!["The first 3 characters must be uppercase letters."]
    );

    let store = taxi::store::open(&fleet.settings).await.unwrap();
    let drivers = store.list_drivers().await.unwrap();
    assert_eq!(drivers.len(), 1);
    assert!(drivers[0].user.check_password(PASSWORD).await.unwrap());
}

#[tokio::test]
async fn test_update_license() {
    let fleet = Fleet::new();
    fleet.create_driver("jdoe", "ABC12345").await.unwrap();
    fleet.create_driver("asmith", "XYZ54321").await.unwrap();

    fleet
        .run(&["updatelicense", "--driver", "1", "--license-number", "ABC12345"])
        .await
        .unwrap();
    let err = fleet
        .run(&["updatelicense", "--driver", "1", "--license-number", "XYZ54321"])
        .await
        .unwrap_err();
    assert_eq!(
        field_messages(err, "license_number"),
        vec!["License number already exists."]
    );
    let err = fleet
        .run(&["updatelicense", "--driver", "1", "--license-number", "ABC1234"])
        .await
        .unwrap_err();
    assert_eq!(
        field_messages(err, "license_number"),
        vec!["License number must be exactly 8 digits long."]
    );
    fleet
        .run(&["updatelicense", "--driver", "2", "--license-number", "QRS00001"])
        .await
        .unwrap();
    assert!(matches!(
        fleet
            .run(&["updatelicense", "--driver", "9", "--license-number", "QRS00002"])
            .await,
        Err(TaxiError::DoesNotExist(_))
    ));

    let store = taxi::store::open(&fleet.settings).await.unwrap();
    assert_eq!(store.get_driver(1).await.unwrap().license_number, "ABC12345");
    assert_eq!(store.get_driver(2).await.unwrap().license_number, "QRS00001");
}

#[tokio::test]
async fn test_create_cars() {
    let fleet = Fleet::new();
    fleet
        .run(&["createmanufacturer", "--name", "Lincoln", "--country", "USA"])
        .await
        .unwrap();
    fleet.create_driver("jdoe", "ABC12345").await.unwrap();
    fleet.create_driver("asmith", "XYZ54321").await.unwrap();

    fleet
        .run(&["createcar", "--model", "Navigator", "--manufacturer", "1"])
        .await
        .unwrap();
    fleet
        .run(&[
            "createcar",
            "--model",
            "Continental",
            "--manufacturer",
            "1",
            "--driver",
            "2",
            "--driver",
            "1",
        ])
        .await
        .unwrap();

    let err = fleet
        .run(&["createcar", "--model", "Ghost", "--manufacturer", "5"])
        .await
        .unwrap_err();
    assert_eq!(
        field_messages(err, "manufacturer"),
        vec!["Select a valid choice. That choice is not one of the available choices."]
    );

    let store = taxi::store::open(&fleet.settings).await.unwrap();
    let cars = store.list_cars().await.unwrap();
    assert_eq!(cars.len(), 2);
    assert!(cars[0].drivers.is_empty());
    assert_eq!(cars[1].drivers, vec![1, 2]);

    fleet.run(&["listcars", "--json"]).await.unwrap();
    fleet.run(&["listdrivers"]).await.unwrap();
}

#[tokio::test]
async fn test_duplicate_manufacturer() {
    let fleet = Fleet::new();
    let args = ["createmanufacturer", "--name", "Lincoln", "--country", "USA"];
    fleet.run(&args).await.unwrap();
    assert!(matches!(
        fleet.run(&args).await,
        Err(TaxiError::IntegrityError(_))
    ));
}
