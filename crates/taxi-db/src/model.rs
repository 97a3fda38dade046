//! The model trait, metadata, and persistence helpers.
//!
//! [`Model`] ties a Rust struct to a table. [`ModelMeta`] describes its
//! fields so forms can be generated from it. [`create_model`] and
//! [`update_model_fields`] issue the INSERT/UPDATE statements for any model.

use taxi_core::{TaxiError, TaxiResult};

use crate::backend::{DatabaseBackend, Transaction};
use crate::fields::FieldDef;
use crate::row::Row;
use crate::value::Value;

/// The core trait for persisted models.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use taxi_core::TaxiError;
/// use taxi_db::fields::{FieldDef, FieldType};
/// use taxi_db::model::{Model, ModelMeta};
/// use taxi_db::row::Row;
/// use taxi_db::value::Value;
///
/// struct Manufacturer {
///     id: Option<i64>,
///     name: String,
/// }
///
/// impl Model for Manufacturer {
///     fn meta() -> &'static ModelMeta {
///         static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
///             app_label: "taxi",
///             model_name: "manufacturer",
///             db_table: "taxi_manufacturer",
///             verbose_name: "manufacturer".to_string(),
///             fields: vec![
///                 FieldDef::new("id", FieldType::AutoField).primary_key(),
///                 FieldDef::new("name", FieldType::CharField).max_length(255),
///             ],
///         });
///         &META
///     }
///
///     fn pk(&self) -> Option<i64> { self.id }
///     fn set_pk(&mut self, pk: i64) { self.id = Some(pk); }
///     fn field_values(&self) -> Vec<(&'static str, Value)> {
///         vec![("id", self.id.into()), ("name", self.name.as_str().into())]
///     }
///     fn from_row(row: &Row) -> Result<Self, TaxiError> {
///         Ok(Self { id: row.get("id")?, name: row.get("name")? })
///     }
/// }
///
/// assert_eq!(Manufacturer::table_name(), "taxi_manufacturer");
/// ```
pub trait Model: Send + Sync + 'static {
    /// Returns the static metadata for this model type.
    fn meta() -> &'static ModelMeta;

    /// Returns the database table name.
    fn table_name() -> &'static str {
        Self::meta().db_table
    }

    /// Returns the name of the primary key column.
    fn pk_field_name() -> &'static str {
        "id"
    }

    /// Returns the primary key, or `None` if the instance is unsaved.
    fn pk(&self) -> Option<i64>;

    /// Sets the primary key (used after INSERT).
    fn set_pk(&mut self, pk: i64);

    /// Returns the column name-value pairs for this instance.
    ///
    /// Many-to-many fields are stored in link tables and are not included.
    fn field_values(&self) -> Vec<(&'static str, Value)>;

    /// Returns column name-value pairs excluding the primary key.
    fn non_pk_field_values(&self) -> Vec<(&'static str, Value)> {
        let pk_name = Self::pk_field_name();
        self.field_values()
            .into_iter()
            .filter(|(name, _)| *name != pk_name)
            .collect()
    }

    /// Constructs a model instance from a database row.
    fn from_row(row: &Row) -> Result<Self, TaxiError>
    where
        Self: Sized;
}

/// Model-level metadata.
#[derive(Debug, Clone)]
pub struct ModelMeta {
    /// The application label (e.g. "taxi").
    pub app_label: &'static str,
    /// The lowercase model name (e.g. "driver").
    pub model_name: &'static str,
    /// The database table name.
    pub db_table: &'static str,
    /// Human-readable singular name.
    pub verbose_name: String,
    /// All fields, in declaration order.
    pub fields: Vec<FieldDef>,
}

impl ModelMeta {
    /// Returns the field with the given name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the fields that appear in generated forms, in declaration order.
    pub fn editable_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.editable && !f.primary_key)
    }

    /// Returns the `app_label.model_name` label used by relational fields.
    pub fn label(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }
}

fn insert_statement<M: Model>(model: &M) -> (String, Vec<Value>) {
    let fields = model.non_pk_field_values();
    let columns: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
    let placeholders = vec!["?"; fields.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        M::table_name(),
        columns.join(", ")
    );
    (sql, fields.into_iter().map(|(_, v)| v).collect())
}

/// Inserts a model instance and stores the generated primary key on it.
///
/// # Errors
///
/// Returns [`TaxiError::IntegrityError`] on a constraint violation, or the
/// backend's error for anything else.
pub async fn create_model<M: Model>(model: &mut M, db: &dyn DatabaseBackend) -> TaxiResult<()> {
    let (sql, params) = insert_statement(model);
    let pk = db.insert_returning_id(&sql, &params).await?;
    model.set_pk(pk);
    tracing::debug!(table = M::table_name(), pk, "inserted row");
    Ok(())
}

/// Like [`create_model`], inside an open transaction.
pub async fn create_model_in<M: Model>(model: &mut M, txn: &mut dyn Transaction) -> TaxiResult<()> {
    let (sql, params) = insert_statement(model);
    let pk = txn.insert_returning_id(&sql, &params).await?;
    model.set_pk(pk);
    tracing::debug!(table = M::table_name(), pk, "inserted row in transaction");
    Ok(())
}

/// Writes only the named columns of a saved model instance.
///
/// # Errors
///
/// Returns [`TaxiError::DatabaseError`] if the instance has no primary key or
/// a name is not one of its columns, and [`TaxiError::DoesNotExist`] if no
/// row matched.
pub async fn update_model_fields<M: Model>(
    model: &M,
    fields: &[&str],
    db: &dyn DatabaseBackend,
) -> TaxiResult<()> {
    let pk = model.pk().ok_or_else(|| {
        TaxiError::DatabaseError("Cannot update a model without a primary key".to_string())
    })?;
    let values = model.field_values();

    let mut assignments = Vec::with_capacity(fields.len());
    let mut params = Vec::with_capacity(fields.len() + 1);
    for field in fields {
        let (name, value) = values
            .iter()
            .find(|(name, _)| name == field)
            .ok_or_else(|| {
                TaxiError::DatabaseError(format!(
                    "'{field}' is not a column of {}",
                    M::table_name()
                ))
            })?;
        assignments.push(format!("{name} = ?"));
        params.push(value.clone());
    }
    if assignments.is_empty() {
        return Ok(());
    }
    params.push(Value::Int(pk));

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        M::table_name(),
        assignments.join(", "),
        M::pk_field_name()
    );
    let affected = db.execute(&sql, &params).await?;
    if affected == 0 {
        return Err(TaxiError::DoesNotExist(format!(
            "{} with pk {pk}",
            M::meta().model_name
        )));
    }
    Ok(())
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::fields::FieldType;
    use crate::sqlite::SqliteBackend;

    #[derive(Debug, PartialEq)]
    struct Manufacturer {
        id: Option<i64>,
        name: String,
        country: String,
    }

    impl Model for Manufacturer {
        fn meta() -> &'static ModelMeta {
            static META: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta {
                app_label: "taxi",
                model_name: "manufacturer",
                db_table: "taxi_manufacturer",
                verbose_name: "manufacturer".to_string(),
                fields: vec![
                    FieldDef::new("id", FieldType::AutoField).primary_key(),
                    FieldDef::new("name", FieldType::CharField)
                        .max_length(255)
                        .unique(),
                    FieldDef::new("country", FieldType::CharField).max_length(255),
                ],
            });
            &META
        }

        fn pk(&self) -> Option<i64> {
            self.id
        }

        fn set_pk(&mut self, pk: i64) {
            self.id = Some(pk);
        }

        fn field_values(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("id", self.id.into()),
                ("name", self.name.as_str().into()),
                ("country", self.country.as_str().into()),
            ]
        }

        fn from_row(row: &Row) -> Result<Self, TaxiError> {
            Ok(Self {
                id: row.get("id")?,
                name: row.get("name")?,
                country: row.get("country")?,
            })
        }
    }

    async fn setup() -> SqliteBackend {
        let db = SqliteBackend::memory().unwrap();
        db.execute_batch(
            "CREATE TABLE taxi_manufacturer (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                country TEXT NOT NULL
            )",
        )
        .await
        .unwrap();
        db
    }

    fn lincoln() -> Manufacturer {
        Manufacturer {
            id: None,
            name: "Lincoln".into(),
            country: "USA".into(),
        }
    }

    #[test]
    fn test_meta_helpers() {
        let meta = Manufacturer::meta();
        assert_eq!(meta.label(), "taxi.manufacturer");
        assert!(meta.get_field("name").unwrap().unique);
        let editable: Vec<_> = meta.editable_fields().map(|f| f.name).collect();
        assert_eq!(editable, vec!["name", "country"]);
    }

    #[tokio::test]
    async fn test_create_sets_pk() {
        let db = setup().await;
        let mut m = lincoln();
        create_model(&mut m, &db).await.unwrap();
        assert_eq!(m.id, Some(1));

        let row = db
            .query_one("SELECT * FROM taxi_manufacturer WHERE id = ?", &[Value::Int(1)])
            .await
            .unwrap();
        assert_eq!(Manufacturer::from_row(&row).unwrap(), m);
    }

    #[tokio::test]
    async fn test_create_in_transaction() {
        let db = setup().await;
        let mut kept = lincoln();
        let mut txn = db.begin_transaction().await.unwrap();
        create_model_in(&mut kept, txn.as_mut()).await.unwrap();
        txn.commit().await.unwrap();
        assert_eq!(kept.id, Some(1));

        let mut dropped = Manufacturer {
            id: None,
            name: "Ford".into(),
            country: "USA".into(),
        };
        let mut txn = db.begin_transaction().await.unwrap();
        create_model_in(&mut dropped, txn.as_mut()).await.unwrap();
        txn.rollback().await.unwrap();

        let rows = db.query("SELECT * FROM taxi_manufacturer", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_create_duplicate_is_integrity_error() {
        let db = setup().await;
        create_model(&mut lincoln(), &db).await.unwrap();
        let err = create_model(&mut lincoln(), &db).await.unwrap_err();
        assert!(matches!(err, TaxiError::IntegrityError(_)));
    }

    #[tokio::test]
    async fn test_update_fields() {
        let db = setup().await;
        let mut m = lincoln();
        create_model(&mut m, &db).await.unwrap();
        m.country = "United States".into();
        update_model_fields(&m, &["country"], &db).await.unwrap();

        let row = db
            .query_one("SELECT country FROM taxi_manufacturer", &[])
            .await
            .unwrap();
        assert_eq!(row.get::<String>("country").unwrap(), "United States");
    }

    #[tokio::test]
    async fn test_update_unknown_field() {
        let db = setup().await;
        let mut m = lincoln();
        create_model(&mut m, &db).await.unwrap();
        let err = update_model_fields(&m, &["wheels"], &db).await.unwrap_err();
        assert!(matches!(err, TaxiError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let db = setup().await;
        let m = Manufacturer {
            id: Some(42),
            ..lincoln()
        };
        let err = update_model_fields(&m, &["name"], &db).await.unwrap_err();
        assert!(matches!(err, TaxiError::DoesNotExist(_)));
    }

    #[tokio::test]
    async fn test_update_unsaved() {
        let db = setup().await;
        let err = update_model_fields(&lincoln(), &["name"], &db)
            .await
            .unwrap_err();
        assert!(matches!(err, TaxiError::DatabaseError(_)));
    }
}
