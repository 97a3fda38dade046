//! Table creation.
//!
//! DDL is generated from each model's [`ModelMeta`], so the unique
//! constraints declared on fields (`username`, `license_number`, manufacturer
//! `name`) become real database constraints. Many-to-many fields get a link
//! table named `{table}_{field}`.

use taxi_core::TaxiResult;
use taxi_db::backend::DatabaseBackend;
use taxi_db::fields::{FieldDef, FieldType};
use taxi_db::model::{Model, ModelMeta};

use crate::models::{Car, Driver, Manufacturer};

/// Turns a relation target like `taxi.driver` into its table name.
fn target_table(to: &str) -> String {
    to.replace('.', "_")
}

fn column_definition(field: &FieldDef) -> Option<String> {
    let sql_type = match &field.field_type {
        FieldType::AutoField => return Some(format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", field.column)),
        FieldType::CharField => match field.max_length {
            Some(n) => format!("VARCHAR({n})"),
            None => "TEXT".to_string(),
        },
        FieldType::TextField => "TEXT".to_string(),
        FieldType::EmailField => "VARCHAR(254)".to_string(),
        FieldType::BooleanField => "BOOLEAN".to_string(),
        FieldType::IntegerField => "INTEGER".to_string(),
        FieldType::DateTimeField => "DATETIME".to_string(),
        FieldType::ForeignKey { to } => format!("INTEGER REFERENCES {}(id)", target_table(to)),
        FieldType::ManyToManyField { .. } => return None,
    };

    let mut definition = format!("{} {sql_type}", field.column);
    if !field.null {
        definition.push_str(" NOT NULL");
    }
    if field.unique {
        definition.push_str(" UNIQUE");
    }
    Some(definition)
}

/// Returns the statements that create a model's table and link tables.
pub fn create_table_sql(meta: &ModelMeta) -> Vec<String> {
    let columns: Vec<String> = meta.fields.iter().filter_map(column_definition).collect();
    let mut statements = vec![format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        meta.db_table,
        columns.join(", ")
    )];

    for field in &meta.fields {
        if let FieldType::ManyToManyField { to } = &field.field_type {
            let target = to.rsplit('.').next().unwrap_or(to);
            statements.push(format!(
                "CREATE TABLE IF NOT EXISTS {table}_{name} (\
                 id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 {model}_id INTEGER NOT NULL REFERENCES {table}(id) ON DELETE CASCADE, \
                 {target}_id INTEGER NOT NULL REFERENCES {target_table}(id) ON DELETE CASCADE, \
                 UNIQUE ({model}_id, {target}_id))",
                table = meta.db_table,
                name = field.name,
                model = meta.model_name,
                target_table = target_table(to),
            ));
        }
    }
    statements
}

/// Creates every fleet table that does not exist yet.
///
/// Safe to run repeatedly.
pub async fn migrate(db: &dyn DatabaseBackend) -> TaxiResult<()> {
    for meta in [Driver::meta(), Manufacturer::meta(), Car::meta()] {
        for statement in create_table_sql(meta) {
            db.execute_batch(&statement).await?;
        }
        tracing::info!(table = meta.db_table, "table ready");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxi_db::sqlite::SqliteBackend;

    #[test]
    fn test_driver_table_constraints() {
        let sql = create_table_sql(Driver::meta());
        assert_eq!(sql.len(), 1);
        assert!(sql[0].contains("username VARCHAR(150) NOT NULL UNIQUE"));
        assert!(sql[0].contains("license_number TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn test_car_tables() {
        let sql = create_table_sql(Car::meta());
        assert_eq!(sql.len(), 2);
        assert!(sql[0].contains("manufacturer_id INTEGER REFERENCES taxi_manufacturer(id) NOT NULL"));
        assert!(!sql[0].contains("drivers"));
        assert!(sql[1].starts_with("CREATE TABLE IF NOT EXISTS taxi_car_drivers"));
        assert!(sql[1].contains("driver_id INTEGER NOT NULL REFERENCES taxi_driver(id)"));
    }

    #[tokio::test]
    async fn test_migrate_twice() {
        let db = SqliteBackend::memory().unwrap();
        migrate(&db).await.unwrap();
        migrate(&db).await.unwrap();
        let rows = db
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'taxi_%' ORDER BY name",
                &[],
            )
            .await
            .unwrap();
        let names: Vec<String> = rows.iter().map(|r| r.get("name").unwrap()).collect();
        assert_eq!(
            names,
            vec!["taxi_car", "taxi_car_drivers", "taxi_driver", "taxi_manufacturer"]
        );
    }
}
