//! Database result rows.

use chrono::{DateTime, Utc};
use taxi_core::TaxiError;

use crate::value::Value;

/// A single result row: column names paired with values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "Row column count must match value count"
        );
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a typed value by column name.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T, TaxiError> {
        let value = self.get_value(column).ok_or_else(|| {
            TaxiError::DatabaseError(format!("Column '{column}' not found in row"))
        })?;
        T::from_value(value)
    }

    /// Returns a reference to the raw value at the given column name.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }
}

/// Converts a [`Value`] into a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> Result<Self, TaxiError>;
}

fn mismatch(expected: &str, value: &Value) -> TaxiError {
    TaxiError::DatabaseError(format!("Expected {expected}, got {value:?}"))
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, TaxiError> {
        value.as_int().ok_or_else(|| mismatch("Int", value))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, TaxiError> {
        match value {
            Value::Float(f) => Ok(*f),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(i) => Ok(*i as f64),
            _ => Err(mismatch("Float", value)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, TaxiError> {
        match value {
            Value::Bool(b) => Ok(*b),
            // SQLite stores booleans as 0/1
            Value::Int(i) => Ok(*i != 0),
            _ => Err(mismatch("Bool", value)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, TaxiError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("String", value))
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, TaxiError> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| TaxiError::DatabaseError(format!("Invalid timestamp '{s}': {e}"))),
            _ => Err(mismatch("DateTime", value)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, TaxiError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, TaxiError> {
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        Row::new(
            vec![
                "id".into(),
                "license_number".into(),
                "is_active".into(),
                "date_joined".into(),
                "email".into(),
            ],
            vec![
                Value::Int(3),
                Value::from("XYZ12345"),
                Value::Int(1),
                Value::from("2024-01-02T03:04:05+00:00"),
                Value::Null,
            ],
        )
    }

    #[test]
    fn test_typed_access() {
        let row = sample_row();
        assert_eq!(row.len(), 5);
        assert_eq!(row.get::<i64>("id").unwrap(), 3);
        assert_eq!(row.get::<String>("license_number").unwrap(), "XYZ12345");
        assert!(row.get::<bool>("is_active").unwrap());
        assert_eq!(row.get::<Option<String>>("email").unwrap(), None);
        let joined = row.get::<DateTime<Utc>>("date_joined").unwrap();
        assert_eq!(joined.to_rfc3339(), "2024-01-02T03:04:05+00:00");
    }

    #[test]
    fn test_missing_column() {
        let row = sample_row();
        assert!(matches!(
            row.get::<i64>("nope"),
            Err(TaxiError::DatabaseError(_))
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let row = sample_row();
        assert!(row.get::<i64>("license_number").is_err());
    }

    #[test]
    #[should_panic(expected = "column count")]
    fn test_mismatched_lengths_panic() {
        let _ = Row::new(vec!["a".into()], vec![]);
    }
}
