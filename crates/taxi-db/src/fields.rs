//! Model field definitions.
//!
//! [`FieldDef`] captures what a form generator or schema writer needs to know
//! about one model field: its type, nullability, length limit, and whether
//! it is editable. Relational fields name their target model.

use crate::value::Value;

/// The type of a model field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum FieldType {
    /// Auto-incrementing integer primary key.
    AutoField,
    /// Variable-length string with a max length.
    CharField,
    /// Unlimited-length text.
    TextField,
    /// Email address (a `CharField` with email validation).
    EmailField,
    /// Boolean.
    BooleanField,
    /// 64-bit signed integer.
    IntegerField,
    /// Date and time.
    DateTimeField,
    /// Many-to-one relationship.
    ForeignKey {
        /// The target model name (e.g. "taxi.manufacturer").
        to: String,
    },
    /// Many-to-many relationship stored in a link table.
    ManyToManyField {
        /// The target model name.
        to: String,
    },
}

impl FieldType {
    /// Returns `true` for relationship fields.
    pub const fn is_relation(&self) -> bool {
        matches!(self, Self::ForeignKey { .. } | Self::ManyToManyField { .. })
    }

    /// Returns `true` if values of this type live in a column of the model table.
    pub const fn has_column(&self) -> bool {
        !matches!(self, Self::ManyToManyField { .. })
    }
}

/// Complete definition of a model field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// The attribute name of this field.
    pub name: &'static str,
    /// The database column name.
    pub column: String,
    /// The type of this field.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed in the database.
    pub null: bool,
    /// Whether the field may be left blank in forms.
    pub blank: bool,
    /// Default value for new instances.
    pub default: Option<Value>,
    /// Whether a UNIQUE constraint is applied.
    pub unique: bool,
    /// Maximum character length (for `CharField` and similar).
    pub max_length: Option<usize>,
    /// Human-readable help text.
    pub help_text: String,
    /// Human-readable name for the field.
    pub verbose_name: String,
    /// Whether the field is editable in forms.
    pub editable: bool,
}

impl FieldDef {
    /// Creates a new `FieldDef` with defaults: not null, not blank, editable.
    ///
    /// Foreign keys get an `_id` column, mirroring how they are stored.
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        let column = match field_type {
            FieldType::ForeignKey { .. } => format!("{name}_id"),
            _ => name.to_string(),
        };
        Self {
            name,
            column,
            field_type,
            primary_key: false,
            null: false,
            blank: false,
            default: None,
            unique: false,
            max_length: None,
            help_text: String::new(),
            verbose_name: name.replace('_', " "),
            editable: true,
        }
    }

    /// Sets the database column name.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Marks this field as the primary key. Primary keys are not editable.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.editable = false;
        self
    }

    /// Allows NULL values in the database.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Allows blank values in forms.
    #[must_use]
    pub const fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    /// Sets the maximum character length.
    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Marks this field as having a UNIQUE constraint.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the default value for this field.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the verbose (human-readable) name.
    #[must_use]
    pub fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.verbose_name = name.into();
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Sets whether the field appears in generated forms.
    #[must_use]
    pub const fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }
}
