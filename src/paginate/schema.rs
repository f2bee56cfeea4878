use chrono::DateTime;
use chrono::Utc;
use duckdb::core::LogicalTypeId;

/// Field types a detected column can have.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum FieldType {
    /// Boolean values (true/false)
    Boolean,
    /// Variable-length strings
    Text,
    /// UTC instant with microsecond precision
    DateTime,
    /// Double-precision floating point numbers
    Double,
}

impl FieldType {
    /// Returns the string representation of the field type for DuckDB.
    pub(crate) const fn as_str(&self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Text => "varchar",
            FieldType::DateTime => "timestamp",
            FieldType::Double => "double",
        }
    }

    /// Converts field type to DuckDB's logical type ID.
    pub(crate) const fn to_logical_type_id(&self) -> LogicalTypeId {
        match self {
            Self::Boolean => LogicalTypeId::Boolean,
            Self::Text => LogicalTypeId::Varchar,
            Self::DateTime => LogicalTypeId::Timestamp,
            Self::Double => LogicalTypeId::Double,
        }
    }
}

/// A named, nullable column of the detected schema.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Field {
    /// Column name taken from the header row
    pub(crate) name: String,
    /// Type inferred from the row below the header
    pub(crate) kind: FieldType,
}

/// Ordered fields with unique names.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub(crate) fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Appends a field. A name already in use gets the first free suffix
    /// `_2`, `_3`, ... so that names stay unique.
    pub(crate) fn push(&mut self, name: &str, kind: FieldType) {
        let mut unique = name.to_owned();
        let mut suffix = 2;
        while self.fields.iter().any(|field| field.name == unique) {
            unique = format!("{name}_{suffix}");
            suffix += 1;
        }
        self.fields.push(Field { name: unique, kind });
    }
}

/// A typed value stored in one slot of a row.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Value {
    Boolean(bool),
    Text(String),
    DateTime(DateTime<Utc>),
    Double(f64),
}

/// One converted row, positionally aligned with the schema fields.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TypedRow {
    /// Index of the physical row it came from (0-based)
    pub(crate) row: usize,
    /// Exactly one slot per field, `None` is null
    pub(crate) values: Vec<Option<Value>>,
}
