//! Descriptors for schema objects and the mutation surface migrations are
//! written against.

use crate::error::SchemaError;

/// Column types allowed in a STRICT table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Real,
    Text,
    Blob,
    Any,
}

/// Default value for a new column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    Int(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for FieldDefault {
    fn from(value: i64) -> Self {
        FieldDefault::Int(value)
    }
}

impl From<f64> for FieldDefault {
    fn from(value: f64) -> Self {
        FieldDefault::Real(value)
    }
}

impl From<&str> for FieldDefault {
    fn from(value: &str) -> Self {
        FieldDefault::Text(value.to_owned())
    }
}

impl From<String> for FieldDefault {
    fn from(value: String) -> Self {
        FieldDefault::Text(value)
    }
}

/// Description of a single column.
///
/// New fields are nullable with no default; note that SQLite rejects adding
/// a `NOT NULL` column without a default to a table that already has rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub typ: FieldType,
    pub nullable: bool,
    pub default: Option<FieldDefault>,
}

impl Field {
    pub fn new(name: impl Into<String>, typ: FieldType) -> Self {
        Self {
            name: name.into(),
            typ,
            nullable: true,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_to(mut self, value: impl Into<FieldDefault>) -> Self {
        self.default = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyKind {
    Primary,
    Unique,
    /// References `table (columns)`.
    Foreign { table: String, columns: Vec<String> },
}

/// A named table constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub name: String,
    pub columns: Vec<String>,
    pub kind: KeyKind,
}

impl Key {
    pub fn unique(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            kind: KeyKind::Unique,
        }
    }

    pub fn primary(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            kind: KeyKind::Primary,
        }
    }

    pub fn foreign(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
        references: impl Into<String>,
        referenced: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            kind: KeyKind::Foreign {
                table: references.into(),
                columns: referenced.into_iter().map(Into::into).collect(),
            },
        }
    }
}

/// A named index.
///
/// Column order matters for performance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl Index {
    pub fn new(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// The schema-mutation surface migrations are written against.
///
/// Operations are raw: dropping a missing table or column is an error. The
/// existence checks are separate so that every step can guard its own
/// mutations and stay safe to re-run after a partial failure.
pub trait SchemaEdit {
    fn table_exists(&self, table: &str) -> Result<bool, SchemaError>;
    fn field_exists(&self, table: &str, field: &str) -> Result<bool, SchemaError>;
    fn index_exists(&self, table: &str, index: &str) -> Result<bool, SchemaError>;

    fn add_field(&mut self, table: &str, field: &Field) -> Result<(), SchemaError>;
    fn drop_field(&mut self, table: &str, field: &str) -> Result<(), SchemaError>;
    fn drop_table(&mut self, table: &str) -> Result<(), SchemaError>;
    fn add_key(&mut self, table: &str, key: &Key) -> Result<(), SchemaError>;
    fn add_index(&mut self, table: &str, index: &Index) -> Result<(), SchemaError>;
}
