//! Schema-related data models.
//!
//! Reflected table schemas, create-side column declarations, and the SQL
//! type vocabulary used for table creation and bulk-load inference.

use serde::{Deserialize, Serialize};

use super::dataset::ColumnKind;

/// Marker substring for the legacy key-column naming convention.
pub const ID_MARKER: &str = "id_";

/// A reflected column definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Full type as reported by the catalog (e.g., `varchar(255)`, `NUMERIC`)
    pub data_type: String,
    pub nullable: bool,
    /// Default value with appropriate JSON type based on column data type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    pub is_primary_key: bool,
}

impl Column {
    /// Create a new column definition.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            default_value: None,
            is_primary_key: false,
        }
    }

    /// Set whether this is a primary key column.
    pub fn with_primary_key(mut self, is_pk: bool) -> Self {
        self.is_primary_key = is_pk;
        self
    }

    /// Set the default value (as JSON value).
    pub fn with_default(mut self, default_value: serde_json::Value) -> Self {
        self.default_value = Some(default_value);
        self
    }

    /// Set the default value from a string, converting to the appropriate
    /// JSON type based on the column's data_type.
    pub fn with_default_str(mut self, default_str: &str) -> Self {
        self.default_value = Some(parse_default_value(default_str, &self.data_type));
        self
    }
}

/// A reflected table schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<Column>,
    /// Declared primary key columns, in key order.
    pub primary_key: Vec<String>,
}

impl TableSchema {
    /// Create a new table schema.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    /// Add a column definition.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the primary key columns.
    pub fn with_primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key = columns;
        self
    }

    /// Column names in catalog order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Check whether a column with the given name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// The column used for identifier-scoped operations.
    ///
    /// The first declared primary key column wins. Tables without a declared
    /// key fall back to the legacy naming convention: the first column whose
    /// name contains `id_`. Returns `None` when neither applies.
    pub fn key_column(&self) -> Option<&str> {
        if let Some(first) = self.primary_key.first() {
            return Some(first.as_str());
        }
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .find(|name| name.contains(ID_MARKER))
    }
}

/// SQL column types understood by table creation.
///
/// Rendering to dialect-specific DDL happens at statement-build time; this
/// enum is the dialect-neutral vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    BigInt,
    /// Fixed-precision numeric
    Numeric,
    Float,
    Double,
    /// Bounded string
    VarChar(u32),
    /// Unbounded string
    Text,
    Boolean,
    DateTime,
    Date,
    Blob,
}

impl SqlType {
    /// Map a dataset column kind to its SQL type.
    pub fn from_kind(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Integer => Self::Numeric,
            ColumnKind::Float => Self::Float,
            ColumnKind::Text => Self::VarChar(255),
            ColumnKind::DateTime => Self::DateTime,
            ColumnKind::Boolean => Self::Boolean,
            ColumnKind::Categorical => Self::Text,
        }
    }
}

/// A column declaration for table creation.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: SqlType,
    pub primary_key: bool,
}

impl ColumnSpec {
    /// Declare a column with the given name and type.
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            primary_key: false,
        }
    }

    /// Mark this column as part of the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// Parse a default value string into the appropriate JSON type based on the
/// column data type.
///
/// - Integer types (int, bigint, smallint, tinyint) → JSON Number
/// - Float types (float, double, real) → JSON Number
/// - Boolean types → JSON Boolean
/// - JSON/JSONB types → Parsed JSON value
/// - Decimal/numeric → JSON String (preserve precision)
/// - Everything else (strings, expressions) → JSON String
pub fn parse_default_value(default_str: &str, data_type: &str) -> serde_json::Value {
    let dt_lower = data_type.to_lowercase();

    if dt_lower.contains("int") || dt_lower.contains("serial") {
        if let Ok(n) = default_str.parse::<i64>() {
            return serde_json::Value::Number(n.into());
        }
    }

    if (dt_lower.contains("float") || dt_lower.contains("double") || dt_lower == "real")
        && !dt_lower.contains("decimal")
        && !dt_lower.contains("numeric")
    {
        if let Ok(n) = default_str.parse::<f64>() {
            if let Some(num) = serde_json::Number::from_f64(n) {
                return serde_json::Value::Number(num);
            }
        }
    }

    if dt_lower.contains("bool") {
        match default_str.to_lowercase().as_str() {
            "true" | "1" | "t" => return serde_json::Value::Bool(true),
            "false" | "0" | "f" => return serde_json::Value::Bool(false),
            _ => {}
        }
    }

    if dt_lower == "json" || dt_lower == "jsonb" {
        if let Ok(parsed) = serde_json::from_str(default_str) {
            return parsed;
        }
    }

    serde_json::Value::String(default_str.to_string())
}
