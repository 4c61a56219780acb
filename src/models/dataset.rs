//! In-memory tabular datasets.
//!
//! `Dataset` is the interchange type for select-all, query results and bulk
//! loading: ordered column names plus rows of typed values. Datasets can be
//! built programmatically or parsed from a delimited text file with a header
//! row, with per-column value kinds sniffed from the fields.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};
use crate::models::value::Value;

/// The inferred (or declared) kind of a dataset column.
///
/// `Categorical` is never inferred; it must be declared explicitly with
/// [`Dataset::set_column_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Boolean,
    Integer,
    Float,
    Text,
    DateTime,
    Categorical,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::DateTime => "datetime",
            Self::Categorical => "categorical",
        };
        write!(f, "{}", name)
    }
}

/// An ordered, typed, in-memory table of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    /// Explicit kind overrides, parallel to `columns`.
    kind_overrides: Vec<Option<ColumnKind>>,
}

impl Dataset {
    /// Create an empty dataset with the given column names.
    ///
    /// Column names must be unique; duplicates are rejected.
    pub fn new<I, S>(columns: I) -> DbResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(DbError::invalid_input(format!(
                    "Duplicate column name '{}' in dataset",
                    name
                )));
            }
        }
        let kind_overrides = vec![None; columns.len()];
        Ok(Self {
            columns,
            rows: Vec::new(),
            kind_overrides,
        })
    }

    /// Append a row. The row length must match the column count.
    pub fn push_row<I>(&mut self, row: I) -> DbResult<()>
    where
        I: IntoIterator<Item = Value>,
    {
        let row: Vec<Value> = row.into_iter().collect();
        if row.len() != self.columns.len() {
            return Err(DbError::invalid_input(format!(
                "Row has {} values but the dataset has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at (row, column name), if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Declare a column's kind explicitly, overriding inference.
    ///
    /// This is how a column is marked categorical.
    pub fn set_column_kind(&mut self, column: &str, kind: ColumnKind) -> DbResult<()> {
        let idx = self.column_index(column).ok_or_else(|| {
            DbError::invalid_input(format!("Dataset has no column named '{}'", column))
        })?;
        self.kind_overrides[idx] = Some(kind);
        Ok(())
    }

    /// The effective kind of every column: the explicit override when set,
    /// otherwise inferred from the column's values.
    ///
    /// Inference rules: all-null (or empty) columns are text; integer and
    /// float values combine to float; any other mix degrades to text.
    pub fn column_kinds(&self) -> Vec<ColumnKind> {
        (0..self.columns.len())
            .map(|idx| match self.kind_overrides[idx] {
                Some(kind) => kind,
                None => self.infer_kind(idx),
            })
            .collect()
    }

    fn infer_kind(&self, idx: usize) -> ColumnKind {
        let mut inferred: Option<ColumnKind> = None;
        for row in &self.rows {
            let Some(kind) = value_kind(&row[idx]) else {
                continue;
            };
            inferred = Some(match inferred {
                None => kind,
                Some(current) if current == kind => current,
                Some(ColumnKind::Integer) if kind == ColumnKind::Float => ColumnKind::Float,
                Some(ColumnKind::Float) if kind == ColumnKind::Integer => ColumnKind::Float,
                Some(_) => ColumnKind::Text,
            });
        }
        inferred.unwrap_or(ColumnKind::Text)
    }

    /// Parse a delimited text file (CSV with a header row) into a dataset.
    pub fn from_csv_path(path: impl AsRef<Path>) -> DbResult<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path.as_ref())?;
        Self::from_csv(reader)
    }

    /// Parse CSV from any reader into a dataset.
    pub fn from_csv_reader<R: Read>(reader: R) -> DbResult<Self> {
        let reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> DbResult<Self> {
        let headers = reader.headers()?.clone();
        let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
        if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
            return Err(DbError::invalid_input("CSV input has no header row"));
        }

        let mut dataset = Self::new(columns)?;
        for record in reader.records() {
            let record = record?;
            let row: Vec<Value> = record.iter().map(sniff_field).collect();
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }
}

/// The kind a single value contributes to column inference. Nulls contribute
/// nothing.
fn value_kind(value: &Value) -> Option<ColumnKind> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(ColumnKind::Boolean),
        Value::Int(_) => Some(ColumnKind::Integer),
        Value::Float(_) => Some(ColumnKind::Float),
        Value::DateTime(_) => Some(ColumnKind::DateTime),
        Value::Text(_) | Value::Bytes(_) | Value::Json(_) => Some(ColumnKind::Text),
    }
}

/// Sniff a CSV field into a typed value.
///
/// Empty fields are NULL. Otherwise boolean, integer, float and datetime
/// forms are tried in that order, falling back to text.
fn sniff_field(field: &str) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match trimmed.to_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return Value::Float(f);
    }
    if let Some(dt) = parse_datetime_field(trimmed) {
        return Value::DateTime(dt);
    }
    Value::Text(field.to_string())
}

fn parse_datetime_field(field: &str) -> Option<NaiveDateTime> {
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(field, format) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(field, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> Dataset {
        let mut dataset = Dataset::new(["id_user", "name", "score"]).unwrap();
        dataset
            .push_row(vec![Value::Int(1), Value::from("Ana"), Value::Float(9.5)])
            .unwrap();
        dataset
            .push_row(vec![Value::Int(2), Value::from("Bruno"), Value::Float(7.0)])
            .unwrap();
        dataset
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = Dataset::new(["a", "b", "a"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_push_row_arity_checked() {
        let mut dataset = Dataset::new(["a", "b"]).unwrap();
        let err = dataset.push_row(vec![Value::Int(1)]).unwrap_err();
        assert!(err.to_string().contains("2 columns"));
    }

    #[test]
    fn test_value_accessor() {
        let dataset = sample();
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(
            dataset.value(1, "name"),
            Some(&Value::Text("Bruno".to_string()))
        );
        assert_eq!(dataset.value(0, "missing"), None);
    }

    #[test]
    fn test_kind_inference() {
        let dataset = sample();
        assert_eq!(
            dataset.column_kinds(),
            vec![ColumnKind::Integer, ColumnKind::Text, ColumnKind::Float]
        );
    }

    #[test]
    fn test_kind_inference_promotes_int_to_float() {
        let mut dataset = Dataset::new(["x"]).unwrap();
        dataset.push_row(vec![Value::Int(1)]).unwrap();
        dataset.push_row(vec![Value::Float(2.5)]).unwrap();
        assert_eq!(dataset.column_kinds(), vec![ColumnKind::Float]);
    }

    #[test]
    fn test_kind_inference_mixed_degrades_to_text() {
        let mut dataset = Dataset::new(["x"]).unwrap();
        dataset.push_row(vec![Value::Int(1)]).unwrap();
        dataset.push_row(vec![Value::Bool(true)]).unwrap();
        assert_eq!(dataset.column_kinds(), vec![ColumnKind::Text]);
    }

    #[test]
    fn test_kind_inference_all_null_is_text() {
        let mut dataset = Dataset::new(["x"]).unwrap();
        dataset.push_row(vec![Value::Null]).unwrap();
        assert_eq!(dataset.column_kinds(), vec![ColumnKind::Text]);
    }

    #[test]
    fn test_categorical_requires_explicit_declaration() {
        let mut dataset = sample();
        dataset
            .set_column_kind("name", ColumnKind::Categorical)
            .unwrap();
        assert_eq!(dataset.column_kinds()[1], ColumnKind::Categorical);

        let err = dataset
            .set_column_kind("missing", ColumnKind::Categorical)
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_csv_sniffing() {
        let input = "id_user, name ,score,active,joined\n\
                     1,Ana,9.5,true,2024-05-01 12:30:00\n\
                     2,Bruno,,false,2024-06-02\n";
        let dataset = Dataset::from_csv_reader(Cursor::new(input)).unwrap();

        assert_eq!(dataset.columns(), &["id_user", "name", "score", "active", "joined"]);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.value(0, "id_user"), Some(&Value::Int(1)));
        assert_eq!(dataset.value(0, "score"), Some(&Value::Float(9.5)));
        assert_eq!(dataset.value(0, "active"), Some(&Value::Bool(true)));
        // Empty field is NULL.
        assert_eq!(dataset.value(1, "score"), Some(&Value::Null));
        // Bare dates land at midnight.
        let joined = dataset.value(1, "joined").unwrap();
        match joined {
            Value::DateTime(dt) => {
                assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-06-02 00:00:00");
            }
            other => panic!("expected datetime, got {:?}", other),
        }
    }

    #[test]
    fn test_csv_ragged_row_rejected() {
        let input = "a,b\n1,2\n3\n";
        let err = Dataset::from_csv_reader(Cursor::new(input)).unwrap_err();
        assert!(matches!(err, DbError::Csv { .. }));
    }

    #[test]
    fn test_csv_numeric_text_stays_typed() {
        let input = "code,label\n007,agent\n12,plain\n";
        let dataset = Dataset::from_csv_reader(Cursor::new(input)).unwrap();
        // Leading zeros still parse as integers; that is the sniffing contract.
        assert_eq!(dataset.value(0, "code"), Some(&Value::Int(7)));
        assert_eq!(
            dataset.value(0, "label"),
            Some(&Value::Text("agent".to_string()))
        );
    }
}
