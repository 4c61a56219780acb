//! Output formatting for datasets.
//!
//! Shared by the CLI subcommands that print tabular results: ASCII table
//! (like the MySQL CLI), Markdown table, and JSON.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use unicode_width::UnicodeWidthStr;

use crate::models::Dataset;

/// Output format for tabular results.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ASCII table format (like MySQL CLI)
    #[default]
    Table,
    /// Markdown table format
    Markdown,
    /// JSON array of row objects
    Json,
}

/// Render a dataset in the requested format.
pub fn render(dataset: &Dataset, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_as_table(dataset),
        OutputFormat::Markdown => format_as_markdown(dataset),
        OutputFormat::Json => format_as_json(dataset),
    }
}

fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(arr) => serde_json::to_string(arr).unwrap_or_default(),
        JsonValue::Object(obj) => serde_json::to_string(obj).unwrap_or_default(),
    }
}

pub fn format_as_table(dataset: &Dataset) -> String {
    let columns = dataset.columns();
    if columns.is_empty() {
        return "Empty set".to_string();
    }

    let json_rows: Vec<Vec<JsonValue>> = dataset
        .rows()
        .iter()
        .map(|row| row.iter().map(|v| v.to_json()).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.width()).collect();
    for row in &json_rows {
        for (i, value) in row.iter().enumerate() {
            widths[i] = widths[i].max(format_value(value).width());
        }
    }

    let mut output = String::new();
    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("| {:^width$} ", col, width = w))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);
    output.push_str(&separator);

    for row in &json_rows {
        let row_str: String = row
            .iter()
            .zip(&widths)
            .map(|(value, w)| {
                let formatted = format_value(value);
                if matches!(value, JsonValue::Number(_)) {
                    format!("| {:>width$} ", formatted, width = w)
                } else {
                    format!("| {:<width$} ", formatted, width = w)
                }
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&separator);

    let row_count = dataset.row_count();
    let row_text = if row_count == 1 { "row" } else { "rows" };
    output.push_str(&format!("{} {} in set\n", row_count, row_text));

    output
}

pub fn format_as_markdown(dataset: &Dataset) -> String {
    let columns = dataset.columns();
    if columns.is_empty() {
        return "*Empty set*".to_string();
    }

    let mut output = String::new();

    let header: String = columns
        .iter()
        .map(|c| format!("| {} ", c))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);

    let sep: String = columns.iter().map(|_| "|---").collect::<String>() + "|\n";
    output.push_str(&sep);

    for row in dataset.rows() {
        let row_str: String = row
            .iter()
            .map(|value| format!("| {} ", format_value(&value.to_json())))
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&format!("\n*{} rows*", dataset.row_count()));

    output
}

pub fn format_as_json(dataset: &Dataset) -> String {
    let rows: Vec<serde_json::Map<String, JsonValue>> = dataset
        .rows()
        .iter()
        .map(|row| {
            dataset
                .columns()
                .iter()
                .zip(row)
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect()
        })
        .collect();
    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    fn sample() -> Dataset {
        let mut dataset = Dataset::new(["id_user", "name"]).unwrap();
        dataset
            .push_row(vec![Value::Int(1), Value::from("Ana")])
            .unwrap();
        dataset
            .push_row(vec![Value::Int(2), Value::Null])
            .unwrap();
        dataset
    }

    #[test]
    fn test_table_format() {
        let output = format_as_table(&sample());
        assert!(output.contains("| id_user |"));
        assert!(output.contains("Ana"));
        assert!(output.contains("NULL"));
        assert!(output.contains("2 rows in set"));
    }

    #[test]
    fn test_table_format_empty() {
        let dataset = Dataset::new(Vec::<String>::new()).unwrap();
        assert_eq!(format_as_table(&dataset), "Empty set");
    }

    #[test]
    fn test_markdown_format() {
        let output = format_as_markdown(&sample());
        assert!(output.starts_with("| id_user | name |"));
        assert!(output.contains("|---|---|"));
        assert!(output.ends_with("*2 rows*"));
    }

    #[test]
    fn test_json_format() {
        let output = format_as_json(&sample());
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["name"], "Ana");
        assert_eq!(parsed[1]["name"], serde_json::Value::Null);
    }
}
