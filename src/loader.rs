//! Bulk dataset loading.
//!
//! Ensures a table exists for a dataset's columns, then inserts every row,
//! one statement at a time. The load is best-effort and non-transactional:
//! a failing row is recorded and the loop continues. Callers observe partial
//! failure through the returned [`LoadReport`].

use std::path::Path;

use tracing::{debug, info, warn};

use crate::database::{Database, placeholder, quote_ident, validate_identifier};
use crate::error::{DbError, DbResult};
use crate::models::{ColumnSpec, Dataset, SqlType, Value};

/// Outcome of a bulk load.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Whether the target table was created by this load.
    pub table_created: bool,
    /// Rows inserted successfully.
    pub rows_inserted: u64,
    /// Rows whose insert failed.
    pub rows_failed: u64,
    /// One message per failed row.
    pub failures: Vec<String>,
}

impl LoadReport {
    /// Whether every row landed.
    pub fn is_complete(&self) -> bool {
        self.rows_failed == 0
    }
}

impl Database {
    /// Bulk-load a dataset into a table.
    ///
    /// If the table does not exist it is created with one column per dataset
    /// column, SQL types inferred from the dataset's column kinds. If it
    /// does exist, the dataset is projected onto the table's declared
    /// columns: dataset columns the table lacks are dropped from the
    /// inserts, and table columns the dataset lacks are left to the server
    /// default. An empty projection fails fast.
    pub async fn load_dataset(&self, table: &str, dataset: &Dataset) -> DbResult<LoadReport> {
        validate_identifier(table)?;
        if dataset.column_count() == 0 {
            return Err(DbError::invalid_input("Dataset has no columns"));
        }
        for name in dataset.columns() {
            validate_identifier(name)?;
        }

        let mut report = LoadReport::default();

        // Indices of the dataset columns that take part in the inserts.
        let projection: Vec<usize> = if self.table_exists(table).await? {
            let schema = self.describe(table).await?;
            let mut kept = Vec::new();
            for (idx, name) in dataset.columns().iter().enumerate() {
                if schema.has_column(name) {
                    kept.push(idx);
                } else {
                    debug!(table = %table, column = %name, "Dropping dataset column not in table");
                }
            }
            if kept.is_empty() {
                return Err(DbError::invalid_input(format!(
                    "Dataset shares no columns with table '{}'",
                    table
                )));
            }
            kept
        } else {
            let kinds = dataset.column_kinds();
            let specs: Vec<ColumnSpec> = dataset
                .columns()
                .iter()
                .zip(kinds)
                .map(|(name, kind)| ColumnSpec::new(name, SqlType::from_kind(kind)))
                .collect();
            self.create_table(table, &specs).await?;
            report.table_created = true;
            (0..dataset.column_count()).collect()
        };

        let sql = insert_statement(self, table, dataset, &projection);
        for (row_idx, row) in dataset.rows().iter().enumerate() {
            let params: Vec<Value> = projection.iter().map(|&idx| row[idx].clone()).collect();
            match self.executor().execute(self.pool(), &sql, &params).await {
                Ok(_) => report.rows_inserted += 1,
                Err(e) => {
                    warn!(table = %table, row = row_idx, error = %e, "Row insert failed");
                    report.rows_failed += 1;
                    report.failures.push(format!("row {}: {}", row_idx, e));
                }
            }
        }

        info!(
            table = %table,
            created = report.table_created,
            inserted = report.rows_inserted,
            failed = report.rows_failed,
            "Bulk load finished"
        );
        Ok(report)
    }

    /// Bulk-load a delimited text file (CSV with a header row) into a table.
    pub async fn load_csv(&self, table: &str, path: impl AsRef<Path>) -> DbResult<LoadReport> {
        let dataset = Dataset::from_csv_path(path)?;
        self.load_dataset(table, &dataset).await
    }
}

fn insert_statement(db: &Database, table: &str, dataset: &Dataset, projection: &[usize]) -> String {
    let db_type = db.db_type();
    let columns: Vec<String> = projection
        .iter()
        .map(|&idx| quote_ident(&dataset.columns()[idx], db_type))
        .collect();
    let placeholders: Vec<String> = (0..projection.len())
        .map(|i| placeholder(db_type, i))
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table, db_type),
        columns.join(", "),
        placeholders.join(", ")
    )
}
