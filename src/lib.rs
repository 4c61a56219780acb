//! tablekit
//!
//! A table-level convenience layer over sqlx: open a connection to SQLite,
//! MySQL or PostgreSQL, reflect live schema, run per-table CRUD keyed by a
//! table's key column, bulk-load datasets and CSV files, and run raw SQL.
//!
//! ```no_run
//! use tablekit::{ColumnSpec, Database, SqlType, Value};
//!
//! # async fn demo() -> tablekit::DbResult<()> {
//! let db = Database::connect_url("sqlite:app.db").await?;
//! db.create_table(
//!     "users",
//!     &[
//!         ColumnSpec::new("id_user", SqlType::Integer).primary_key(),
//!         ColumnSpec::new("name", SqlType::VarChar(255)),
//!     ],
//! )
//! .await?;
//! db.insert("users", &[("id_user", Value::Int(1)), ("name", "Ana".into())])
//!     .await?;
//! let rows = db.select_all("users").await?;
//! assert_eq!(rows.row_count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod db;
pub mod error;
pub mod format;
pub mod loader;
pub mod models;

pub use config::PoolOptions;
pub use database::Database;
pub use error::{DbError, DbResult};
pub use format::OutputFormat;
pub use loader::LoadReport;
pub use models::{
    Column, ColumnKind, ColumnSpec, ConnectOptions, Dataset, DatabaseType, SqlType, TableSchema,
    Value,
};
