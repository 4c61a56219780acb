//! Data models for tablekit.
//!
//! This module re-exports all model types used throughout the crate.

pub mod connection;
pub mod dataset;
pub mod schema;
pub mod value;

// Re-export commonly used types
pub use connection::{ConnectOptions, DatabaseType, mask_url};
pub use dataset::{ColumnKind, Dataset};
pub use schema::{Column, ColumnSpec, ID_MARKER, SqlType, TableSchema};
pub use value::Value;
