//! Database access layer.
//!
//! This module provides the dialect-specific plumbing under the
//! [`Database`](crate::Database) facade:
//! - Connection pool construction
//! - Statement execution
//! - Schema introspection
//! - Type mappings and parameter binding

pub mod executor;
pub mod params;
pub mod pool;
pub mod schema;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::DbPool;
pub use schema::SchemaInspector;
