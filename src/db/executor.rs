//! Statement execution engine.
//!
//! This module runs generated and raw SQL against a [`DbPool`]:
//! - `fetch` returns the whole result set as a [`Dataset`]
//! - `execute` runs a statement and returns rows affected
//!
//! Every statement runs under a timeout so a hung server surfaces as a typed
//! error instead of an indefinite block.
//!
//! # Architecture
//!
//! Database-specific implementations live in submodules (mysql, postgres,
//! sqlite), each providing the same interface adapted to the database's type
//! system. When no parameters are supplied the SQL is executed raw, without a
//! prepared statement; some DDL does not support prepared statements.

use crate::db::pool::DbPool;
use crate::db::types::RowToValues;
use crate::error::{DbError, DbResult};
use crate::models::{Dataset, Value};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::config::DEFAULT_QUERY_TIMEOUT_SECS;

/// Statement executor with a per-statement timeout.
#[derive(Debug)]
pub struct QueryExecutor {
    default_timeout: Duration,
}

impl QueryExecutor {
    /// Create a new executor with the default timeout.
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }

    /// Create a new executor with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            default_timeout: timeout,
        }
    }

    /// Run a query and collect the full result set into a dataset.
    pub async fn fetch(&self, pool: &DbPool, sql: &str, params: &[Value]) -> DbResult<Dataset> {
        debug!(
            sql = %sql,
            params = params.len(),
            timeout_secs = self.default_timeout.as_secs(),
            "Fetching rows"
        );

        match pool {
            DbPool::MySql(p) => {
                let rows = mysql::fetch_rows(p, sql, params, self.default_timeout).await?;
                rows_to_dataset(&rows)
            }
            DbPool::Postgres(p) => {
                let rows = postgres::fetch_rows(p, sql, params, self.default_timeout).await?;
                rows_to_dataset(&rows)
            }
            DbPool::SQLite(p) => {
                let rows = sqlite::fetch_rows(p, sql, params, self.default_timeout).await?;
                rows_to_dataset(&rows)
            }
        }
    }

    /// Run a statement without a result set and return rows affected.
    pub async fn execute(&self, pool: &DbPool, sql: &str, params: &[Value]) -> DbResult<u64> {
        debug!(
            sql = %sql,
            params = params.len(),
            timeout_secs = self.default_timeout.as_secs(),
            "Executing statement"
        );

        match pool {
            DbPool::MySql(p) => mysql::execute(p, sql, params, self.default_timeout).await,
            DbPool::Postgres(p) => postgres::execute(p, sql, params, self.default_timeout).await,
            DbPool::SQLite(p) => sqlite::execute(p, sql, params, self.default_timeout).await,
        }
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode rows from any database type into a dataset.
fn rows_to_dataset<R: RowToValues>(rows: &[R]) -> DbResult<Dataset> {
    let Some(first) = rows.first() else {
        return Dataset::new(Vec::<String>::new());
    };

    let mut dataset = Dataset::new(first.column_names())?;
    for row in rows {
        dataset.push_row(row.to_values())?;
    }
    Ok(dataset)
}

fn timeout_error(operation: &str, timeout: Duration) -> DbError {
    DbError::timeout(operation, timeout.as_secs() as u32)
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.
// The code structure is intentionally parallel to make differences obvious.

mod mysql {
    use super::*;
    use crate::db::params::bind_mysql_value;
    use sqlx::MySqlPool;
    use sqlx::mysql::MySqlRow;

    pub async fn fetch_rows(
        pool: &MySqlPool,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<Vec<MySqlRow>> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(query_timeout, pool.fetch_all(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_mysql_value(query, param);
            }
            timeout(query_timeout, query.fetch_all(pool)).await
        };

        match result {
            Ok(rows) => rows.map_err(DbError::from),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute(
        pool: &MySqlPool,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<u64> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(query_timeout, pool.execute(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_mysql_value(query, param);
            }
            timeout(query_timeout, query.execute(pool)).await
        };

        match result {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("statement execution", query_timeout)),
        }
    }
}

mod postgres {
    use super::*;
    use crate::db::params::bind_postgres_value;
    use sqlx::PgPool;
    use sqlx::postgres::PgRow;

    pub async fn fetch_rows(
        pool: &PgPool,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<Vec<PgRow>> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(query_timeout, pool.fetch_all(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_postgres_value(query, param);
            }
            timeout(query_timeout, query.fetch_all(pool)).await
        };

        match result {
            Ok(rows) => rows.map_err(DbError::from),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute(
        pool: &PgPool,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<u64> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(query_timeout, pool.execute(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_postgres_value(query, param);
            }
            timeout(query_timeout, query.execute(pool)).await
        };

        match result {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("statement execution", query_timeout)),
        }
    }
}

mod sqlite {
    use super::*;
    use crate::db::params::bind_sqlite_value;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqliteRow;

    pub async fn fetch_rows(
        pool: &SqlitePool,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<Vec<SqliteRow>> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(query_timeout, pool.fetch_all(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_sqlite_value(query, param);
            }
            timeout(query_timeout, query.fetch_all(pool)).await
        };

        match result {
            Ok(rows) => rows.map_err(DbError::from),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute(
        pool: &SqlitePool,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<u64> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(query_timeout, pool.execute(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_sqlite_value(query, param);
            }
            timeout(query_timeout, query.execute(pool)).await
        };

        match result {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("statement execution", query_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_defaults() {
        let executor = QueryExecutor::new();
        assert_eq!(
            executor.default_timeout,
            Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_executor_custom_timeout() {
        let executor = QueryExecutor::with_timeout(Duration::from_secs(60));
        assert_eq!(executor.default_timeout, Duration::from_secs(60));
    }
}
