//! The `Database` facade.
//!
//! One handle per connection: construct from [`ConnectOptions`] or a URL,
//! then reflect tables, run per-table CRUD keyed by the table's key column,
//! and run raw SQL. Generated statements interpolate only validated, quoted
//! identifiers; all values go through bind parameters.

use std::time::Duration;

use tracing::{debug, info};

use crate::db::{DbPool, QueryExecutor, SchemaInspector};
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnSpec, ConnectOptions, Dataset, DatabaseType, TableSchema, Value, mask_url,
};

/// A connection to one database.
#[derive(Debug)]
pub struct Database {
    pool: DbPool,
    executor: QueryExecutor,
}

impl Database {
    /// Open a connection from the given options.
    ///
    /// The pool establishes at least one connection, so construction fails
    /// fast on bad credentials or an unreachable server.
    pub async fn connect(options: ConnectOptions) -> DbResult<Self> {
        let db_type = options.effective_db_type()?;
        let url = options.connection_url()?;

        info!(db_type = %db_type, url = %mask_url(&url), "Connecting");
        let pool = DbPool::create(db_type, &url, &options.pool_options).await?;

        if let Some(version) = pool.server_version().await {
            debug!(db_type = %db_type, version = %version, "Connected");
        }

        let executor = match options.query_timeout_secs {
            Some(secs) => QueryExecutor::with_timeout(Duration::from_secs(secs as u64)),
            None => QueryExecutor::new(),
        };

        Ok(Self { pool, executor })
    }

    /// Open a connection from a precomposed URL.
    pub async fn connect_url(url: impl Into<String>) -> DbResult<Self> {
        Self::connect(ConnectOptions::from_url(url)?).await
    }

    /// The dialect this handle is connected to.
    pub fn db_type(&self) -> DatabaseType {
        self.pool.db_type()
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub(crate) fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    /// The reported server version, if the server answers.
    pub async fn server_version(&self) -> Option<String> {
        self.pool.server_version().await
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // =========================================================================
    // Reflection
    // =========================================================================

    /// Live list of base-table names.
    pub async fn table_names(&self) -> DbResult<Vec<String>> {
        SchemaInspector::list_tables(&self.pool).await
    }

    /// Whether a base table with the given name exists right now.
    pub async fn table_exists(&self, table: &str) -> DbResult<bool> {
        validate_identifier(table)?;
        SchemaInspector::table_exists(&self.pool, table).await
    }

    /// Reflect a table's schema from the live catalog.
    pub async fn describe(&self, table: &str) -> DbResult<TableSchema> {
        validate_identifier(table)?;
        SchemaInspector::describe_table(&self.pool, table).await
    }

    /// Reflected column names of a table, in catalog order.
    pub async fn columns(&self, table: &str) -> DbResult<Vec<String>> {
        let schema = self.describe(table).await?;
        Ok(schema.columns.into_iter().map(|c| c.name).collect())
    }

    // =========================================================================
    // DDL
    // =========================================================================

    /// Create a table from declared columns.
    ///
    /// Columns flagged as primary key form a table-level `PRIMARY KEY`
    /// constraint. Creating a table that already exists fails with
    /// [`DbError::TableExists`].
    pub async fn create_table(&self, table: &str, columns: &[ColumnSpec]) -> DbResult<()> {
        validate_identifier(table)?;
        if columns.is_empty() {
            return Err(DbError::invalid_input(
                "Cannot create a table with no columns",
            ));
        }
        for spec in columns {
            validate_identifier(&spec.name)?;
        }
        if self.table_exists(table).await? {
            return Err(DbError::table_exists(table));
        }

        let db_type = self.db_type();
        let mut defs: Vec<String> = columns
            .iter()
            .map(|spec| {
                format!(
                    "{} {}",
                    quote_ident(&spec.name, db_type),
                    crate::db::types::ddl_type(spec.sql_type, db_type)
                )
            })
            .collect();

        let key_columns: Vec<String> = columns
            .iter()
            .filter(|spec| spec.primary_key)
            .map(|spec| quote_ident(&spec.name, db_type))
            .collect();
        if !key_columns.is_empty() {
            defs.push(format!("PRIMARY KEY ({})", key_columns.join(", ")));
        }

        let sql = format!(
            "CREATE TABLE {} ({})",
            quote_ident(table, db_type),
            defs.join(", ")
        );
        info!(table = %table, columns = columns.len(), "Creating table");
        self.executor.execute(&self.pool, &sql, &[]).await?;
        Ok(())
    }

    /// Drop a table. A missing table fails with [`DbError::TableNotFound`].
    pub async fn drop_table(&self, table: &str) -> DbResult<()> {
        validate_identifier(table)?;
        if !self.table_exists(table).await? {
            return Err(DbError::table_not_found(table));
        }

        let sql = format!("DROP TABLE {}", quote_ident(table, self.db_type()));
        info!(table = %table, "Dropping table");
        self.executor.execute(&self.pool, &sql, &[]).await?;
        Ok(())
    }

    // =========================================================================
    // Row operations
    // =========================================================================

    /// Select every row of a table as a dataset.
    pub async fn select_all(&self, table: &str) -> DbResult<Dataset> {
        validate_identifier(table)?;
        let sql = format!("SELECT * FROM {}", quote_ident(table, self.db_type()));
        self.executor.fetch(&self.pool, &sql, &[]).await
    }

    /// Insert one row of column:value pairs. Returns rows affected.
    pub async fn insert(&self, table: &str, values: &[(&str, Value)]) -> DbResult<u64> {
        validate_identifier(table)?;
        if values.is_empty() {
            return Err(DbError::invalid_input("Cannot insert an empty row"));
        }
        for (name, _) in values {
            validate_identifier(name)?;
        }

        let db_type = self.db_type();
        let columns: Vec<String> = values
            .iter()
            .map(|(name, _)| quote_ident(name, db_type))
            .collect();
        let placeholders: Vec<String> = (0..values.len())
            .map(|i| placeholder(db_type, i))
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table, db_type),
            columns.join(", "),
            placeholders.join(", ")
        );
        let params: Vec<Value> = values.iter().map(|(_, value)| value.clone()).collect();

        self.executor.execute(&self.pool, &sql, &params).await
    }

    /// The column identifier-scoped operations key on: the first declared
    /// primary key column, or, for keyless tables, the first column whose
    /// name contains `id_`.
    pub async fn key_column(&self, table: &str) -> DbResult<String> {
        let schema = self.describe(table).await?;
        match schema.key_column() {
            Some(column) => Ok(column.to_string()),
            None => Err(DbError::missing_key_column(
                table,
                "no declared primary key and no column name contains 'id_'",
            )),
        }
    }

    /// Update the targeted columns of the row(s) whose key column equals
    /// `id`. Returns rows affected; zero means nothing matched.
    pub async fn update_by_id(
        &self,
        table: &str,
        id: Value,
        values: &[(&str, Value)],
    ) -> DbResult<u64> {
        if values.is_empty() {
            return Err(DbError::invalid_input("Cannot update with no columns"));
        }
        for (name, _) in values {
            validate_identifier(name)?;
        }
        let key = self.key_column(table).await?;

        let db_type = self.db_type();
        let assignments: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, (name, _))| {
                format!("{} = {}", quote_ident(name, db_type), placeholder(db_type, i))
            })
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            quote_ident(table, db_type),
            assignments.join(", "),
            quote_ident(&key, db_type),
            placeholder(db_type, values.len())
        );

        let mut params: Vec<Value> = values.iter().map(|(_, value)| value.clone()).collect();
        params.push(id);

        debug!(table = %table, key = %key, columns = values.len(), "Updating by id");
        self.executor.execute(&self.pool, &sql, &params).await
    }

    /// Delete the row(s) whose key column equals `id`. Returns rows affected.
    pub async fn delete_by_id(&self, table: &str, id: Value) -> DbResult<u64> {
        let key = self.key_column(table).await?;

        let db_type = self.db_type();
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            quote_ident(table, db_type),
            quote_ident(&key, db_type),
            placeholder(db_type, 0)
        );

        debug!(table = %table, key = %key, "Deleting by id");
        self.executor.execute(&self.pool, &sql, &[id]).await
    }

    // =========================================================================
    // Raw SQL
    // =========================================================================

    /// Run a raw statement without a result set. Returns rows affected.
    pub async fn execute(&self, sql: &str) -> DbResult<u64> {
        self.executor.execute(&self.pool, sql, &[]).await
    }

    /// Run a raw query and return the full result set as a dataset.
    pub async fn query(&self, sql: &str) -> DbResult<Dataset> {
        self.executor.fetch(&self.pool, sql, &[]).await
    }
}

/// Reject names that cannot be safely interpolated into generated SQL.
pub(crate) fn validate_identifier(name: &str) -> DbResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DbError::invalid_input(format!(
            "Invalid identifier '{}': expected [A-Za-z_][A-Za-z0-9_]*",
            name
        )))
    }
}

/// Quote an already-validated identifier for the given dialect.
pub(crate) fn quote_ident(name: &str, db_type: DatabaseType) -> String {
    match db_type {
        DatabaseType::MySQL => format!("`{}`", name),
        DatabaseType::PostgreSQL | DatabaseType::SQLite => format!("\"{}\"", name),
    }
}

/// The bind placeholder for the i-th (zero-based) parameter.
pub(crate) fn placeholder(db_type: DatabaseType, index: usize) -> String {
    match db_type {
        DatabaseType::PostgreSQL => format!("${}", index + 1),
        DatabaseType::MySQL | DatabaseType::SQLite => "?".to_string(),
    }
}
