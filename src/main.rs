//! tablekit - Main entry point.
//!
//! A small CLI over the library: list and describe tables, run queries and
//! statements, and bulk-load CSV files against one connection URL.

use clap::Parser;
use tablekit::config::{Command, Config};
use tablekit::models::{Dataset, Value};
use tablekit::{Database, DbError, format};
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let config = Config::parse();
    init_tracing(&config);

    if let Err(e) = run(&config).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        if let Some(suggestion) = e.suggestion() {
            eprintln!("Hint: {}", suggestion);
        }
        std::process::exit(1);
    }
}

async fn run(config: &Config) -> Result<(), DbError> {
    let options = tablekit::ConnectOptions::from_url(&config.database)?
        .query_timeout_secs(config.query_timeout as u32);
    let db = Database::connect(options).await?;

    match &config.command {
        Command::Tables => {
            let mut dataset = Dataset::new(["table_name"])?;
            for name in db.table_names().await? {
                dataset.push_row(vec![Value::Text(name)])?;
            }
            println!("{}", format::render(&dataset, config.format));
        }
        Command::Columns { table } => {
            let mut dataset = Dataset::new(["column_name"])?;
            for name in db.columns(table).await? {
                dataset.push_row(vec![Value::Text(name)])?;
            }
            println!("{}", format::render(&dataset, config.format));
        }
        Command::Describe { table } => {
            let schema = db.describe(table).await?;
            let mut dataset =
                Dataset::new(["column_name", "data_type", "nullable", "default", "primary_key"])?;
            for column in &schema.columns {
                dataset.push_row(vec![
                    Value::Text(column.name.clone()),
                    Value::Text(column.data_type.clone()),
                    Value::Bool(column.nullable),
                    column
                        .default_value
                        .clone()
                        .map(Value::Json)
                        .unwrap_or(Value::Null),
                    Value::Bool(column.is_primary_key),
                ])?;
            }
            println!("{}", format::render(&dataset, config.format));
        }
        Command::Query { sql } => {
            let dataset = db.query(sql).await?;
            println!("{}", format::render(&dataset, config.format));
        }
        Command::Exec { sql } => {
            let rows_affected = db.execute(sql).await?;
            println!("{} rows affected", rows_affected);
        }
        Command::Load { table, file } => {
            let report = db.load_csv(table, file).await?;
            if report.table_created {
                println!("Created table '{}'", table);
            }
            println!(
                "Loaded {} rows into '{}' ({} failed)",
                report.rows_inserted, table, report.rows_failed
            );
            for failure in &report.failures {
                eprintln!("  {}", failure);
            }
        }
    }

    db.close().await;
    Ok(())
}
