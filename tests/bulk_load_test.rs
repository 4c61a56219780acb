//! Integration tests for bulk dataset loading: table auto-creation from
//! inferred column kinds, projection onto existing tables, and best-effort
//! per-row failure handling.

use tablekit::{ColumnKind, ColumnSpec, Database, DbError, Dataset, SqlType, Value};
use tempfile::NamedTempFile;

async fn setup_db() -> Database {
    let temp_file = NamedTempFile::new().unwrap();
    // Keep the temp file alive - prevent deletion when function returns
    let db_path = temp_file
        .into_temp_path()
        .keep()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    Database::connect_url(format!("sqlite:{}", db_path))
        .await
        .unwrap()
}

fn user_dataset() -> Dataset {
    let mut dataset = Dataset::new(["id_user", "name", "score"]).unwrap();
    dataset
        .push_row(vec![Value::Int(1), "Ana".into(), Value::Float(9.5)])
        .unwrap();
    dataset
        .push_row(vec![Value::Int(2), "Bruno".into(), Value::Float(7.25)])
        .unwrap();
    dataset
}

#[tokio::test]
async fn test_load_into_missing_table_creates_it() {
    let db = setup_db().await;

    let report = db.load_dataset("users", &user_dataset()).await.unwrap();
    assert!(report.table_created);
    assert_eq!(report.rows_inserted, 2);
    assert_eq!(report.rows_failed, 0);
    assert!(report.is_complete());

    let schema = db.describe("users").await.unwrap();
    assert_eq!(schema.column_names(), vec!["id_user", "name", "score"]);

    let rows = db.select_all("users").await.unwrap();
    assert_eq!(rows.row_count(), 2);
    assert_eq!(rows.value(0, "id_user"), Some(&Value::Int(1)));
    assert_eq!(rows.value(1, "score"), Some(&Value::Float(7.25)));
}

#[tokio::test]
async fn test_inferred_column_types() {
    let db = setup_db().await;
    db.load_dataset("users", &user_dataset()).await.unwrap();

    let schema = db.describe("users").await.unwrap();
    let data_type = |name: &str| {
        schema
            .columns
            .iter()
            .find(|c| c.name == name)
            .unwrap()
            .data_type
            .clone()
    };
    // Integer columns land as NUMERIC so wider values still fit.
    assert_eq!(data_type("id_user"), "NUMERIC");
    assert_eq!(data_type("name"), "VARCHAR(255)");
    assert_eq!(data_type("score"), "FLOAT");
}

#[tokio::test]
async fn test_declared_categorical_column_becomes_text() {
    let db = setup_db().await;
    let mut dataset = Dataset::new(["id_item", "tier"]).unwrap();
    dataset
        .push_row(vec![Value::Int(1), "gold".into()])
        .unwrap();
    dataset
        .set_column_kind("tier", ColumnKind::Categorical)
        .unwrap();

    db.load_dataset("items", &dataset).await.unwrap();

    let schema = db.describe("items").await.unwrap();
    let tier = schema.columns.iter().find(|c| c.name == "tier").unwrap();
    assert_eq!(tier.data_type, "TEXT");
}

#[tokio::test]
async fn test_load_into_existing_table_projects_columns() {
    let db = setup_db().await;
    db.create_table(
        "users",
        &[
            ColumnSpec::new("id_user", SqlType::Integer).primary_key(),
            ColumnSpec::new("name", SqlType::VarChar(255)),
        ],
    )
    .await
    .unwrap();

    // Dataset carries a column the table lacks; it is dropped from inserts.
    let mut dataset = Dataset::new(["id_user", "name", "extra"]).unwrap();
    dataset
        .push_row(vec![Value::Int(1), "Ana".into(), "ignored".into()])
        .unwrap();

    let report = db.load_dataset("users", &dataset).await.unwrap();
    assert!(!report.table_created);
    assert_eq!(report.rows_inserted, 1);

    let rows = db.select_all("users").await.unwrap();
    assert_eq!(rows.columns(), &["id_user", "name"]);
    assert_eq!(rows.value(0, "name"), Some(&Value::Text("Ana".to_string())));
}

#[tokio::test]
async fn test_load_with_no_shared_columns_fails() {
    let db = setup_db().await;
    db.create_table("users", &[ColumnSpec::new("id_user", SqlType::Integer)])
        .await
        .unwrap();

    let mut dataset = Dataset::new(["unrelated"]).unwrap();
    dataset.push_row(vec![Value::Int(1)]).unwrap();

    let err = db.load_dataset("users", &dataset).await.unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_load_empty_dataset_fails() {
    let db = setup_db().await;
    let dataset = Dataset::new(Vec::<String>::new()).unwrap();
    let err = db.load_dataset("users", &dataset).await.unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_failing_rows_are_recorded_and_skipped() {
    let db = setup_db().await;
    db.execute("CREATE TABLE items (id_item INTEGER NOT NULL, label TEXT)")
        .await
        .unwrap();

    let mut dataset = Dataset::new(["id_item", "label"]).unwrap();
    dataset
        .push_row(vec![Value::Int(1), "first".into()])
        .unwrap();
    // NULL into a NOT NULL column fails this row only.
    dataset.push_row(vec![Value::Null, "broken".into()]).unwrap();
    dataset
        .push_row(vec![Value::Int(3), "third".into()])
        .unwrap();

    let report = db.load_dataset("items", &dataset).await.unwrap();
    assert_eq!(report.rows_inserted, 2);
    assert_eq!(report.rows_failed, 1);
    assert!(!report.is_complete());
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].starts_with("row 1:"));

    let rows = db.select_all("items").await.unwrap();
    assert_eq!(rows.row_count(), 2);
}

#[tokio::test]
async fn test_loaded_nulls_survive_readback() {
    let db = setup_db().await;
    let mut dataset = Dataset::new(["id_reading", "measured"]).unwrap();
    dataset
        .push_row(vec![Value::Int(1), Value::Float(20.5)])
        .unwrap();
    dataset.push_row(vec![Value::Int(2), Value::Null]).unwrap();

    db.load_dataset("readings", &dataset).await.unwrap();

    let rows = db.select_all("readings").await.unwrap();
    assert_eq!(rows.value(0, "measured"), Some(&Value::Float(20.5)));
    assert_eq!(rows.value(1, "measured"), Some(&Value::Null));
}
