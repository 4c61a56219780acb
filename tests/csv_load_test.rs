//! Integration tests for CSV bulk loading: file parsing, field sniffing and
//! end-to-end readback through a temporary SQLite database.

use chrono::NaiveDate;
use tablekit::{Database, DbError, Value};
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

/// Write CSV content to a temp file and return its kept path.
fn write_csv(content: &str) -> std::path::PathBuf {
    let file = NamedTempFile::new().unwrap();
    let path = file.into_temp_path().keep().unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_csv_load_creates_table_and_inserts_rows() {
    let db = setup_db().await;
    let path = write_csv(
        "id_event,name,score,active,held_on\n\
         1,launch,9.5,true,2024-05-01 12:30:00\n\
         2,retro,,false,2024-06-02\n",
    );

    let report = db.load_csv("events", &path).await.unwrap();
    assert!(report.table_created);
    assert_eq!(report.rows_inserted, 2);
    assert!(report.is_complete());

    let rows = db.select_all("events").await.unwrap();
    assert_eq!(rows.row_count(), 2);
    assert_eq!(rows.value(0, "id_event"), Some(&Value::Int(1)));
    assert_eq!(
        rows.value(0, "name"),
        Some(&Value::Text("launch".to_string()))
    );
    assert_eq!(rows.value(0, "score"), Some(&Value::Float(9.5)));
    assert_eq!(rows.value(0, "active"), Some(&Value::Bool(true)));
    // Empty field loads as NULL.
    assert_eq!(rows.value(1, "score"), Some(&Value::Null));
}

#[tokio::test]
async fn test_csv_datetime_roundtrip() {
    let db = setup_db().await;
    let path = write_csv(
        "id_event,held_on\n\
         1,2024-05-01 12:30:00\n\
         2,2024-06-02\n",
    );

    db.load_csv("events", &path).await.unwrap();

    let rows = db.select_all("events").await.unwrap();
    let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(12, 30, 0)
        .unwrap();
    assert_eq!(rows.value(0, "held_on"), Some(&Value::DateTime(expected)));
    // Bare dates land at midnight.
    let midnight = NaiveDate::from_ymd_opt(2024, 6, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(rows.value(1, "held_on"), Some(&Value::DateTime(midnight)));
}

#[tokio::test]
async fn test_csv_load_into_existing_table_by_convention_key() {
    let db = setup_db().await;
    let path = write_csv("id_user,name\n10,Ana\n11,Bruno\n");
    db.load_csv("users", &path).await.unwrap();

    // The conventionally-named key column drives row operations afterwards.
    let affected = db.delete_by_id("users", Value::Int(10)).await.unwrap();
    assert_eq!(affected, 1);
    let rows = db.select_all("users").await.unwrap();
    assert_eq!(rows.row_count(), 1);
    assert_eq!(rows.value(0, "id_user"), Some(&Value::Int(11)));
}

#[tokio::test]
async fn test_csv_missing_file_fails() {
    let db = setup_db().await;
    let err = db.load_csv("events", "no/such/file.csv").await.unwrap_err();
    assert!(matches!(err, DbError::Csv { .. }));
}

#[tokio::test]
async fn test_csv_ragged_row_fails() {
    let db = setup_db().await;
    let path = write_csv("a,b\n1,2\n3\n");
    let err = db.load_csv("events", &path).await.unwrap_err();
    assert!(matches!(err, DbError::Csv { .. }));
}
