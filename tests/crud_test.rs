//! Integration tests for table creation, reflection, and identifier-scoped
//! row operations against a temporary SQLite database.

use tablekit::{ColumnSpec, Database, DbError, SqlType, Value};
use tempfile::NamedTempFile;

/// Create a Database backed by a fresh temporary SQLite file.
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

fn user_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("id_user", SqlType::Integer).primary_key(),
        ColumnSpec::new("name", SqlType::VarChar(255)),
        ColumnSpec::new("active", SqlType::Boolean),
    ]
}

#[tokio::test]
async fn test_create_then_describe_roundtrip() {
    let db = setup_db().await;
    db.create_table("users", &user_columns()).await.unwrap();

    let schema = db.describe("users").await.unwrap();
    assert_eq!(schema.column_names(), vec!["id_user", "name", "active"]);
    assert_eq!(schema.primary_key, vec!["id_user".to_string()]);
}

#[tokio::test]
async fn test_create_existing_table_fails() {
    let db = setup_db().await;
    db.create_table("users", &user_columns()).await.unwrap();

    let err = db.create_table("users", &user_columns()).await.unwrap_err();
    assert!(matches!(err, DbError::TableExists { .. }));
}

#[tokio::test]
async fn test_drop_table() {
    let db = setup_db().await;
    db.create_table("users", &user_columns()).await.unwrap();
    assert!(db.table_exists("users").await.unwrap());

    db.drop_table("users").await.unwrap();
    assert!(!db.table_exists("users").await.unwrap());

    let err = db.drop_table("users").await.unwrap_err();
    assert!(matches!(err, DbError::TableNotFound { .. }));
}

#[tokio::test]
async fn test_table_names_lists_created_tables() {
    let db = setup_db().await;
    db.create_table("users", &user_columns()).await.unwrap();
    db.create_table("groups", &[ColumnSpec::new("id_group", SqlType::Integer)])
        .await
        .unwrap();

    let names = db.table_names().await.unwrap();
    assert!(names.contains(&"users".to_string()));
    assert!(names.contains(&"groups".to_string()));
}

#[tokio::test]
async fn test_describe_missing_table_fails() {
    let db = setup_db().await;
    let err = db.describe("nope").await.unwrap_err();
    assert!(matches!(err, DbError::TableNotFound { .. }));
}

#[tokio::test]
async fn test_insert_then_select_all() {
    let db = setup_db().await;
    db.create_table("users", &user_columns()).await.unwrap();

    let affected = db
        .insert(
            "users",
            &[
                ("id_user", Value::Int(1)),
                ("name", "Ana".into()),
                ("active", Value::Bool(true)),
            ],
        )
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let rows = db.select_all("users").await.unwrap();
    assert_eq!(rows.row_count(), 1);
    assert_eq!(rows.value(0, "id_user"), Some(&Value::Int(1)));
    assert_eq!(rows.value(0, "name"), Some(&Value::Text("Ana".to_string())));
    assert_eq!(rows.value(0, "active"), Some(&Value::Bool(true)));
}

#[tokio::test]
async fn test_update_by_id_targets_only_matching_row() {
    let db = setup_db().await;
    db.create_table("users", &user_columns()).await.unwrap();
    db.insert(
        "users",
        &[
            ("id_user", Value::Int(1)),
            ("name", "Ana".into()),
            ("active", Value::Bool(true)),
        ],
    )
    .await
    .unwrap();
    db.insert(
        "users",
        &[
            ("id_user", Value::Int(2)),
            ("name", "Bruno".into()),
            ("active", Value::Bool(true)),
        ],
    )
    .await
    .unwrap();

    let affected = db
        .update_by_id("users", Value::Int(2), &[("name", "Beatriz".into())])
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let rows = db.select_all("users").await.unwrap();
    let idx = |id: i64| {
        (0..rows.row_count())
            .find(|&i| rows.value(i, "id_user") == Some(&Value::Int(id)))
            .unwrap()
    };
    // Only the targeted row's targeted column changed.
    assert_eq!(
        rows.value(idx(2), "name"),
        Some(&Value::Text("Beatriz".to_string()))
    );
    assert_eq!(rows.value(idx(2), "active"), Some(&Value::Bool(true)));
    assert_eq!(
        rows.value(idx(1), "name"),
        Some(&Value::Text("Ana".to_string()))
    );
}

#[tokio::test]
async fn test_update_by_id_zero_match_returns_zero() {
    let db = setup_db().await;
    db.create_table("users", &user_columns()).await.unwrap();

    let affected = db
        .update_by_id("users", Value::Int(99), &[("name", "Nobody".into())])
        .await
        .unwrap();
    assert_eq!(affected, 0);
}

#[tokio::test]
async fn test_delete_by_id_removes_exactly_matching_row() {
    let db = setup_db().await;
    db.create_table("users", &user_columns()).await.unwrap();
    db.insert(
        "users",
        &[
            ("id_user", Value::Int(1)),
            ("name", "Ana".into()),
            ("active", Value::Bool(true)),
        ],
    )
    .await
    .unwrap();
    db.insert(
        "users",
        &[
            ("id_user", Value::Int(2)),
            ("name", "Bruno".into()),
            ("active", Value::Bool(false)),
        ],
    )
    .await
    .unwrap();

    let affected = db.delete_by_id("users", Value::Int(1)).await.unwrap();
    assert_eq!(affected, 1);

    let rows = db.select_all("users").await.unwrap();
    assert_eq!(rows.row_count(), 1);
    assert_eq!(rows.value(0, "id_user"), Some(&Value::Int(2)));
}

#[tokio::test]
async fn test_key_column_prefers_declared_primary_key() {
    let db = setup_db().await;
    db.execute("CREATE TABLE items (code INTEGER PRIMARY KEY, id_owner INTEGER)")
        .await
        .unwrap();

    assert_eq!(db.key_column("items").await.unwrap(), "code");
}

#[tokio::test]
async fn test_key_column_falls_back_to_naming_convention() {
    let db = setup_db().await;
    db.execute("CREATE TABLE notes (body TEXT, id_note INTEGER)")
        .await
        .unwrap();

    assert_eq!(db.key_column("notes").await.unwrap(), "id_note");

    db.execute("INSERT INTO notes (body, id_note) VALUES ('hello', 7)")
        .await
        .unwrap();
    let affected = db.delete_by_id("notes", Value::Int(7)).await.unwrap();
    assert_eq!(affected, 1);
}

#[tokio::test]
async fn test_keyless_table_fails_with_missing_key_column() {
    let db = setup_db().await;
    db.execute("CREATE TABLE logs (message TEXT, level TEXT)")
        .await
        .unwrap();

    let err = db
        .update_by_id("logs", Value::Int(1), &[("level", "warn".into())])
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::MissingKeyColumn { .. }));

    let err = db.delete_by_id("logs", Value::Int(1)).await.unwrap_err();
    assert!(matches!(err, DbError::MissingKeyColumn { .. }));
}

#[tokio::test]
async fn test_malformed_identifiers_rejected() {
    let db = setup_db().await;

    let err = db.select_all("users; DROP TABLE x").await.unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));

    let err = db
        .insert("users", &[("bad name", Value::Int(1))])
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));
}
