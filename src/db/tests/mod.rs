mod companies;

use super::*;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_migrations_create_schema() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let count = db.count_companies().await.unwrap();
    assert_eq!(count, 0);

    db.close().await;
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file.path();

    let db = Database::new(db_path).await.unwrap();
    db.close().await;

    // Reopening must not re-apply v1 or disturb the schema
    let db = Database::new(db_path).await.unwrap();
    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_version")
        .fetch_all(&db.pool)
        .await
        .unwrap();
    assert_eq!(versions, vec![1]);

    db.close().await;
}

#[tokio::test]
async fn test_new_creates_parent_directory() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("dir").join("test.db");

    let db = Database::new(&db_path).await.unwrap();
    assert_eq!(db.count_companies().await.unwrap(), 0);

    db.close().await;
}
