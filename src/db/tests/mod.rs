use crate::db::Database;
use crate::types::NewSeries;
use tempfile::NamedTempFile;


/// Open a fresh database on a temp file; the file guard keeps it alive
async fn test_db() -> (Database, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    (db, temp_file)
}

/// A minimal active series for tests that just need one
fn sample_series(name: &str) -> NewSeries {
    NewSeries {
        name: name.to_string(),
        concept: "daily scenes".to_string(),
        line_count: 5,
        ..NewSeries::default()
    }
}

#[tokio::test]
async fn schema_bootstrap_is_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();

    let db = Database::new(temp_file.path()).await.unwrap();
    let id = db.insert_series(&sample_series("First")).await.unwrap();
    db.close().await;

    // Re-opening the same file re-runs the DDL without clobbering data
    let db = Database::new(temp_file.path()).await.unwrap();
    let series = db.get_series(id).await.unwrap().unwrap();
    assert_eq!(series.name, "First");
    db.close().await;
}
