//! Database lifecycle and idempotent schema bootstrap.
//!
//! The schema is created with `CREATE TABLE IF NOT EXISTS` statements rather
//! than versioned migrations; migration bookkeeping is out of scope for this
//! crate, and every statement here is safe to re-run on an existing file.

use crate::error::DatabaseError;
use crate::{Error, Result};
use sqlx::sqlite::SqlitePool;
use std::path::Path;

use super::Database;

/// Idempotent DDL, executed statement by statement at startup
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS series (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        concept TEXT NOT NULL,
        line_count INTEGER NOT NULL,
        difficulty TEXT NOT NULL,
        voice_prompt TEXT,
        alt_voice_prompt TEXT,
        alternate_voices INTEGER NOT NULL DEFAULT 0,
        default_voice TEXT,
        alternate_voice TEXT,
        extra_instructions TEXT,
        batch INTEGER,
        active INTEGER NOT NULL DEFAULT 1,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS channels (
        id TEXT PRIMARY KEY,
        series_id TEXT NOT NULL UNIQUE REFERENCES series(id),
        name TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lessons (
        id TEXT PRIMARY KEY,
        channel_id TEXT NOT NULL REFERENCES channels(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        source TEXT NOT NULL,
        lesson_date TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        UNIQUE (lesson_date, channel_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sentences (
        id TEXT PRIMARY KEY,
        lesson_id TEXT NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
        order_index INTEGER NOT NULL,
        text TEXT NOT NULL,
        audio_url TEXT NOT NULL,
        duration_secs REAL NOT NULL,
        voice TEXT NOT NULL,
        UNIQUE (lesson_id, order_index)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lesson_translations (
        id TEXT PRIMARY KEY,
        lesson_id TEXT NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
        language TEXT NOT NULL,
        title TEXT NOT NULL,
        UNIQUE (lesson_id, language)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sentence_translations (
        id TEXT PRIMARY KEY,
        sentence_id TEXT NOT NULL REFERENCES sentences(id) ON DELETE CASCADE,
        language TEXT NOT NULL,
        text TEXT NOT NULL,
        UNIQUE (sentence_id, language)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS generation_logs (
        id TEXT PRIMARY KEY,
        trigger_kind TEXT NOT NULL,
        series_ids TEXT NOT NULL,
        status TEXT NOT NULL,
        duration_ms INTEGER NOT NULL,
        results TEXT NOT NULL,
        errors TEXT NOT NULL,
        series_attempted INTEGER NOT NULL,
        lessons_created INTEGER NOT NULL,
        audio_files_generated INTEGER NOT NULL,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_lessons_channel_date
        ON lessons (channel_id, lesson_date)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_generation_logs_created
        ON generation_logs (created_at)
    "#,
];

impl Database {
    /// Create a new database connection
    ///
    /// Creates the database file if it doesn't exist and bootstraps the
    /// schema. The connection runs with WAL journaling and foreign key
    /// enforcement (cascade deletes carry the rollback contract).
    pub async fn new(path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to create database directory: {}",
                    e
                )))
            })?;
        }

        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to parse database path: {}",
                    e
                )))
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to connect to database: {}",
                e
            )))
        })?;

        let db = Self { pool };
        db.bootstrap_schema().await?;

        Ok(db)
    }

    /// Run the idempotent DDL
    async fn bootstrap_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::SchemaFailed(format!(
                        "Failed to apply schema statement: {}",
                        e
                    )))
                })?;
        }

        tracing::debug!("Database schema bootstrapped");
        Ok(())
    }
}
