//! Database layer for lessoncast
//!
//! Handles SQLite persistence for series, channels, lessons, sentences,
//! translations, and generation logs.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`schema`] — Database lifecycle, idempotent schema bootstrap
//! - [`series`] — Series administration (insert, list, resolve, deactivate)
//! - [`lessons`] — Channels, lessons, sentences, idempotency checks
//! - [`translations`] — Lesson- and sentence-level translation rows
//! - [`logs`] — Append-only generation log

use sqlx::sqlite::SqlitePool;

mod lessons;
mod logs;
mod schema;
mod series;
mod translations;

pub use lessons::{NewLesson, NewSentence};

/// SQLite-backed durable store
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Access the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
