//! Append-only generation log.
//!
//! Every orchestrator run, success or failure, ends with exactly one row
//! here. Rows are never updated; pruning by age is the only mutation.

use crate::error::DatabaseError;
use crate::types::{GenerationLogEntry, RunReport, RunStatus, SeriesId, TriggerKind};
use crate::{Error, Result};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;

#[derive(Debug, Clone, FromRow)]
struct GenerationLogRow {
    id: String,
    trigger_kind: String,
    series_ids: String,
    status: String,
    duration_ms: i64,
    results: String,
    errors: String,
    series_attempted: i64,
    lessons_created: i64,
    audio_files_generated: i64,
    created_at: i64,
}

impl GenerationLogRow {
    fn into_entry(self) -> Result<GenerationLogEntry> {
        let id: Uuid = self.id.parse().map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Malformed log id '{}': {}",
                self.id, e
            )))
        })?;

        let series_ids: Vec<SeriesId> = serde_json::from_str(&self.series_ids)?;
        let results = serde_json::from_str(&self.results)?;
        let errors: Vec<String> = serde_json::from_str(&self.errors)?;

        Ok(GenerationLogEntry {
            id,
            trigger: TriggerKind::from_db(&self.trigger_kind),
            series_ids,
            status: RunStatus::from_db(&self.status),
            duration_ms: self.duration_ms.max(0) as u64,
            results,
            errors,
            series_attempted: self.series_attempted.max(0) as u32,
            lessons_created: self.lessons_created.max(0) as u32,
            audio_files_generated: self.audio_files_generated.max(0) as u32,
            created_at: chrono::DateTime::from_timestamp(self.created_at, 0)
                .unwrap_or_else(chrono::Utc::now),
        })
    }
}

impl Database {
    /// Append one generation-log row for a finished run
    pub async fn insert_generation_log(
        &self,
        report: &RunReport,
        series_ids: &[SeriesId],
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO generation_logs (
                id, trigger_kind, series_ids, status, duration_ms, results,
                errors, series_attempted, lessons_created,
                audio_files_generated, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(report.trigger.as_str())
        .bind(serde_json::to_string(series_ids)?)
        .bind(report.status.as_str())
        .bind(i64::try_from(report.duration_ms).unwrap_or(i64::MAX))
        .bind(serde_json::to_string(&report.reports)?)
        .bind(serde_json::to_string(&report.errors)?)
        .bind(i64::from(report.series_attempted))
        .bind(i64::from(report.lessons_created))
        .bind(i64::from(report.audio_files_generated))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert generation log: {}",
                e
            )))
        })?;

        Ok(id)
    }

    /// List generation-log entries, newest first, with pagination
    pub async fn list_generation_logs(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<GenerationLogEntry>> {
        let rows = sqlx::query_as::<_, GenerationLogRow>(
            r#"
            SELECT id, trigger_kind, series_ids, status, duration_ms, results,
                   errors, series_attempted, lessons_created,
                   audio_files_generated, created_at
            FROM generation_logs
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list generation logs: {}",
                e
            )))
        })?;

        rows.into_iter().map(GenerationLogRow::into_entry).collect()
    }

    /// Delete log entries older than the given number of days
    ///
    /// Returns the number of rows removed.
    pub async fn prune_generation_logs(&self, older_than_days: u32) -> Result<u64> {
        let cutoff =
            chrono::Utc::now().timestamp() - i64::from(older_than_days) * 24 * 60 * 60;

        let result = sqlx::query("DELETE FROM generation_logs WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to prune generation logs: {}",
                    e
                )))
            })?;

        let pruned = result.rows_affected();
        if pruned > 0 {
            tracing::info!(pruned, older_than_days, "Pruned generation logs");
        }

        Ok(pruned)
    }
}
