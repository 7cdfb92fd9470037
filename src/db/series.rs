//! Series administration: insert, list, resolve, deactivate.
//!
//! Series are edited out-of-band of a run; the orchestrator only reads them.
//! The HTTP API does not expose these methods — embedding applications and
//! tests manage series through the library.

use crate::error::DatabaseError;
use crate::types::{Difficulty, NewSeries, Series, SeriesId};
use crate::{Error, Result};
use sqlx::FromRow;

use super::Database;

/// Series record as stored
#[derive(Debug, Clone, FromRow)]
struct SeriesRow {
    id: String,
    name: String,
    concept: String,
    line_count: i64,
    difficulty: String,
    voice_prompt: Option<String>,
    alt_voice_prompt: Option<String>,
    alternate_voices: i64,
    default_voice: Option<String>,
    alternate_voice: Option<String>,
    extra_instructions: Option<String>,
    batch: Option<i64>,
    active: i64,
    created_at: i64,
}

impl SeriesRow {
    fn into_series(self) -> Result<Series> {
        let id: SeriesId = self.id.parse().map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Malformed series id '{}': {}",
                self.id, e
            )))
        })?;

        Ok(Series {
            id,
            name: self.name,
            concept: self.concept,
            line_count: self.line_count.max(0) as u32,
            difficulty: Difficulty::from_db(&self.difficulty),
            voice_prompt: self.voice_prompt,
            alt_voice_prompt: self.alt_voice_prompt,
            alternate_voices: self.alternate_voices != 0,
            default_voice: self.default_voice,
            alternate_voice: self.alternate_voice,
            extra_instructions: self.extra_instructions,
            batch: self.batch.and_then(|b| u8::try_from(b).ok()),
            active: self.active != 0,
            created_at: chrono::DateTime::from_timestamp(self.created_at, 0)
                .unwrap_or_else(chrono::Utc::now),
        })
    }
}

const SERIES_COLUMNS: &str = r#"
    id, name, concept, line_count, difficulty, voice_prompt, alt_voice_prompt,
    alternate_voices, default_voice, alternate_voice, extra_instructions,
    batch, active, created_at
"#;

impl Database {
    /// Insert a new series
    pub async fn insert_series(&self, series: &NewSeries) -> Result<SeriesId> {
        let id = SeriesId::new();
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO series (
                id, name, concept, line_count, difficulty, voice_prompt,
                alt_voice_prompt, alternate_voices, default_voice,
                alternate_voice, extra_instructions, batch, active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&series.name)
        .bind(&series.concept)
        .bind(i64::from(series.line_count))
        .bind(series.difficulty.as_str())
        .bind(&series.voice_prompt)
        .bind(&series.alt_voice_prompt)
        .bind(i64::from(series.alternate_voices))
        .bind(&series.default_voice)
        .bind(&series.alternate_voice)
        .bind(&series.extra_instructions)
        .bind(series.batch.map(i64::from))
        .bind(i64::from(series.active))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert series: {}",
                e
            )))
        })?;

        Ok(id)
    }

    /// Get a series by id
    pub async fn get_series(&self, id: SeriesId) -> Result<Option<Series>> {
        let row = sqlx::query_as::<_, SeriesRow>(&format!(
            "SELECT {SERIES_COLUMNS} FROM series WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get series: {}",
                e
            )))
        })?;

        row.map(SeriesRow::into_series).transpose()
    }

    /// List every active series, oldest first
    pub async fn list_active_series(&self) -> Result<Vec<Series>> {
        let rows = sqlx::query_as::<_, SeriesRow>(&format!(
            "SELECT {SERIES_COLUMNS} FROM series WHERE active = 1 ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list active series: {}",
                e
            )))
        })?;

        rows.into_iter().map(SeriesRow::into_series).collect()
    }

    /// List active series carrying a batch tag, oldest first
    pub async fn list_series_by_batch(&self, batch: u8) -> Result<Vec<Series>> {
        let rows = sqlx::query_as::<_, SeriesRow>(&format!(
            "SELECT {SERIES_COLUMNS} FROM series
             WHERE active = 1 AND batch = ? ORDER BY created_at ASC"
        ))
        .bind(i64::from(batch))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list series for batch {}: {}",
                batch, e
            )))
        })?;

        rows.into_iter().map(SeriesRow::into_series).collect()
    }

    /// Flip a series' active flag
    ///
    /// Returns [`DatabaseError::NotFound`] if the id does not exist.
    pub async fn set_series_active(&self, id: SeriesId, active: bool) -> Result<()> {
        let result = sqlx::query("UPDATE series SET active = ? WHERE id = ?")
            .bind(i64::from(active))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to update series: {}",
                    e
                )))
            })?;

        if result.rows_affected() == 0 {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "series {}",
                id
            ))));
        }

        Ok(())
    }
}
