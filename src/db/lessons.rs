//! Channels, lessons, sentences, and the daily idempotency check.

use crate::error::DatabaseError;
use crate::types::{Channel, ChannelId, Lesson, LessonId, Sentence, SentenceId, Series};
use crate::{Error, Result};
use chrono::NaiveDate;
use sqlx::FromRow;

use super::Database;

/// Fields for inserting a new lesson
#[derive(Debug, Clone)]
pub struct NewLesson {
    /// Owning channel
    pub channel_id: ChannelId,
    /// Lesson title
    pub title: String,
    /// Source descriptor recording where the content came from
    pub source: String,
    /// Publication date
    pub lesson_date: NaiveDate,
}

/// Fields for inserting a new sentence
#[derive(Debug, Clone)]
pub struct NewSentence {
    /// Owning lesson
    pub lesson_id: LessonId,
    /// 0-based position within the lesson
    pub order_index: u32,
    /// English text of the line
    pub text: String,
    /// Public URL of the synthesized audio
    pub audio_url: String,
    /// Estimated duration in seconds
    pub duration_secs: f64,
    /// Voice identifier used
    pub voice: String,
}

#[derive(Debug, Clone, FromRow)]
struct ChannelRow {
    id: String,
    series_id: String,
    name: String,
    created_at: i64,
}

#[derive(Debug, Clone, FromRow)]
struct LessonRow {
    id: String,
    channel_id: String,
    title: String,
    source: String,
    lesson_date: String,
    created_at: i64,
}

#[derive(Debug, Clone, FromRow)]
struct SentenceRow {
    id: String,
    lesson_id: String,
    order_index: i64,
    text: String,
    audio_url: String,
    duration_secs: f64,
    voice: String,
}

fn parse_id<T: std::str::FromStr<Err = uuid::Error>>(raw: &str, what: &str) -> Result<T> {
    raw.parse().map_err(|e| {
        Error::Database(DatabaseError::QueryFailed(format!(
            "Malformed {} id '{}': {}",
            what, raw, e
        )))
    })
}

fn timestamp(secs: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(chrono::Utc::now)
}

impl ChannelRow {
    fn into_channel(self) -> Result<Channel> {
        Ok(Channel {
            id: parse_id(&self.id, "channel")?,
            series_id: parse_id(&self.series_id, "series")?,
            name: self.name,
            created_at: timestamp(self.created_at),
        })
    }
}

impl LessonRow {
    fn into_lesson(self) -> Result<Lesson> {
        let lesson_date = self.lesson_date.parse::<NaiveDate>().map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Malformed lesson date '{}': {}",
                self.lesson_date, e
            )))
        })?;

        Ok(Lesson {
            id: parse_id(&self.id, "lesson")?,
            channel_id: parse_id(&self.channel_id, "channel")?,
            title: self.title,
            source: self.source,
            lesson_date,
            created_at: timestamp(self.created_at),
        })
    }
}

impl SentenceRow {
    fn into_sentence(self) -> Result<Sentence> {
        Ok(Sentence {
            id: parse_id(&self.id, "sentence")?,
            lesson_id: parse_id(&self.lesson_id, "lesson")?,
            order_index: self.order_index.max(0) as u32,
            text: self.text,
            audio_url: self.audio_url,
            duration_secs: self.duration_secs,
            voice: self.voice,
        })
    }
}

impl Database {
    /// Get the channel for a series, creating it on first generation
    pub async fn get_or_create_channel(&self, series: &Series) -> Result<Channel> {
        if let Some(existing) = sqlx::query_as::<_, ChannelRow>(
            "SELECT id, series_id, name, created_at FROM channels WHERE series_id = ?",
        )
        .bind(series.id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to look up channel: {}",
                e
            )))
        })? {
            return existing.into_channel();
        }

        let id = ChannelId::new();
        let now = chrono::Utc::now();

        sqlx::query("INSERT INTO channels (id, series_id, name, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(series.id.to_string())
            .bind(&series.name)
            .bind(now.timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to create channel: {}",
                    e
                )))
            })?;

        tracing::info!(
            series_id = %series.id,
            channel_id = %id,
            "Created channel for series"
        );

        Ok(Channel {
            id,
            series_id: series.id,
            name: series.name.clone(),
            created_at: now,
        })
    }

    /// Does this channel already have a lesson for the date?
    pub async fn lesson_exists(&self, channel_id: ChannelId, date: NaiveDate) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lessons WHERE channel_id = ? AND lesson_date = ?",
        )
        .bind(channel_id.to_string())
        .bind(date.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to check for existing lesson: {}",
                e
            )))
        })?;

        Ok(count > 0)
    }

    /// Insert a lesson row
    ///
    /// A uniqueness violation on (lesson_date, channel_id) surfaces as
    /// [`DatabaseError::ConstraintViolation`] so callers can treat "today's
    /// lesson already exists" as a skip instead of a failure.
    pub async fn insert_lesson(&self, lesson: &NewLesson) -> Result<LessonId> {
        let id = LessonId::new();
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO lessons (id, channel_id, title, source, lesson_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(lesson.channel_id.to_string())
        .bind(&lesson.title)
        .bind(&lesson.source)
        .bind(lesson.lesson_date.to_string())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                Error::Database(DatabaseError::ConstraintViolation(format!(
                    "lesson for {} already exists on channel {}",
                    lesson.lesson_date, lesson.channel_id
                )))
            } else {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert lesson: {}",
                    e
                )))
            }
        })?;

        Ok(id)
    }

    /// Insert a sentence row
    pub async fn insert_sentence(&self, sentence: &NewSentence) -> Result<SentenceId> {
        let id = SentenceId::new();

        sqlx::query(
            r#"
            INSERT INTO sentences (id, lesson_id, order_index, text, audio_url, duration_secs, voice)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(sentence.lesson_id.to_string())
        .bind(i64::from(sentence.order_index))
        .bind(&sentence.text)
        .bind(&sentence.audio_url)
        .bind(sentence.duration_secs)
        .bind(&sentence.voice)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                Error::Database(DatabaseError::ConstraintViolation(format!(
                    "sentence {} already exists in lesson {}",
                    sentence.order_index, sentence.lesson_id
                )))
            } else {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert sentence: {}",
                    e
                )))
            }
        })?;

        Ok(id)
    }

    /// Get a lesson by id
    pub async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>> {
        let row = sqlx::query_as::<_, LessonRow>(
            "SELECT id, channel_id, title, source, lesson_date, created_at FROM lessons WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get lesson: {}",
                e
            )))
        })?;

        row.map(LessonRow::into_lesson).transpose()
    }

    /// List a lesson's sentences in order
    pub async fn list_sentences(&self, lesson_id: LessonId) -> Result<Vec<Sentence>> {
        let rows = sqlx::query_as::<_, SentenceRow>(
            r#"
            SELECT id, lesson_id, order_index, text, audio_url, duration_secs, voice
            FROM sentences WHERE lesson_id = ? ORDER BY order_index ASC
            "#,
        )
        .bind(lesson_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list sentences: {}",
                e
            )))
        })?;

        rows.into_iter().map(SentenceRow::into_sentence).collect()
    }

    /// Delete a lesson row; cascade removes its sentences and translations
    ///
    /// Used by the compensating rollback. Deleting an already-deleted lesson
    /// is not an error.
    pub async fn delete_lesson(&self, id: LessonId) -> Result<()> {
        sqlx::query("DELETE FROM lessons WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to delete lesson: {}",
                    e
                )))
            })?;

        Ok(())
    }
}
