//! Lesson- and sentence-level translation rows.
//!
//! Translations are created only after the English rows exist and are keyed
//! uniquely by (owning id, language); there is no standalone translation.

use crate::error::DatabaseError;
use crate::types::{LessonId, SentenceId};
use crate::{Error, Result};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;

/// One stored translation row (shared shape for both levels)
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TranslationRow {
    /// Language code (e.g., "ja")
    pub language: String,
    /// Translated text
    pub text: String,
}

impl Database {
    /// Insert a translated lesson title
    pub async fn insert_lesson_translation(
        &self,
        lesson_id: LessonId,
        language: &str,
        title: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO lesson_translations (id, lesson_id, language, title) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(lesson_id.to_string())
        .bind(language)
        .bind(title)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                Error::Database(DatabaseError::ConstraintViolation(format!(
                    "{} translation already exists for lesson {}",
                    language, lesson_id
                )))
            } else {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert lesson translation: {}",
                    e
                )))
            }
        })?;

        Ok(())
    }

    /// Insert a translated sentence text
    pub async fn insert_sentence_translation(
        &self,
        sentence_id: SentenceId,
        language: &str,
        text: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO sentence_translations (id, sentence_id, language, text) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(sentence_id.to_string())
        .bind(language)
        .bind(text)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                Error::Database(DatabaseError::ConstraintViolation(format!(
                    "{} translation already exists for sentence {}",
                    language, sentence_id
                )))
            } else {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert sentence translation: {}",
                    e
                )))
            }
        })?;

        Ok(())
    }

    /// List a lesson's title translations
    pub async fn list_lesson_translations(&self, lesson_id: LessonId) -> Result<Vec<TranslationRow>> {
        let rows = sqlx::query_as::<_, TranslationRow>(
            r#"
            SELECT language, title AS text FROM lesson_translations
            WHERE lesson_id = ? ORDER BY language ASC
            "#,
        )
        .bind(lesson_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list lesson translations: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// List the sentence translations of a lesson, ordered by sentence then language
    pub async fn list_sentence_translations(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<TranslationRow>> {
        let rows = sqlx::query_as::<_, TranslationRow>(
            r#"
            SELECT st.language, st.text
            FROM sentence_translations st
            JOIN sentences s ON s.id = st.sentence_id
            WHERE s.lesson_id = ?
            ORDER BY s.order_index ASC, st.language ASC
            "#,
        )
        .bind(lesson_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list sentence translations: {}",
                e
            )))
        })?;

        Ok(rows)
    }
}
