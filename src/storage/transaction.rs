//! Lesson persistence with compensating rollback.
//!
//! [`LessonTransaction::persist`] writes one generated lesson: the Lesson
//! row first, then per line an audio upload plus Sentence row, then the
//! translation rows. The blob store and the relational store share no
//! transaction, so a failure after the Lesson insert triggers compensating
//! cleanup: the Lesson row is deleted (cascade removes child rows) and every
//! blob uploaded so far is deleted explicitly. Cleanup failures are
//! collected into the surfaced error rather than swallowed, so operators can
//! reconcile orphaned artifacts out-of-band.

use crate::db::{Database, NewLesson, NewSentence};
use crate::error::{DatabaseError, Error, Result, StorageError};
use crate::types::{Channel, LessonId, LineAudio, Passage, TranslatedPassage};
use chrono::NaiveDate;
use std::sync::Arc;

use super::{AudioStore, artifact_path};

/// What a committed transaction produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistedLesson {
    /// Id of the created lesson
    pub lesson_id: LessonId,
    /// Number of sentences written
    pub sentence_count: u32,
    /// Translation languages actually stored
    pub translation_languages: Vec<String>,
}

/// Outcome of a persist attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The lesson and all child records were committed
    Created(PersistedLesson),
    /// A lesson for this date and channel already exists; nothing written
    AlreadyExists,
}

/// Persists one generated lesson against the two stores
pub struct LessonTransaction {
    db: Database,
    store: Arc<dyn AudioStore>,
}

impl LessonTransaction {
    /// Create a transaction manager over the given stores
    pub fn new(db: Database, store: Arc<dyn AudioStore>) -> Self {
        Self { db, store }
    }

    /// Persist a generated passage with its audio and translations
    ///
    /// The Lesson row goes in first so child records can reference it; a
    /// uniqueness violation there means today's lesson already exists and is
    /// reported as [`PersistOutcome::AlreadyExists`], not an error. Any
    /// later failure rolls the whole lesson back.
    pub async fn persist(
        &self,
        channel: &Channel,
        date: NaiveDate,
        source: &str,
        passage: &Passage,
        clips: &[LineAudio],
        translations: &[TranslatedPassage],
    ) -> Result<PersistOutcome> {
        debug_assert_eq!(passage.lines.len(), clips.len());

        let lesson_id = match self
            .db
            .insert_lesson(&NewLesson {
                channel_id: channel.id,
                title: passage.title.clone(),
                source: source.to_string(),
                lesson_date: date,
            })
            .await
        {
            Ok(id) => id,
            Err(Error::Database(DatabaseError::ConstraintViolation(_))) => {
                tracing::info!(
                    channel_id = %channel.id,
                    date = %date,
                    "Lesson already exists for this date and channel; skipping"
                );
                return Ok(PersistOutcome::AlreadyExists);
            }
            Err(e) => return Err(e),
        };

        // Cache-busting version tag shared by every URL in this lesson
        let version = chrono::Utc::now().timestamp();

        match self
            .write_children(channel, lesson_id, version, passage, clips, translations)
            .await
        {
            Ok(languages) => {
                tracing::info!(
                    lesson_id = %lesson_id,
                    sentences = clips.len(),
                    languages = ?languages,
                    "Lesson committed"
                );
                Ok(PersistOutcome::Created(PersistedLesson {
                    lesson_id,
                    sentence_count: clips.len() as u32,
                    translation_languages: languages,
                }))
            }
            Err((reason, uploaded)) => {
                let cleanup_errors = self.rollback(lesson_id, &uploaded).await;
                Err(Error::Storage(StorageError::TransactionFailed {
                    reason,
                    cleanup_errors,
                }))
            }
        }
    }

    /// Upload audio, insert sentences, insert translations
    ///
    /// On failure returns the reason plus the blob paths uploaded so far, so
    /// the caller can compensate.
    async fn write_children(
        &self,
        channel: &Channel,
        lesson_id: LessonId,
        version: i64,
        passage: &Passage,
        clips: &[LineAudio],
        translations: &[TranslatedPassage],
    ) -> std::result::Result<Vec<String>, (String, Vec<String>)> {
        let mut uploaded: Vec<String> = Vec::with_capacity(clips.len());
        let mut sentence_ids = Vec::with_capacity(clips.len());

        for (index, (line, clip)) in passage.lines.iter().zip(clips).enumerate() {
            let path = artifact_path(channel.id, lesson_id, index as u32);

            if let Err(e) = self.store.upload(&path, &clip.audio).await {
                return Err((e.to_string(), uploaded));
            }
            uploaded.push(path.clone());

            let audio_url = format!("{}?v={}", self.store.public_url(&path), version);
            match self
                .db
                .insert_sentence(&NewSentence {
                    lesson_id,
                    order_index: index as u32,
                    text: line.clone(),
                    audio_url,
                    duration_secs: clip.duration_secs,
                    voice: clip.voice.clone(),
                })
                .await
            {
                Ok(id) => sentence_ids.push(id),
                Err(e) => return Err((e.to_string(), uploaded)),
            }
        }

        let mut languages = Vec::with_capacity(translations.len());
        for translation in translations {
            if let Err(e) = self
                .db
                .insert_lesson_translation(lesson_id, &translation.language, &translation.title)
                .await
            {
                return Err((e.to_string(), uploaded));
            }

            // Positional match up to the shorter list; surplus lines on
            // either side are left untranslated
            let pairs = sentence_ids.iter().zip(&translation.lines);
            for (sentence_id, text) in pairs {
                if let Err(e) = self
                    .db
                    .insert_sentence_translation(*sentence_id, &translation.language, text)
                    .await
                {
                    return Err((e.to_string(), uploaded));
                }
            }

            languages.push(translation.language.clone());
        }

        Ok(languages)
    }

    /// Compensating cleanup after a failed write
    ///
    /// Deletes the Lesson row (cascade takes the child rows) and every blob
    /// uploaded in this transaction. Returns the failures it could not
    /// clean, one message per artifact.
    async fn rollback(&self, lesson_id: LessonId, uploaded: &[String]) -> Vec<String> {
        tracing::warn!(
            lesson_id = %lesson_id,
            uploaded_blobs = uploaded.len(),
            "Rolling back partial lesson write"
        );

        let mut cleanup_errors = Vec::new();

        if let Err(e) = self.db.delete_lesson(lesson_id).await {
            cleanup_errors.push(format!("failed to delete lesson {}: {}", lesson_id, e));
        }

        for path in uploaded {
            if let Err(e) = self.store.delete(path).await {
                cleanup_errors.push(e.to_string());
            }
        }

        if !cleanup_errors.is_empty() {
            tracing::error!(
                lesson_id = %lesson_id,
                failures = cleanup_errors.len(),
                "Rollback cleanup left orphaned artifacts"
            );
        }

        cleanup_errors
    }
}
