//! Audio blob storage: trait seam, artifact paths, HTTP client.
//!
//! Synthesized clips live in an object store reached over HTTP
//! ([`http::HttpAudioStore`]); the [`AudioStore`] trait keeps tests and
//! embedders free to substitute doubles. Artifact paths are deterministic,
//! namespaced by channel and lesson, so rollback can delete exactly what a
//! transaction uploaded.

pub mod http;
mod transaction;

pub use http::HttpAudioStore;
pub use transaction::{LessonTransaction, PersistOutcome, PersistedLesson};

use crate::error::StorageError;
use crate::types::{ChannelId, LessonId};
use async_trait::async_trait;

/// Durable blob store for synthesized audio
#[async_trait]
pub trait AudioStore: Send + Sync {
    /// Upload one artifact at the given path, overwriting any previous object
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Delete one artifact; deleting a missing object is not an error
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Public URL an uploaded artifact is served from
    fn public_url(&self, path: &str) -> String;
}

/// Deterministic blob path for one sentence's audio
pub fn artifact_path(channel_id: ChannelId, lesson_id: LessonId, index: u32) -> String {
    format!("{channel_id}/{lesson_id}/sentence_{index}.mp3")
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_paths_are_namespaced_and_deterministic() {
        let channel = ChannelId::new();
        let lesson = LessonId::new();

        let path = artifact_path(channel, lesson, 3);
        assert_eq!(path, format!("{channel}/{lesson}/sentence_3.mp3"));
        assert_eq!(path, artifact_path(channel, lesson, 3));

        let other = artifact_path(channel, LessonId::new(), 3);
        assert_ne!(path, other, "paths differ across lessons");
    }
}
