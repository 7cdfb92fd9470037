//! Shared in-memory doubles for the provider and store seams.
//!
//! Compiled only for tests. Unit tests that exercise one seam keep their own
//! local doubles; these are the ones shared across the storage and
//! orchestrator tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::error::{ProviderError, ProviderErrorKind, StorageError};
use crate::providers::{SpeechSynthesizer, TextGenerator};
use crate::storage::AudioStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory [`AudioStore`] with failure injection
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect the other afterwards.
#[derive(Clone)]
pub struct FakeAudioStore {
    inner: Arc<Mutex<StoreState>>,
}

struct StoreState {
    objects: HashMap<String, Vec<u8>>,
    uploads_attempted: usize,
    fail_upload_at: Option<usize>,
    fail_deletes: bool,
}

impl FakeAudioStore {
    /// A store where every operation succeeds
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreState {
                objects: HashMap::new(),
                uploads_attempted: 0,
                fail_upload_at: None,
                fail_deletes: false,
            })),
        }
    }

    /// A store whose n-th upload (0-based) fails; earlier and later uploads succeed
    pub fn failing_upload_at(attempt: usize) -> Self {
        let store = Self::new();
        store.inner.lock().unwrap().fail_upload_at = Some(attempt);
        store
    }

    /// Make every delete fail, stranding whatever was uploaded
    #[must_use]
    pub fn with_failing_deletes(self) -> Self {
        self.inner.lock().unwrap().fail_deletes = true;
        self
    }

    /// Number of objects currently stored
    pub fn object_count(&self) -> usize {
        self.inner.lock().unwrap().objects.len()
    }

    /// Whether an object exists at the given path
    pub fn has_object(&self, path: &str) -> bool {
        self.inner.lock().unwrap().objects.contains_key(path)
    }

    /// Bytes stored at the given path, if any
    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().objects.get(path).cloned()
    }
}

#[async_trait]
impl AudioStore for FakeAudioStore {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let mut state = self.inner.lock().unwrap();
        let attempt = state.uploads_attempted;
        state.uploads_attempted += 1;
        if state.fail_upload_at == Some(attempt) {
            return Err(StorageError::UploadFailed {
                path: path.to_string(),
                reason: "injected upload failure".to_string(),
            });
        }
        state.objects.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let mut state = self.inner.lock().unwrap();
        if state.fail_deletes {
            return Err(StorageError::DeleteFailed {
                path: path.to_string(),
                reason: "injected delete failure".to_string(),
            });
        }
        state.objects.remove(path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://cdn.test/{path}")
    }
}

/// [`TextGenerator`] that replays queued responses in order
///
/// Panics if called more times than responses were queued, which surfaces
/// unexpected extra provider calls as test failures.
#[derive(Clone)]
pub struct ScriptedTextProvider {
    responses: Arc<Mutex<Vec<Result<String, ProviderErrorKind>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTextProvider {
    pub fn new(responses: Vec<Result<String, ProviderErrorKind>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The prompts this provider has been called with, in order
    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedTextProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(prompt.to_string());
        let mut responses = self.responses.lock().unwrap();
        assert!(!responses.is_empty(), "unexpected extra text-provider call");
        match responses.remove(0) {
            Ok(text) => Ok(text),
            Err(kind) => Err(ProviderError::new(kind, "scripted failure")),
        }
    }
}

/// [`SpeechSynthesizer`] returning deterministic bytes per call
///
/// Records every `(text, voice)` pair and optionally fails the n-th call.
#[derive(Clone)]
pub struct FakeSynthesizer {
    inner: Arc<Mutex<SynthState>>,
}

struct SynthState {
    calls: Vec<(String, String)>,
    fail_at: Option<usize>,
    fail_kind: ProviderErrorKind,
}

impl FakeSynthesizer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SynthState {
                calls: Vec::new(),
                fail_at: None,
                fail_kind: ProviderErrorKind::Unavailable,
            })),
        }
    }

    /// Fail the n-th synthesis call (0-based) with the given kind
    pub fn failing_at(attempt: usize, kind: ProviderErrorKind) -> Self {
        let synth = Self::new();
        {
            let mut state = synth.inner.lock().unwrap();
            state.fail_at = Some(attempt);
            state.fail_kind = kind;
        }
        synth
    }

    /// The `(text, voice)` pairs synthesized so far, in order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        _style_prompt: Option<&str>,
    ) -> Result<Vec<u8>, ProviderError> {
        let mut state = self.inner.lock().unwrap();
        let attempt = state.calls.len();
        state.calls.push((text.to_string(), voice.to_string()));
        if state.fail_at == Some(attempt) {
            return Err(ProviderError::new(state.fail_kind, "scripted failure"));
        }
        Ok(format!("audio:{voice}:{text}").into_bytes())
    }
}
