//! External provider clients and their trait seams.
//!
//! The generation pipeline talks to three remote services: a text-generation
//! provider, a speech-synthesis provider, and the token endpoint that issues
//! short-lived speech credentials. Each is reached through a trait so tests
//! and embedders can substitute doubles:
//! - [`TextGenerator`] — prompt in, free text out ([`text::HttpTextGenerator`])
//! - [`SpeechSynthesizer`] — one clip per call ([`speech::HttpSpeechSynthesizer`])
//! - [`token::TokenSource`] — credential exchange, cached by [`token::TokenCache`]
//!
//! Error classification happens here, where the HTTP status is observed; the
//! retry layer never inspects message text.

pub mod speech;
pub mod text;
pub mod token;

pub use speech::HttpSpeechSynthesizer;
pub use text::HttpTextGenerator;
pub use token::{HttpTokenSource, IssuedToken, TokenCache, TokenSource};

use crate::error::{ProviderError, ProviderErrorKind};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// Prompt-to-text completion seam
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a free-text completion for the prompt
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Text-to-speech seam; one call yields one decoded audio clip
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with the named voice, optionally steered by a
    /// style prompt. Returns the decoded audio bytes.
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        style_prompt: Option<&str>,
    ) -> Result<Vec<u8>, ProviderError>;
}

/// Map a non-success HTTP status to an error kind
///
/// A 429 is a quota rejection when the body says so, otherwise plain rate
/// limiting. Statuses outside the known 4xx/5xx set are treated as an
/// invalid response since the contract does not produce them.
pub(crate) fn classify_status(status: reqwest::StatusCode, body: &str) -> ProviderErrorKind {
    match status.as_u16() {
        400 | 422 => ProviderErrorKind::InvalidRequest,
        401 | 403 => ProviderErrorKind::Unauthorized,
        404 => ProviderErrorKind::NotFound,
        429 => {
            let lowered = body.to_lowercase();
            if lowered.contains("quota") || lowered.contains("resource_exhausted") {
                ProviderErrorKind::QuotaExhausted
            } else {
                ProviderErrorKind::RateLimited
            }
        }
        code if (500..600).contains(&code) => ProviderErrorKind::Unavailable,
        code if (400..500).contains(&code) => ProviderErrorKind::InvalidRequest,
        _ => ProviderErrorKind::InvalidResponse,
    }
}

/// Map a transport-level failure (no status observed) to a provider error
pub(crate) fn classify_transport(operation: &str, e: reqwest::Error) -> ProviderError {
    let kind = if e.is_timeout() {
        ProviderErrorKind::Timeout
    } else {
        ProviderErrorKind::Network
    };
    ProviderError::new(kind, e.to_string()).with_operation(operation)
}

/// Extract a provider-suggested retry delay from the response
///
/// Checks the `Retry-After` header (integer seconds) first, then falls back
/// to "retry in N seconds" phrasing inside the body. Fractional values are
/// rounded up so a retry never lands early.
pub(crate) fn retry_hint(headers: &reqwest::header::HeaderMap, body: &str) -> Option<Duration> {
    if let Some(value) = headers.get(reqwest::header::RETRY_AFTER)
        && let Ok(text) = value.to_str()
        && let Ok(secs) = text.trim().parse::<u64>()
    {
        return Some(Duration::from_secs(secs));
    }

    // Matches "retry in 26.37s", "Retry in 40 seconds", "retryDelay: 30s"
    static RETRY_IN: OnceLock<Option<Regex>> = OnceLock::new();
    let re = RETRY_IN
        .get_or_init(|| Regex::new(r"(?i)retry\s*(?:in|delay\D{0,3})\s*(\d+(?:\.\d+)?)\s*s").ok())
        .as_ref()?;

    let captures = re.captures(body)?;
    let secs: f64 = captures.get(1)?.as_str().parse().ok()?;
    Some(Duration::from_secs(secs.ceil() as u64))
}

/// Shorten a response body for inclusion in error messages
pub(crate) fn excerpt(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        trimmed.to_string()
    } else {
        let mut cut: String = trimmed.chars().take(MAX_CHARS).collect();
        cut.push_str("...");
        cut
    }
}
