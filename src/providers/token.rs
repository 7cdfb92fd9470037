//! Speech-provider access tokens: exchange endpoint and in-process cache.
//!
//! The synthesis API authenticates with short-lived tokens issued by a
//! separate endpoint. [`TokenCache`] holds the current token with its expiry
//! and refreshes on demand, so invocations sharing a process reuse one
//! credential instead of hammering the exchange.

use crate::config::TokenProviderConfig;
use crate::error::{ProviderError, ProviderErrorKind, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::{classify_status, classify_transport, excerpt};

const OPERATION: &str = "token.fetch";

/// A freshly issued access token and its reported lifetime
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Bearer token value
    pub access_token: String,
    /// Lifetime reported by the exchange endpoint
    pub expires_in: Duration,
}

/// Seam for the credential exchange; [`HttpTokenSource`] is the wire-backed one
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Exchange the service secret for a fresh access token
    async fn fetch(&self) -> std::result::Result<IssuedToken, ProviderError>;
}

/// Request body for the token endpoint
#[derive(Serialize)]
struct TokenRequest<'a> {
    service_secret: &'a str,
}

/// Response body from the token endpoint
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Reqwest-backed [`TokenSource`]
pub struct HttpTokenSource {
    client: reqwest::Client,
    endpoint: String,
    service_secret: Option<String>,
}

impl HttpTokenSource {
    /// Build a token source from the provider configuration
    pub fn new(config: &TokenProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            service_secret: config.service_secret.clone(),
        })
    }
}

#[async_trait]
impl TokenSource for HttpTokenSource {
    async fn fetch(&self) -> std::result::Result<IssuedToken, ProviderError> {
        let secret = self
            .service_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ProviderError::new(
                    ProviderErrorKind::Unauthorized,
                    "token service secret is not configured",
                )
                .with_operation(OPERATION)
            })?;

        let response = self
            .client
            .post(&self.endpoint)
            .json(&TokenRequest {
                service_secret: secret,
            })
            .send()
            .await
            .map_err(|e| classify_transport(OPERATION, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::new(
                classify_status(status, &body),
                format!("token endpoint returned {}: {}", status, excerpt(&body)),
            )
            .with_operation(OPERATION));
        }

        let parsed: TokenResponse = response.json().await.map_err(|e| {
            ProviderError::new(
                ProviderErrorKind::InvalidResponse,
                format!("token endpoint sent unparseable JSON: {}", e),
            )
            .with_operation(OPERATION)
        })?;

        Ok(IssuedToken {
            access_token: parsed.access_token,
            expires_in: Duration::from_secs(parsed.expires_in),
        })
    }
}

/// Cached token plus the instant it stops being trusted
struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Get-or-refresh cache in front of a [`TokenSource`]
///
/// A token is handed out until `expires_in` minus the configured margin has
/// elapsed, then the next caller triggers a refresh. Clones share state, so
/// one cache can serve the whole process.
#[derive(Clone)]
pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    expiry_margin: Duration,
    state: Arc<tokio::sync::Mutex<Option<CachedToken>>>,
}

impl TokenCache {
    /// Create a cache over the given source
    pub fn new(source: Arc<dyn TokenSource>, expiry_margin: Duration) -> Self {
        Self {
            source,
            expiry_margin,
            state: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// Return the cached token, refreshing it first if stale or absent
    pub async fn get_or_refresh(&self) -> std::result::Result<String, ProviderError> {
        let mut state = self.state.lock().await;

        if let Some(cached) = state.as_ref()
            && Instant::now() < cached.refresh_at
        {
            return Ok(cached.token.clone());
        }

        let issued = self.source.fetch().await?;
        let lifetime = issued.expires_in.saturating_sub(self.expiry_margin);
        tracing::debug!(
            expires_in_secs = issued.expires_in.as_secs(),
            usable_secs = lifetime.as_secs(),
            "Refreshed speech access token"
        );

        *state = Some(CachedToken {
            token: issued.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(issued.access_token)
    }

    /// Drop the cached token so the next caller fetches a fresh one
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }
}
