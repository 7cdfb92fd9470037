//! HTTP client for the text-generation provider.
//!
//! Speaks the Ollama-style generate API: `POST {endpoint}/api/generate` with
//! `{model, prompt, stream: false}`, answered by `{response}`.

use crate::config::TextProviderConfig;
use crate::error::{ProviderError, ProviderErrorKind, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{TextGenerator, classify_status, classify_transport, excerpt, retry_hint};

const OPERATION: &str = "text.generate";

/// Request body for the generate endpoint
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response body from the generate endpoint
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Reqwest-backed [`TextGenerator`]
pub struct HttpTextGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpTextGenerator {
    /// Build a client from the provider configuration
    pub fn new(config: &TextProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport(OPERATION, e))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            let kind = classify_status(status, &body);
            let mut err = ProviderError::new(
                kind,
                format!("text provider returned {}: {}", status, excerpt(&body)),
            )
            .with_operation(OPERATION);
            if let Some(hint) = retry_hint(&headers, &body) {
                err = err.with_retry_after(hint);
            }
            return Err(err);
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            ProviderError::new(
                ProviderErrorKind::InvalidResponse,
                format!("text provider sent unparseable JSON: {}", e),
            )
            .with_operation(OPERATION)
        })?;

        Ok(parsed.response)
    }
}
