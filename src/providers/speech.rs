//! HTTP client for the speech-synthesis provider.
//!
//! Speaks the Cloud TTS-style API: `POST {endpoint}/text:synthesize` with
//! `{input: {text, prompt}, voice: {languageCode, name, modelName},
//! audioConfig: {audioEncoding}}`, answered by base64 `audioContent`.
//! Authentication uses short-lived bearer tokens from a [`TokenCache`].

use crate::config::SpeechProviderConfig;
use crate::error::{ProviderError, ProviderErrorKind, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::token::TokenCache;
use super::{SpeechSynthesizer, classify_status, classify_transport, excerpt, retry_hint};

const OPERATION: &str = "speech.synthesize";

/// Request body for the synthesize endpoint
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig<'a>,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
    model_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig<'a> {
    audio_encoding: &'a str,
}

/// Response body from the synthesize endpoint
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

/// Reqwest-backed [`SpeechSynthesizer`]
pub struct HttpSpeechSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    model_name: String,
    language_code: String,
    audio_encoding: String,
    tokens: TokenCache,
}

impl HttpSpeechSynthesizer {
    /// Build a client from the provider configuration and token cache
    pub fn new(config: &SpeechProviderConfig, tokens: TokenCache) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model_name: config.model_name.clone(),
            language_code: config.language_code.clone(),
            audio_encoding: config.audio_encoding.clone(),
            tokens,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        style_prompt: Option<&str>,
    ) -> std::result::Result<Vec<u8>, ProviderError> {
        let token = self.tokens.get_or_refresh().await?;

        let url = format!("{}/text:synthesize", self.endpoint);
        let body = SynthesizeRequest {
            input: SynthesisInput {
                text,
                prompt: style_prompt,
            },
            voice: VoiceSelection {
                language_code: &self.language_code,
                name: voice,
                model_name: &self.model_name,
            },
            audio_config: AudioConfig {
                audio_encoding: &self.audio_encoding,
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(OPERATION, e))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            let kind = classify_status(status, &body);
            if kind == ProviderErrorKind::Unauthorized {
                // The token may simply have expired server-side; drop it so
                // the retry attempt fetches a fresh one.
                self.tokens.invalidate().await;
            }
            let mut err = ProviderError::new(
                kind,
                format!("speech provider returned {}: {}", status, excerpt(&body)),
            )
            .with_operation(OPERATION);
            if let Some(hint) = retry_hint(&headers, &body) {
                err = err.with_retry_after(hint);
            }
            return Err(err);
        }

        let parsed: SynthesizeResponse = response.json().await.map_err(|e| {
            ProviderError::new(
                ProviderErrorKind::InvalidResponse,
                format!("speech provider sent unparseable JSON: {}", e),
            )
            .with_operation(OPERATION)
        })?;

        let encoded = parsed.audio_content.ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::InvalidResponse,
                "speech provider response is missing audioContent",
            )
            .with_operation(OPERATION)
        })?;

        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| {
                ProviderError::new(
                    ProviderErrorKind::InvalidResponse,
                    format!("audioContent is not valid base64: {}", e),
                )
                .with_operation(OPERATION)
            })
    }
}
