//! HTTP client for the audio blob store.
//!
//! Speaks a Supabase Storage-style object API: upload with
//! `POST {endpoint}/object/{bucket}/{path}` (raw bytes, bearer service key),
//! delete with `DELETE` on the same path. Public URLs live under
//! `{public_base}/{bucket}/{path}`, where `public_base` defaults to
//! `{endpoint}/object/public`.

use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use async_trait::async_trait;

use super::AudioStore;

/// Reqwest-backed [`AudioStore`]
pub struct HttpAudioStore {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    service_key: Option<String>,
    public_base: String,
}

impl HttpAudioStore {
    /// Build a store client from the storage configuration
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        let public_base = config
            .public_base
            .as_deref()
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("{endpoint}/object/public"));

        Ok(Self {
            client,
            endpoint,
            bucket: config.bucket.clone(),
            service_key: config.service_key.clone(),
            public_base,
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/object/{}/{}", self.endpoint, self.bucket, path)
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.service_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl AudioStore for HttpAudioStore {
    async fn upload(&self, path: &str, bytes: &[u8]) -> std::result::Result<(), StorageError> {
        let url = self.object_url(path);
        let response = self
            .with_auth(self.client.post(&url))
            .header(reqwest::header::CONTENT_TYPE, "audio/mpeg")
            // Allow re-running a partially rolled-back transaction to
            // overwrite an orphaned object instead of failing on it
            .header("x-upsert", "true")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::UploadFailed {
                path: path.to_string(),
                reason: format!("HTTP {}: {}", status, body.trim()),
            });
        }

        Ok(())
    }

    async fn delete(&self, path: &str) -> std::result::Result<(), StorageError> {
        let url = self.object_url(path);
        let response = self
            .with_auth(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        // 404 means the object is already gone, which is what delete wants
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::DeleteFailed {
                path: path.to_string(),
                reason: format!("HTTP {}: {}", status, body.trim()),
            });
        }

        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.public_base, self.bucket, path)
    }
}
