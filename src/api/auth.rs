//! Trigger authentication middleware.
//!
//! Two secrets gate the trigger surface: the cron secret, presented as
//! `Authorization: Bearer <secret>`, marks a scheduled trigger; the API
//! secret, presented as an `X-Api-Secret` header or a `secret` query
//! parameter, marks a manual one. All comparisons are constant-time. The
//! matched [`TriggerKind`] is inserted as a request extension for handlers.

use crate::error::ApiError;
use crate::types::TriggerKind;
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The secrets the middleware authenticates against
#[derive(Clone, Default)]
pub struct TriggerSecrets {
    /// Scheduled-trigger secret (`Authorization: Bearer`)
    pub cron_secret: Option<String>,
    /// Manual-trigger secret (`X-Api-Secret` header or `?secret=`)
    pub api_secret: Option<String>,
}

impl TriggerSecrets {
    /// Pull both secrets out of server configuration
    pub fn from_config(config: &crate::config::ServerConfig) -> Self {
        Self {
            cron_secret: config.cron_secret.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    /// Classify a request's credentials, bearer checked first
    fn classify(&self, request: &Request) -> Option<TriggerKind> {
        if let Some(bearer) = bearer_token(request)
            && self.matches(self.cron_secret.as_deref(), bearer)
        {
            return Some(TriggerKind::Scheduled);
        }

        let manual = header_secret(request).or_else(|| query_secret(request));
        if let Some(provided) = manual
            && self.matches(self.api_secret.as_deref(), &provided)
        {
            return Some(TriggerKind::Manual);
        }

        None
    }

    fn matches(&self, expected: Option<&str>, provided: &str) -> bool {
        match expected {
            Some(expected) if !expected.is_empty() => {
                constant_time_eq(expected.as_bytes(), provided.as_bytes())
            }
            _ => false,
        }
    }
}

/// Authentication middleware for the trigger routes
///
/// Rejects with a 401 envelope unless one of the configured secrets
/// matches; on success the request proceeds carrying its [`TriggerKind`]
/// extension.
pub async fn require_trigger_secret(
    State(secrets): State<TriggerSecrets>,
    mut request: Request,
    next: Next,
) -> Response {
    match secrets.classify(&request) {
        Some(kind) => {
            request.extensions_mut().insert(kind);
            next.run(request).await
        }
        None => {
            tracing::warn!(
                path = request.uri().path(),
                "Rejected trigger request with missing or invalid secret"
            );
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiError::unauthorized("missing or invalid trigger secret")),
            )
                .into_response()
        }
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn header_secret(request: &Request) -> Option<String> {
    request
        .headers()
        .get("x-api-secret")?
        .to_str()
        .ok()
        .map(str::to_string)
}

fn query_secret(request: &Request) -> Option<String> {
    let query = request.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "secret")
        .map(|(_, value)| value.into_owned())
}

/// Constant-time byte comparison to prevent timing side-channel attacks.
/// Always compares all bytes regardless of where the first mismatch occurs.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
