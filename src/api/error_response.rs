//! HTTP error response handling for the API
//!
//! Converts domain errors into the flat `{success, error, message}` envelope
//! with the status code from [`ToHttpStatus`].

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let api_error: ApiError = self.into();

        (status_code, Json(api_error)).into_response()
    }
}

/// Implement IntoResponse for ApiError for explicit error responses
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Bare ApiError values default to 500; errors with a known status go
        // through Error::into_response instead
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DatabaseError, ProviderError, ProviderErrorKind, StorageError};

    async fn envelope(response: Response) -> ApiError {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn validation_error_renders_400_envelope() {
        let error = Error::Validation("series_ids: at most 20 ids per request".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let api_error = envelope(response).await;
        assert!(!api_error.success);
        assert_eq!(api_error.error, "validation_error");
        assert!(api_error.message.contains("at most 20"));
    }

    #[tokio::test]
    async fn unauthorized_renders_401() {
        let error = Error::Unauthorized("missing or invalid trigger secret".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(envelope(response).await.error, "unauthorized");
    }

    #[tokio::test]
    async fn provider_failure_renders_502_with_operation_context() {
        let error = Error::Provider(
            ProviderError::new(ProviderErrorKind::Unavailable, "HTTP 503 from provider")
                .with_operation("speech.synthesize"),
        );
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let api_error = envelope(response).await;
        assert_eq!(api_error.error, "provider_error");
        assert!(api_error.message.contains("speech.synthesize"));
    }

    #[tokio::test]
    async fn rollback_failure_renders_500_with_cleanup_detail() {
        let error = Error::Storage(StorageError::TransactionFailed {
            reason: "audio upload failed for ch/ls/sentence_2.mp3: HTTP 500".to_string(),
            cleanup_errors: vec!["blob delete failed for ch/ls/sentence_0.mp3: timeout".to_string()],
        });
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let api_error = envelope(response).await;
        assert_eq!(api_error.error, "partial_write");
        assert!(api_error.message.contains("sentence_2.mp3"));
        assert!(api_error.message.contains("sentence_0.mp3"));
    }

    #[tokio::test]
    async fn database_error_renders_500() {
        let error = Error::Database(DatabaseError::QueryFailed("locked".to_string()));
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope(response).await.error, "database_error");
    }

    #[tokio::test]
    async fn bare_api_error_defaults_to_500() {
        let response = ApiError::internal("unexpected failure").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
