//! Error types for lessoncast
//!
//! This module provides comprehensive error handling for the library, including:
//! - Domain-specific error types (Provider, Generation, Storage, Database)
//! - Tagged provider error kinds assigned where the HTTP status is known,
//!   so retry classification never depends on message text
//! - HTTP status code mapping for API integration
//! - The flat `{success, error, message}` envelope returned by the API

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for lessoncast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for lessoncast
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "speech.requests_per_minute")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// External provider call failed (text generation, speech synthesis, token fetch)
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Passage generation or parsing failed
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Blob storage or lesson transaction failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Request validation failed before any external call
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or incorrect trigger secret
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to bootstrap the schema
    #[error("failed to initialize schema: {0}")]
    SchemaFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),

    /// Constraint violation (e.g., duplicate key)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Classification of a failed provider call.
///
/// The kind is assigned at the point the HTTP status or transport error is
/// observed, never recovered from message text afterwards. Retry decisions
/// key off the kind alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Bad or missing credentials (401/403) - never retried
    Unauthorized,
    /// The request itself was rejected (400/422) - never retried
    InvalidRequest,
    /// The requested resource or model does not exist (404) - never retried
    NotFound,
    /// Too many requests (429)
    RateLimited,
    /// Quota exhausted for the current window (429 with quota wording)
    QuotaExhausted,
    /// Provider overloaded or down (5xx)
    Unavailable,
    /// The request timed out
    Timeout,
    /// Transport-level failure (connect, DNS, TLS)
    Network,
    /// The provider answered 2xx but the body was unusable - never retried
    InvalidResponse,
}

impl ProviderErrorKind {
    /// Human-readable label used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            ProviderErrorKind::Unauthorized => "unauthorized",
            ProviderErrorKind::InvalidRequest => "invalid request",
            ProviderErrorKind::NotFound => "not found",
            ProviderErrorKind::RateLimited => "rate limited",
            ProviderErrorKind::QuotaExhausted => "quota exhausted",
            ProviderErrorKind::Unavailable => "service unavailable",
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::Network => "network failure",
            ProviderErrorKind::InvalidResponse => "invalid response",
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Error from an external provider call, carrying its classification.
///
/// `retry_after` holds the provider's own suggested wait when one was present
/// (a `Retry-After` header or "retry in N seconds" text), extracted where the
/// response was read. `operation` is filled in by the retry wrapper so
/// surfaced errors name the operation that exhausted its retries.
#[derive(Clone, Debug, Error)]
#[error("{}{kind}: {message}", operation.as_ref().map(|op| format!("{op}: ")).unwrap_or_default())]
pub struct ProviderError {
    /// Classification assigned where the failure was observed
    pub kind: ProviderErrorKind,
    /// Human-readable description of the failure
    pub message: String,
    /// Operation name attached by the retry wrapper
    pub operation: Option<String>,
    /// Provider-suggested wait before the next attempt
    pub retry_after: Option<Duration>,
}

impl ProviderError {
    /// Create a new provider error with the given kind and message
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            operation: None,
            retry_after: None,
        }
    }

    /// Attach the operation name this error surfaced from
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Attach a provider-suggested wait duration
    #[must_use]
    pub fn with_retry_after(mut self, wait: Duration) -> Self {
        self.retry_after = Some(wait);
        self
    }
}

/// Passage generation and parsing errors
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The provider returned no text at all
    #[error("provider returned an empty response for {operation}")]
    EmptyResponse {
        /// The generation operation that came back empty (e.g., "passage generation")
        operation: String,
    },

    /// The response contained text but no usable lines survived filtering
    #[error("no usable lines after parsing {operation} output")]
    NoContentLines {
        /// The generation operation whose output could not be parsed
        operation: String,
    },
}

/// Blob storage and lesson transaction errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Uploading an audio artifact failed
    #[error("audio upload failed for {path}: {reason}")]
    UploadFailed {
        /// Blob path of the artifact that failed to upload
        path: String,
        /// The reason the upload failed
        reason: String,
    },

    /// Deleting a blob artifact failed
    #[error("blob delete failed for {path}: {reason}")]
    DeleteFailed {
        /// Blob path of the artifact that failed to delete
        path: String,
        /// The reason the delete failed
        reason: String,
    },

    /// A multi-step lesson write failed and was rolled back.
    ///
    /// `cleanup_errors` lists every compensating deletion that itself failed,
    /// so operators can reconcile orphaned artifacts out-of-band.
    #[error("lesson write rolled back: {reason}{}", format_cleanup_errors(cleanup_errors))]
    TransactionFailed {
        /// The failure that triggered the rollback
        reason: String,
        /// Compensating deletions that failed, one message per artifact
        cleanup_errors: Vec<String>,
    },
}

fn format_cleanup_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(" (cleanup failures: {})", errors.join("; "))
    }
}

/// API error response envelope
///
/// Every non-2xx response from the API uses this flat shape.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "success": false,
///   "error": "validation_error",
///   "message": "series_ids: at most 20 ids per request"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Always false for error responses
    pub success: bool,

    /// Machine-readable error code (e.g., "validation_error", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: code.into(),
            message: message.into(),
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - rejected before any external call
            Error::Validation(_) => 400,

            // 401 Unauthorized - bad or missing trigger secret
            Error::Unauthorized(_) => 401,

            // 404 Not Found
            Error::NotFound(_) => 404,
            Error::Database(DatabaseError::NotFound(_)) => 404,

            // 409 Conflict - uniqueness backstop fired
            Error::Database(DatabaseError::ConstraintViolation(_)) => 409,

            // 502 Bad Gateway - upstream provider failures
            Error::Provider(_) => 502,
            Error::Generation(_) => 502,
            Error::Network(_) => 502,
            Error::Storage(StorageError::UploadFailed { .. }) => 502,
            Error::Storage(StorageError::DeleteFailed { .. }) => 502,

            // 500 Internal Server Error
            Error::Config { .. } => 500,
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Storage(StorageError::TransactionFailed { .. }) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(DatabaseError::NotFound(_)) => "not_found",
            Error::Database(DatabaseError::ConstraintViolation(_)) => "conflict",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Provider(_) => "provider_error",
            Error::Generation(e) => match e {
                GenerationError::EmptyResponse { .. } => "empty_generation",
                GenerationError::NoContentLines { .. } => "unparseable_generation",
            },
            Error::Storage(e) => match e {
                StorageError::UploadFailed { .. } => "audio_upload_failed",
                StorageError::DeleteFailed { .. } => "blob_delete_failed",
                StorageError::TransactionFailed { .. } => "partial_write",
            },
            Error::Validation(_) => "validation_error",
            Error::Unauthorized(_) => "unauthorized",
            Error::NotFound(_) => "not_found",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError::new(error.error_code().to_string(), error.to_string())
    }
}
