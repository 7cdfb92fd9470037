//! Route handlers for the trigger API
//!
//! Handlers are organized by domain:
//! - [`generate`] — the generation trigger (POST and GET forms)
//! - [`runs`] — generation-log queries
//! - [`system`] — health and OpenAPI

use crate::types::{GenerationLogEntry, SeriesId, SeriesReport};
use serde::{Deserialize, Serialize};

mod generate;
mod runs;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use generate::*;
pub use runs::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /generate
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct GenerateRequest {
    /// Explicit series ids to process (at most 20); mutually exclusive with `batch`
    #[serde(default)]
    pub series_ids: Option<Vec<SeriesId>>,

    /// Batch tag (1-100) selecting every series carrying it
    #[serde(default)]
    pub batch: Option<u8>,

    /// Override of the configured default translation languages
    #[serde(default)]
    pub translation_languages: Option<Vec<String>>,
}

/// Query parameters for GET /generate
///
/// List-valued fields arrive comma-separated in query form.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct GenerateQuery {
    /// Comma-separated series UUIDs; mutually exclusive with `batch`
    pub series_ids: Option<String>,

    /// Batch tag (1-100)
    pub batch: Option<u8>,

    /// Comma-separated translation language codes
    pub translation_languages: Option<String>,

    /// Manual-trigger secret; consumed by the auth middleware
    pub secret: Option<String>,
}

/// Response for POST/GET /generate
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct GenerateResponse {
    /// False only when the whole run failed
    pub success: bool,

    /// One-line run summary
    pub message: String,

    /// Per-series outcomes in processing order
    pub results: Vec<SeriesReport>,

    /// Per-series error messages, verbatim; absent when there were none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// Query parameters for GET /runs
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RunsQuery {
    /// Maximum number of entries to return (default: 50, capped at 200)
    pub limit: Option<usize>,

    /// Number of entries to skip (default: 0)
    pub offset: Option<usize>,

    /// Manual-trigger secret; consumed by the auth middleware
    pub secret: Option<String>,
}

/// Response for GET /runs
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RunsResponse {
    /// Always true for 2xx responses
    pub success: bool,

    /// Number of entries in this page
    pub count: usize,

    /// Generation-log entries, newest first
    pub runs: Vec<GenerationLogEntry>,
}
