//! Generation-log query handlers.

use crate::api::AppState;
use crate::error::Result;
use axum::{
    Json,
    extract::{Query, State},
};

use super::{RunsQuery, RunsResponse};

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 200;

/// GET /runs - List recent generation runs
#[utoipa::path(
    get,
    path = "/api/v1/runs",
    tag = "runs",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum entries to return (default 50, capped at 200)"),
        ("offset" = Option<usize>, Query, description = "Entries to skip"),
        ("secret" = Option<String>, Query, description = "Manual-trigger secret")
    ),
    security(
        ("cron_secret" = []),
        ("api_secret" = [])
    ),
    responses(
        (status = 200, description = "Generation-log entries, newest first", body = RunsResponse),
        (status = 401, description = "Missing or invalid trigger secret", body = crate::error::ApiError)
    )
)]
pub async fn list_runs(
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<RunsResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = query.offset.unwrap_or(0);

    let runs = state.db.list_generation_logs(limit, offset).await?;

    Ok(Json(RunsResponse {
        success: true,
        count: runs.len(),
        runs,
    }))
}
