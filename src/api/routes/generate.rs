//! Generation trigger handlers.

use crate::api::AppState;
use crate::error::{Error, Result};
use crate::orchestrator::RunRequest;
use crate::types::{RunStatus, SeriesId, SeriesSelection, TriggerKind};
use axum::{
    Extension, Json,
    extract::{Query, State},
};

use super::{GenerateQuery, GenerateRequest, GenerateResponse};

/// POST /generate - Trigger a generation run
#[utoipa::path(
    post,
    path = "/api/v1/generate",
    tag = "generate",
    request_body = GenerateRequest,
    security(
        ("cron_secret" = []),
        ("api_secret" = [])
    ),
    responses(
        (status = 200, description = "Run finished; per-series outcomes in the body", body = GenerateResponse),
        (status = 400, description = "Validation failure", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid trigger secret", body = crate::error::ApiError),
        (status = 500, description = "Run failed before any series could be resolved", body = crate::error::ApiError)
    )
)]
pub async fn trigger_generation(
    State(state): State<AppState>,
    Extension(trigger): Extension<TriggerKind>,
    body: Option<Json<GenerateRequest>>,
) -> Result<Json<GenerateResponse>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    run_trigger(
        &state,
        trigger,
        body.series_ids,
        body.batch,
        body.translation_languages,
    )
    .await
}

/// GET /generate - Trigger a generation run (manual testing form)
#[utoipa::path(
    get,
    path = "/api/v1/generate",
    tag = "generate",
    params(
        ("series_ids" = Option<String>, Query, description = "Comma-separated series UUIDs (at most 20)"),
        ("batch" = Option<u8>, Query, description = "Batch tag (1-100)"),
        ("translation_languages" = Option<String>, Query, description = "Comma-separated language codes"),
        ("secret" = Option<String>, Query, description = "Manual-trigger secret")
    ),
    responses(
        (status = 200, description = "Run finished; per-series outcomes in the body", body = GenerateResponse),
        (status = 400, description = "Validation failure", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid trigger secret", body = crate::error::ApiError)
    )
)]
pub async fn trigger_generation_get(
    State(state): State<AppState>,
    Extension(trigger): Extension<TriggerKind>,
    Query(query): Query<GenerateQuery>,
) -> Result<Json<GenerateResponse>> {
    let series_ids = query
        .series_ids
        .as_deref()
        .map(parse_id_list)
        .transpose()?;
    let translation_languages = query
        .translation_languages
        .as_deref()
        .map(parse_language_list);

    run_trigger(&state, trigger, series_ids, query.batch, translation_languages).await
}

async fn run_trigger(
    state: &AppState,
    trigger: TriggerKind,
    series_ids: Option<Vec<SeriesId>>,
    batch: Option<u8>,
    translation_languages: Option<Vec<String>>,
) -> Result<Json<GenerateResponse>> {
    let selection = build_selection(series_ids, batch)?;

    let request = RunRequest {
        trigger,
        selection,
        translation_languages,
        date: None,
    };

    let report = state.orchestrator.run(&request).await?;

    Ok(Json(GenerateResponse {
        success: report.status != RunStatus::Failed,
        message: report.summary(),
        results: report.reports,
        errors: if report.errors.is_empty() {
            None
        } else {
            Some(report.errors)
        },
    }))
}

/// Validate the series selection: explicit ids and batch are mutually
/// exclusive; neither means all active series.
fn build_selection(
    series_ids: Option<Vec<SeriesId>>,
    batch: Option<u8>,
) -> Result<SeriesSelection> {
    match (series_ids, batch) {
        (Some(_), Some(_)) => Err(Error::Validation(
            "series_ids and batch are mutually exclusive".to_string(),
        )),
        (Some(ids), None) if ids.is_empty() => Err(Error::Validation(
            "series_ids: must not be empty".to_string(),
        )),
        (Some(ids), None) if ids.len() > 20 => Err(Error::Validation(
            "series_ids: at most 20 ids per request".to_string(),
        )),
        (Some(ids), None) => Ok(SeriesSelection::Ids(ids)),
        (None, Some(batch)) if !(1..=100).contains(&batch) => Err(Error::Validation(
            "batch: must be between 1 and 100".to_string(),
        )),
        (None, Some(batch)) => Ok(SeriesSelection::Batch(batch)),
        (None, None) => Ok(SeriesSelection::All),
    }
}

fn parse_id_list(raw: &str) -> Result<Vec<SeriesId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<SeriesId>()
                .map_err(|_| Error::Validation(format!("series_ids: invalid UUID '{s}'")))
        })
        .collect()
}

fn parse_language_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
