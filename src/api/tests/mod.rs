//! Router tests for the trigger API.
//!
//! Each test builds a full router over fake providers, a fake audio store,
//! and a temp-file database, then drives it with `tower::ServiceExt::oneshot`.

use crate::api::create_router;
use crate::config::Config;
use crate::db::Database;
use crate::error::ProviderErrorKind;
use crate::orchestrator::LessonOrchestrator;
use crate::test_support::{FakeAudioStore, FakeSynthesizer, ScriptedTextProvider};
use crate::types::{NewSeries, SeriesId};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tower::ServiceExt; // for oneshot


const CRON_SECRET: &str = "cron-secret";
const API_SECRET: &str = "api-secret";

const PASSAGE: &str = "Morning Trains\n\
                       The train arrives at seven every single day.\n\
                       We stand together on the crowded platform.\n\
                       Everyone boards quickly before the doors close.";
const PASSAGE_JA: &str =
    "朝の電車\n電車は毎日7時に来ます。\n混んだホームに一緒に立ちます。\nドアが閉まる前にみんな乗ります。";

struct TestApi {
    router: Router,
    db: Database,
    store: FakeAudioStore,
    _db_file: NamedTempFile,
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.server.cron_secret = Some(CRON_SECRET.to_string());
    config.server.api_secret = Some(API_SECRET.to_string());
    config.run.series_pause = Duration::ZERO;
    config.run.language_pause = Duration::ZERO;
    config
}

async fn test_api(text_responses: Vec<Result<String, ProviderErrorKind>>) -> TestApi {
    test_api_with_config(test_config(), text_responses).await
}

async fn test_api_with_config(
    config: Config,
    text_responses: Vec<Result<String, ProviderErrorKind>>,
) -> TestApi {
    let db_file = NamedTempFile::new().unwrap();
    let db = Database::new(db_file.path()).await.unwrap();
    let store = FakeAudioStore::new();

    let orchestrator = LessonOrchestrator::with_components(
        &config,
        db.clone(),
        Arc::new(ScriptedTextProvider::new(text_responses)),
        Arc::new(FakeSynthesizer::new()),
        Arc::new(store.clone()),
    );

    let router = create_router(Arc::new(orchestrator), db.clone(), Arc::new(config));

    TestApi {
        router,
        db,
        store,
        _db_file: db_file,
    }
}

async fn seed_series(db: &Database, name: &str) -> SeriesId {
    db.insert_series(&NewSeries {
        name: name.to_string(),
        concept: "commuter trains".to_string(),
        line_count: 3,
        ..NewSeries::default()
    })
    .await
    .unwrap()
}

/// One-shot a request and return status plus parsed JSON body
async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_generate(body: &serde_json::Value, auth_header: Option<(&str, &str)>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/generate")
        .header("content-type", "application/json");
    if let Some((name, value)) = auth_header {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
