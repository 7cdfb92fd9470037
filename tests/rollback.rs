//! Failure-injection tests: provider errors mid-pipeline and the
//! compensating cleanup that keeps the database and blob store consistent.

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use chrono::NaiveDate;
use common::{
    PASSAGE, PASSAGE_JA, count_requests, harness, mount_speech_provider, mount_text_provider,
    mount_token_endpoint, seed_series,
};
use lessoncast::RunRequest;
use lessoncast::types::{RunStatus, SeriesDisposition, SeriesSelection, TriggerKind};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn lesson_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn run_request(series_id: lessoncast::types::SeriesId) -> RunRequest {
    RunRequest {
        trigger: TriggerKind::Manual,
        selection: SeriesSelection::Ids(vec![series_id]),
        translation_languages: None,
        date: Some(lesson_date()),
    }
}

/// Blob store that accepts the first `successes` uploads, then rejects the
/// rest. Deletes always succeed and are counted via the mock expectation.
async fn mount_failing_blob_store(server: &MockServer, successes: u64, expected_deletes: u64) {
    Mock::given(method("POST"))
        .and(path_regex("^/object/lesson-audio/.+"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(successes)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex("^/object/lesson-audio/.+"))
        .respond_with(ResponseTemplate::new(500).set_body_string("disk quota exceeded"))
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex("^/object/lesson-audio/.+"))
        .respond_with(ResponseTemplate::new(200))
        .expect(expected_deletes)
        .mount(server)
        .await;
}

#[tokio::test]
async fn upload_failure_mid_lesson_rolls_back_rows_and_uploaded_blobs() {
    let h = harness().await;
    mount_token_endpoint(&h.server).await;
    mount_text_provider(&h.server, PASSAGE, &[("Japanese", PASSAGE_JA)]).await;
    mount_speech_provider(&h.server).await;
    // Third upload fails; the two already-stored blobs must be deleted
    mount_failing_blob_store(&h.server, 2, 2).await;

    let series_id = seed_series(&h.db, "Commute", 5).await;
    let report = h.orchestrator.run(&run_request(series_id)).await.unwrap();

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.lessons_created, 0);
    assert_eq!(report.audio_files_generated, 0);
    assert!(report.errors[0].starts_with("Commute:"), "{:?}", report.errors);
    assert!(
        report.errors[0].contains("HTTP 500"),
        "error should carry the store response: {:?}",
        report.errors
    );
    assert!(matches!(
        report.reports[0].disposition,
        SeriesDisposition::Failed { .. }
    ));

    // The lesson row (and its children, via cascade) are gone, so the next
    // run for this date starts from scratch
    let series = h.db.get_series(series_id).await.unwrap().unwrap();
    let channel = h.db.get_or_create_channel(&series).await.unwrap();
    assert!(!h.db.lesson_exists(channel.id, lesson_date()).await.unwrap());

    let logs = h.db.list_generation_logs(10, 0).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, RunStatus::Failed);
    assert_eq!(logs[0].errors, report.errors);
}

#[tokio::test]
async fn transient_text_provider_failure_is_retried_to_success() {
    let h = harness().await;
    // First generate call returns 503, the retry succeeds
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    mount_token_endpoint(&h.server).await;
    mount_text_provider(&h.server, PASSAGE, &[("Japanese", PASSAGE_JA)]).await;
    mount_speech_provider(&h.server).await;
    Mock::given(method("POST"))
        .and(path_regex("^/object/lesson-audio/.+"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&h.server)
        .await;

    let series_id = seed_series(&h.db, "Commute", 5).await;
    let report = h.orchestrator.run(&run_request(series_id)).await.unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.lessons_created, 1);
    // 503 + retried passage prompt + translation prompt
    assert_eq!(count_requests(&h.server, "POST", "/api/generate").await, 3);
}

#[tokio::test]
async fn synthesis_rejection_fails_the_series_before_anything_is_written() {
    let h = harness().await;
    mount_token_endpoint(&h.server).await;
    mount_text_provider(&h.server, PASSAGE, &[("Japanese", PASSAGE_JA)]).await;
    // Non-retryable rejection from the speech provider
    Mock::given(method("POST"))
        .and(path("/text:synthesize"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unsupported voice"))
        .mount(&h.server)
        .await;

    let series_id = seed_series(&h.db, "Commute", 5).await;
    let report = h.orchestrator.run(&run_request(series_id)).await.unwrap();

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.errors[0].starts_with("Commute:"), "{:?}", report.errors);

    // Synthesis happens before persistence: no lesson row, no uploads
    let series = h.db.get_series(series_id).await.unwrap().unwrap();
    let channel = h.db.get_or_create_channel(&series).await.unwrap();
    assert!(!h.db.lesson_exists(channel.id, lesson_date()).await.unwrap());
    assert_eq!(
        count_requests(&h.server, "POST", "/object/lesson-audio/").await,
        0
    );
}
