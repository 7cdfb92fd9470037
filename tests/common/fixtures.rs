//! Wiremock doubles for the four provider endpoints, plus database seeds
//! and request-counting helpers.

use base64::Engine;
use lessoncast::Database;
use lessoncast::types::{NewSeries, SeriesId};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Five-line passage in the shape the text provider returns: a title line
/// followed by the content lines.
pub const PASSAGE: &str = "Morning Trains\n\
The train arrives at seven every single day.\n\
We stand together on the crowded platform.\n\
Everyone boards quickly before the doors close.\n\
A child waves at the driver from the window.\n\
The city slides past in the early light.";

/// Japanese rendition with the same title-plus-five-lines shape
pub const PASSAGE_JA: &str = "朝の電車\n\
電車は毎日7時に来ます。\n\
混んだホームに一緒に立ちます。\n\
ドアが閉まる前にみんな乗ります。\n\
子供が窓から運転士に手を振ります。\n\
朝の光の中を街が流れていきます。";

/// Token exchange always hands out one long-lived credential
pub async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "it-access-token",
            "expires_in": 3600,
        })))
        .mount(server)
        .await;
}

/// Text provider answering translation prompts per language, and passage
/// prompts with `passage`. Translation mocks are mounted first so they win
/// over the catch-all passage mock.
pub async fn mount_text_provider(
    server: &MockServer,
    passage: &str,
    translations: &[(&str, &str)],
) {
    for (language_name, text) in translations {
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_string_contains(format!("natural {language_name}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "response": text })),
            )
            .mount(server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": passage })))
        .mount(server)
        .await;
}

/// Speech provider returning the same small clip for every line
pub async fn mount_speech_provider(server: &MockServer) {
    let audio = base64::engine::general_purpose::STANDARD.encode(b"it-mp3-bytes");
    Mock::given(method("POST"))
        .and(path("/text:synthesize"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "audioContent": audio })),
        )
        .mount(server)
        .await;
}

/// Blob store accepting every upload and delete
pub async fn mount_blob_store(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path_regex("^/object/lesson-audio/.+"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex("^/object/lesson-audio/.+"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

/// Mount the full happy-path provider set
pub async fn mount_all_providers(
    server: &MockServer,
    passage: &str,
    translations: &[(&str, &str)],
) {
    mount_token_endpoint(server).await;
    mount_text_provider(server, passage, translations).await;
    mount_speech_provider(server).await;
    mount_blob_store(server).await;
}

/// Insert an active series and return its id
pub async fn seed_series(db: &Database, name: &str, line_count: u32) -> SeriesId {
    db.insert_series(&NewSeries {
        name: name.to_string(),
        concept: "scenes from a daily train commute".to_string(),
        line_count,
        active: true,
        ..NewSeries::default()
    })
    .await
    .expect("insert series")
}

/// Count recorded requests by method and path prefix
pub async fn count_requests(server: &MockServer, method_name: &str, path_prefix: &str) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .filter(|request| {
            request.method.to_string() == method_name
                && request.url.path().starts_with(path_prefix)
        })
        .count()
}
