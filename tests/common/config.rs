//! Harness plumbing: a full pipeline over one wiremock server and a
//! temp-file database, with pacing shrunk so the suite stays fast.

use lessoncast::{Config, Database, LessonOrchestrator};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use wiremock::MockServer;

/// Bearer secret accepted for scheduled triggers
pub const CRON_SECRET: &str = "it-cron-secret";
/// Header/query secret accepted for manual triggers
pub const API_SECRET: &str = "it-api-secret";

/// Everything a scenario needs: the mock provider server, the database,
/// and an orchestrator wired over real HTTP clients.
pub struct TestHarness {
    pub server: MockServer,
    pub db: Database,
    pub config: Config,
    pub orchestrator: Arc<LessonOrchestrator>,
    _db_file: NamedTempFile,
}

/// Build a harness with the default fast configuration
pub async fn harness() -> TestHarness {
    harness_with(|_| {}).await
}

/// Build a harness, letting the caller tweak the configuration first
pub async fn harness_with(tweak: impl FnOnce(&mut Config)) -> TestHarness {
    let server = MockServer::start().await;
    let db_file = NamedTempFile::new().expect("temp database file");
    let db = Database::new(db_file.path()).await.expect("open database");

    let mut config = fast_config(&server);
    tweak(&mut config);

    let orchestrator =
        Arc::new(LessonOrchestrator::new(&config, db.clone()).expect("build orchestrator"));

    TestHarness {
        server,
        db,
        config,
        orchestrator,
        _db_file: db_file,
    }
}

/// Point every provider endpoint at the mock server and collapse retry
/// backoff, synthesis pacing, and inter-series pauses to near zero
pub fn fast_config(server: &MockServer) -> Config {
    let mut config = Config::default();

    config.server.cron_secret = Some(CRON_SECRET.to_string());
    config.server.api_secret = Some(API_SECRET.to_string());

    config.text.endpoint = server.uri();
    config.text.model = "test-model".to_string();
    config.text.max_retries = 1;
    config.text.base_delay = Duration::from_millis(5);

    config.speech.endpoint = server.uri();
    config.speech.max_retries = 1;
    config.speech.base_delay = Duration::from_millis(5);
    // 1ms pacing gap between synthesis calls
    config.speech.requests_per_minute = 60_000;
    config.speech.rate_buffer = Duration::ZERO;

    config.token.endpoint = format!("{}/token", server.uri());
    config.token.service_secret = Some("it-token-secret".to_string());

    config.storage.endpoint = server.uri();
    config.storage.service_key = Some("it-service-key".to_string());

    config.run.series_pause = Duration::ZERO;
    config.run.language_pause = Duration::ZERO;

    config
}
