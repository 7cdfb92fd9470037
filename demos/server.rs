//! Trigger API server example
//!
//! This example runs the lessoncast HTTP trigger API, allowing generation
//! runs to be kicked off over HTTP.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:8790/swagger-ui
//! - Trigger a run via POST http://localhost:8790/api/v1/generate
//!   (with `Authorization: Bearer local-cron-secret` or `X-Api-Secret: local-api-secret`)
//! - Inspect past runs via GET http://localhost:8790/api/v1/runs
//! - Check liveness via GET http://localhost:8790/api/v1/health

use lessoncast::{Config, Database, LessonOrchestrator};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let mut config = Config::default();

    // Trigger secrets; both kinds enabled for local experimentation
    config.server.cron_secret = Some("local-cron-secret".to_string());
    config.server.api_secret = Some("local-api-secret".to_string());

    // Point the providers at your local stack
    config.text.endpoint = "http://localhost:11434".to_string();
    config.text.model = "gemma3".to_string();
    config.token.endpoint = "http://localhost:9090/token".to_string();
    config.token.service_secret = Some("local-token-secret".to_string());
    config.speech.endpoint = "http://localhost:9091".to_string();
    config.storage.endpoint = "http://localhost:54321/storage/v1".to_string();
    config.storage.service_key = Some("local-service-key".to_string());

    config.database_path = "lessoncast.db".into();
    config.validate()?;

    let db = Database::new(&config.database_path).await?;
    let orchestrator = Arc::new(LessonOrchestrator::new(&config, db.clone())?);

    println!("Trigger API listening on http://{}", config.server.bind_address);
    println!("Swagger UI at http://{}/swagger-ui", config.server.bind_address);

    // Serves until SIGINT/SIGTERM, then closes the database pool
    lessoncast::run_with_shutdown(orchestrator, db, Arc::new(config)).await?;

    Ok(())
}
