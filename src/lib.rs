//! # lessoncast
//!
//! Backend library for generating daily language-lesson content: an LLM
//! writes a short passage per series, a TTS provider voices each line, and
//! everything lands durably in SQLite plus an audio blob store. Runs are
//! kicked off over a small authenticated HTTP trigger API.
//!
//! ## Design Philosophy
//!
//! lessoncast is designed to be:
//! - **Idempotent** - one lesson per series per day, enforced at the store
//! - **Sequential** - one logical thread of control per run, pacing external
//!   providers rather than hammering them
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Best-effort durable** - partial writes are rolled back with
//!   compensating cleanup, and cleanup failures are surfaced, never hidden
//!
//! ## Quick Start
//!
//! ```no_run
//! use lessoncast::{Config, Database, LessonOrchestrator, RunRequest, TriggerKind};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.server.api_secret = Some("change-me".to_string());
//!     config.validate()?;
//!
//!     let db = Database::new(&config.database_path).await?;
//!     let orchestrator = Arc::new(LessonOrchestrator::new(&config, db.clone())?);
//!
//!     // One manual run over every active series
//!     let report = orchestrator
//!         .run(&RunRequest::all_active(TriggerKind::Manual))
//!         .await?;
//!     println!("{}", report.summary());
//!
//!     // Or serve the HTTP trigger API
//!     lessoncast::api::start_api_server(orchestrator, db, Arc::new(config)).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Trigger API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Passage generation and parsing
pub mod generator;
/// Run coordination and time budgeting
pub mod orchestrator;
/// Outbound provider clients and trait seams
pub mod providers;
/// Outbound call pacing
pub mod rate_limit;
/// Retry logic with provider-aware delays
pub mod retry;
/// Audio blob storage and the lesson write transaction
pub mod storage;
/// Per-line speech synthesis and voice planning
pub mod synthesis;
/// Core types
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use error::{
    ApiError, DatabaseError, Error, GenerationError, ProviderError, ProviderErrorKind, Result,
    StorageError, ToHttpStatus,
};
pub use generator::ContentGenerator;
pub use orchestrator::{LessonOrchestrator, RunRequest, TimeBudget};
pub use storage::{AudioStore, LessonTransaction, PersistOutcome, PersistedLesson};
pub use synthesis::AudioSynthesizer;
pub use types::{
    Channel, ChannelId, Difficulty, GenerationLogEntry, Lesson, LessonId, NewSeries, Passage,
    RunReport, RunStatus, Sentence, SentenceId, Series, SeriesDisposition, SeriesId, SeriesReport,
    SeriesSelection, TranslatedPassage, TriggerKind,
};

/// Run the trigger API server with graceful signal handling.
///
/// Serves until a termination signal arrives, then closes the database pool.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use lessoncast::{Config, Database, LessonOrchestrator, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Arc::new(Config::default());
///     let db = Database::new(&config.database_path).await?;
///     let orchestrator = Arc::new(LessonOrchestrator::new(&config, db.clone())?);
///
///     run_with_shutdown(orchestrator, db, config).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(
    orchestrator: std::sync::Arc<LessonOrchestrator>,
    db: Database,
    config: std::sync::Arc<Config>,
) -> Result<()> {
    let server_db = db.clone();
    tokio::select! {
        result = api::start_api_server(orchestrator, server_db, config) => result?,
        _ = wait_for_signal() => {
            tracing::info!("Shutting down");
        }
    }
    db.close().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
