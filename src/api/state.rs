//! Application state for the trigger API server

use crate::config::Config;
use crate::db::Database;
use crate::orchestrator::LessonOrchestrator;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned per request (cheap Arc clones).
#[derive(Clone)]
pub struct AppState {
    /// The run coordinator triggers dispatch into
    pub orchestrator: Arc<LessonOrchestrator>,

    /// Database handle for read-only operator queries
    pub db: Database,

    /// Configuration (read access)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(orchestrator: Arc<LessonOrchestrator>, db: Database, config: Arc<Config>) -> Self {
        Self {
            orchestrator,
            db,
            config,
        }
    }
}
