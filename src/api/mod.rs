//! Trigger API server module
//!
//! Exposes the generation trigger, the generation log, and a health probe
//! over an OpenAPI 3.1 documented REST surface.

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::orchestrator::LessonOrchestrator;
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Generation
/// - `POST /api/v1/generate` - Trigger a generation run (JSON body)
/// - `GET /api/v1/generate` - Trigger a run with query parameters (manual testing)
///
/// ## Generation Log
/// - `GET /api/v1/runs` - Recent runs, paginated, newest first
///
/// ## System
/// - `GET /api/v1/health` - Health check (no auth)
/// - `GET /api/v1/openapi.json` - OpenAPI specification (no auth)
/// - `GET /swagger-ui` - Interactive documentation (if enabled)
///
/// Trigger routes require either the cron secret (`Authorization: Bearer`)
/// or the API secret (`X-Api-Secret` header or `?secret=`); any other
/// method on a known path yields 405.
pub fn create_router(
    orchestrator: Arc<LessonOrchestrator>,
    db: Database,
    config: Arc<Config>,
) -> Router {
    let state = AppState::new(orchestrator, db, config.clone());
    let secrets = auth::TriggerSecrets::from_config(&config.server);

    // Trigger surface, gated by the dual-secret middleware
    let protected = Router::new()
        .route(
            "/api/v1/generate",
            post(routes::trigger_generation).get(routes::trigger_generation_get),
        )
        .route("/api/v1/runs", get(routes::list_runs))
        .layer(middleware::from_fn_with_state(
            secrets,
            auth::require_trigger_secret,
        ));

    // Probes and documentation stay reachable without credentials
    let public = Router::new()
        .route("/api/v1/health", get(routes::health_check))
        .route("/api/v1/openapi.json", get(routes::openapi_spec));

    let router = Router::new().merge(protected).merge(public);

    // Merge Swagger UI routes if enabled in config (before applying state).
    // The UI gets its own spec path so it cannot collide with the
    // /api/v1/openapi.json route defined above.
    let router = if config.server.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    // Add state to all routes
    let router = router.with_state(state);

    // Apply rate limiting middleware if enabled in config (outermost, runs
    // before auth in Axum's onion model since it is applied last)
    let router = if config.server.rate_limit.enabled {
        let limiter = Arc::new(rate_limit::IpRateLimiter::new(
            config.server.rate_limit.clone(),
        ));
        router.layer(middleware::from_fn_with_state(
            limiter,
            rate_limit::rate_limit_middleware,
        ))
    } else {
        router
    };

    // Apply CORS middleware if enabled in config
    if config.server.cors_enabled {
        let cors = build_cors_layer(&config.server.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// Supports "*" for any origin; otherwise only the listed origins are
/// allowed, with all methods and headers.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Binds a TCP listener and serves the router until shutdown. Must use
/// `into_make_service_with_connect_info` so the rate limiting middleware
/// can see client addresses.
pub async fn start_api_server(
    orchestrator: Arc<LessonOrchestrator>,
    db: Database,
    config: Arc<Config>,
) -> Result<()> {
    let bind_address = config.server.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(orchestrator, db, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
