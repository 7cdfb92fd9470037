//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the lessoncast trigger API using
//! utoipa for compile-time spec generation.
//!
//! The spec can be accessed via:
//! - `/api/v1/openapi.json` - JSON format OpenAPI specification
//! - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI documentation for the lessoncast trigger API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "lessoncast trigger API",
        version = "0.2.0",
        description = "HTTP trigger surface for the daily language-lesson generation orchestrator",
        contact(
            name = "lessoncast",
            url = "https://github.com/lessoncast/lessoncast"
        ),
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8790", description = "Local development server")
    ),
    paths(
        // Generation triggers
        crate::api::routes::trigger_generation,
        crate::api::routes::trigger_generation_get,

        // Generation log
        crate::api::routes::list_runs,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::error::ApiError,
        crate::api::routes::GenerateRequest,
        crate::api::routes::GenerateResponse,
        crate::api::routes::RunsResponse,
        crate::types::SeriesReport,
        crate::types::SeriesDisposition,
        crate::types::GenerationLogEntry,
        crate::types::TriggerKind,
        crate::types::RunStatus,
        crate::types::SeriesId,
        crate::types::LessonId,
    )),
    tags(
        (name = "generate", description = "Generation triggers"),
        (name = "runs", description = "Generation-log queries"),
        (name = "system", description = "Health and documentation")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the two trigger security schemes
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cron_secret",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
            components.add_security_scheme(
                "api_secret",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-api-secret"))),
            );
        }
    }
}
