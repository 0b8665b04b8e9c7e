//! Route definitions and server setup

use axum::http::StatusCode;
use axum::{
    Router, middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use mediagate_core::config::ServerConfig;

use crate::presentation::{
    controllers::{
        OrchestratorState,
        admin::admin_stats,
        binary::binary_proxy,
        health::{health_check, placeholder_asset},
        media::media_resolve,
        preview::preview_resolve,
        provider::{provider_data, provider_search},
        search::resolve_search,
        stats::aggregate_stats,
    },
    middleware::{logging_middleware, preflight_middleware},
    models::*,
};

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::search::resolve_search,
        crate::presentation::controllers::provider::provider_search,
        crate::presentation::controllers::provider::provider_data,
        crate::presentation::controllers::media::media_resolve,
        crate::presentation::controllers::binary::binary_proxy,
        crate::presentation::controllers::preview::preview_resolve,
        crate::presentation::controllers::stats::aggregate_stats,
        crate::presentation::controllers::admin::admin_stats,
        crate::presentation::controllers::health::health_check,
        crate::presentation::controllers::health::placeholder_asset
    ),
    components(
        schemas(
            ProviderSearchBody,
            ProviderDataBody,
            MediaResolutionResponse,
            PreviewResponse,
            StatCountDto,
            StatsResponse,
            AdminStatsResponse,
            ErrorResponse,
            HealthResponse
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "search", description = "Cached, coalesced search passthrough"),
        (name = "providers", description = "Validated provider lookups"),
        (name = "media", description = "Media resolution, binary proxying and preview scraping"),
        (name = "stats", description = "Aggregated catalogue statistics"),
        (name = "admin", description = "Privileged runtime statistics"),
        (name = "health", description = "Liveness and bundled assets")
    ),
    info(
        title = "Mediagate API",
        version = "0.1.0",
        description = "Request-mediation gateway in front of third-party media origins: per-client rate limits, TTL caching, single-flight coalescing and graceful fallbacks.",
        license(
            name = "AGPL-3.0",
            url = "https://www.gnu.org/licenses/agpl-3.0.html"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    )
)]
pub struct ApiDoc;

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let methods = [
        axum::http::Method::GET,
        axum::http::Method::POST,
        axum::http::Method::OPTIONS,
    ];
    let headers = [
        axum::http::header::CONTENT_TYPE,
        axum::http::header::ACCEPT,
        axum::http::header::AUTHORIZATION,
        axum::http::header::RANGE,
        axum::http::header::ORIGIN,
    ];
    let exposed = [
        axum::http::header::CONTENT_RANGE,
        axum::http::header::ACCEPT_RANGES,
        axum::http::header::RETRY_AFTER,
        axum::http::HeaderName::from_static("x-cache"),
        axum::http::HeaderName::from_static("x-mediagate-source"),
        axum::http::HeaderName::from_static("ratelimit-limit"),
        axum::http::HeaderName::from_static("ratelimit-remaining"),
        axum::http::HeaderName::from_static("ratelimit-reset"),
    ];

    let layer = if server.allowed_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(tower_http::cors::AllowOrigin::any())
    } else {
        let origins: Vec<axum::http::HeaderValue> = server
            .allowed_origins
            .iter()
            .filter_map(|origin| {
                axum::http::HeaderValue::from_str(origin)
                    .map_err(|_| {
                        tracing::warn!(origin, "Invalid CORS origin in config; skipping");
                    })
                    .ok()
            })
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    layer
        .allow_methods(methods)
        .allow_headers(headers)
        .expose_headers(exposed)
        .allow_credentials(false)
        .max_age(Duration::from_secs(3600))
}

/// Create the application router with the full middleware stack
pub fn create_router(state: OrchestratorState, server: &ServerConfig) -> Router {
    async fn root_handler() -> Response {
        axum::Json(serde_json::json!({
            "name": "Mediagate API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Request-mediation gateway for third-party media origins",
            "endpoints": {
                "health": "/health",
                "search": "/resolve-search",
                "media": "/media-resolve",
                "docs": "/docs"
            }
        }))
        .into_response()
    }

    let api_routes = Router::new()
        .route("/resolve-search", get(resolve_search))
        .route("/provider-search", post(provider_search))
        .route("/provider-data", post(provider_data))
        .route("/media-resolve", get(media_resolve))
        .route("/binary-proxy/{kind}", get(binary_proxy))
        .route("/preview-resolve", get(preview_resolve))
        .route("/aggregate-stats/{dimension}", get(aggregate_stats))
        .route("/admin/stats", get(admin_stats));

    let health_routes = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/assets/placeholder.svg", get(placeholder_asset));

    let mut router = Router::new().merge(api_routes).merge(health_routes);

    // Conditionally expose Swagger UI based on configuration
    if server.enable_docs {
        router =
            router.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    let service_builder = ServiceBuilder::new()
        // HTTP tracing
        .layer(TraceLayer::new_for_http())
        // Preflight short-circuit, before routing so unknown paths answer too
        .layer(middleware::from_fn(preflight_middleware))
        // CORS headers on regular responses
        .layer(cors_layer(server))
        // Request timeout
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_seconds),
        ))
        // Custom logging middleware
        .layer(middleware::from_fn(logging_middleware));

    router.layer(service_builder).with_state(state)
}
