use axum::{
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;

use mediagate_core::infrastructure::fallback::{self, PLACEHOLDER_CONTENT_TYPE};

use crate::presentation::controllers::OrchestratorState;
use crate::presentation::models::HealthResponse;

/// GET /health - Liveness with table sizes
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<OrchestratorState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        details: Some(serde_json::json!({
            "cache_entries": state.cache.len(),
            "in_flight": state.coalescer.in_flight_len(),
            "uptime_seconds": state.startup_time.elapsed().as_secs(),
        })),
    })
}

/// GET /assets/placeholder.svg - Bundled placeholder image
#[utoipa::path(
    get,
    path = "/assets/placeholder.svg",
    responses(
        (status = 200, description = "Placeholder SVG", content_type = "image/svg+xml")
    ),
    tag = "health"
)]
pub async fn placeholder_asset() -> Response {
    let mut response = fallback::placeholder_image().into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(PLACEHOLDER_CONTENT_TYPE),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=86400"),
    );
    response
}
