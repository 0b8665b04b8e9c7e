use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::presentation::controllers::OrchestratorState;
use crate::presentation::middleware::{ClientIp, bearer_token, mediation_error_to_response};
use crate::presentation::models::{AdminStatsResponse, ErrorResponse};

/// GET /admin/stats - Runtime table sizes
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Table snapshot", body = AdminStatsResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin endpoints disabled", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    ),
    tag = "admin",
    security(("bearer_token" = []))
)]
pub async fn admin_stats(
    State(state): State<OrchestratorState>,
    ClientIp(client): ClientIp,
    headers: HeaderMap,
) -> Response {
    let token = bearer_token(&headers);
    match state.admin_use_case.execute(&client, token.as_deref()) {
        Ok(stats) => Json(AdminStatsResponse::from(stats)).into_response(),
        Err(e) => mediation_error_to_response(e),
    }
}
