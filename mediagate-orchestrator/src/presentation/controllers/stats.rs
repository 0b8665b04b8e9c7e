use axum::{
    extract::{Path, State},
    response::Response,
};

use mediagate_core::domain::StatsDimension;

use crate::presentation::controllers::{OrchestratorState, served_response};
use crate::presentation::middleware::{ClientIp, mediation_error_to_response};
use crate::presentation::models::{ErrorResponse, StatsResponse};

/// GET /aggregate-stats/{dimension} - Sampled provider or file-type counts
#[utoipa::path(
    get,
    path = "/aggregate-stats/{dimension}",
    params(
        ("dimension" = String, Path, description = "providers or file-types")
    ),
    responses(
        (status = 200, description = "Tallied counts, sampled or bundled", body = StatsResponse),
        (status = 400, description = "Unknown dimension", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    ),
    tag = "stats"
)]
pub async fn aggregate_stats(
    State(state): State<OrchestratorState>,
    ClientIp(client): ClientIp,
    Path(dimension): Path<String>,
) -> Response {
    let dimension = match dimension.parse::<StatsDimension>() {
        Ok(dimension) => dimension,
        Err(e) => return mediation_error_to_response(e),
    };

    match state.stats_use_case.execute(&client, dimension).await {
        Ok(served) => served_response(served),
        Err(e) => mediation_error_to_response(e),
    }
}
