use axum::{
    extract::{Query, State},
    response::Response,
};

use crate::application::SearchRequest;
use crate::presentation::controllers::{OrchestratorState, served_response};
use crate::presentation::middleware::{ClientIp, mediation_error_to_response};
use crate::presentation::models::{ErrorResponse, SearchQuery};

/// GET /resolve-search - Cached, coalesced search passthrough
#[utoipa::path(
    get,
    path = "/resolve-search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Search results, from upstream or the bundled fallback", body = serde_json::Value),
        (status = 400, description = "Missing or invalid query", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    ),
    tag = "search"
)]
pub async fn resolve_search(
    State(state): State<OrchestratorState>,
    ClientIp(client): ClientIp,
    Query(params): Query<SearchQuery>,
) -> Response {
    let request = match SearchRequest::parse(params.query.as_deref(), params.page.as_deref()) {
        Ok(request) => request,
        Err(e) => return mediation_error_to_response(e),
    };

    match state.search_use_case.execute(&client, request).await {
        Ok(served) => served_response(served),
        Err(e) => mediation_error_to_response(e),
    }
}
