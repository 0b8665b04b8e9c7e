use axum::{
    extract::{Query, State},
    response::Response,
};

use crate::presentation::controllers::{OrchestratorState, served_response};
use crate::presentation::middleware::{ClientIp, mediation_error_to_response};
use crate::presentation::models::{ErrorResponse, PreviewResponse, UrlQuery};

/// GET /preview-resolve - Scrape a page's preview image
#[utoipa::path(
    get,
    path = "/preview-resolve",
    params(UrlQuery),
    responses(
        (status = 200, description = "First advertised preview image, or null", body = PreviewResponse),
        (status = 400, description = "Missing or invalid URL", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    ),
    tag = "media"
)]
pub async fn preview_resolve(
    State(state): State<OrchestratorState>,
    ClientIp(client): ClientIp,
    Query(params): Query<UrlQuery>,
) -> Response {
    let page_url = match state.preview_use_case.validate(params.url.as_deref()) {
        Ok(url) => url,
        Err(e) => return mediation_error_to_response(e),
    };

    match state.preview_use_case.execute(&client, page_url).await {
        Ok(served) => served_response(served),
        Err(e) => mediation_error_to_response(e),
    }
}
