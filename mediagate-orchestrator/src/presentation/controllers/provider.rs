use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::Response,
};

use mediagate_core::MediationError;

use crate::application::{ProviderDataRequest, ProviderSearchRequest};
use crate::presentation::controllers::{OrchestratorState, served_response};
use crate::presentation::middleware::{ClientIp, mediation_error_to_response};
use crate::presentation::models::{ErrorResponse, ProviderDataBody, ProviderSearchBody};

fn body_error(rejection: JsonRejection) -> Response {
    mediation_error_to_response(MediationError::validation(format!(
        "request body must be a JSON object: {}",
        rejection.body_text()
    )))
}

/// POST /provider-search - Search one provider
#[utoipa::path(
    post,
    path = "/provider-search",
    request_body = ProviderSearchBody,
    responses(
        (status = 200, description = "Provider search results", body = serde_json::Value),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 408, description = "Provider did not answer in time", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 502, description = "Provider failed", body = ErrorResponse)
    ),
    tag = "providers"
)]
pub async fn provider_search(
    State(state): State<OrchestratorState>,
    ClientIp(client): ClientIp,
    body: Result<Json<ProviderSearchBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return body_error(rejection),
    };

    let request = match ProviderSearchRequest::parse(
        body.provider.as_deref(),
        body.query.as_deref(),
        body.page,
    ) {
        Ok(request) => request,
        Err(e) => return mediation_error_to_response(e),
    };

    match state.provider_use_case.search(&client, request).await {
        Ok(served) => served_response(served),
        Err(e) => mediation_error_to_response(e),
    }
}

/// POST /provider-data - Fetch one provider record
#[utoipa::path(
    post,
    path = "/provider-data",
    request_body = ProviderDataBody,
    responses(
        (status = 200, description = "Provider record", body = serde_json::Value),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 408, description = "Provider did not answer in time", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 502, description = "Provider failed", body = ErrorResponse)
    ),
    tag = "providers"
)]
pub async fn provider_data(
    State(state): State<OrchestratorState>,
    ClientIp(client): ClientIp,
    body: Result<Json<ProviderDataBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return body_error(rejection),
    };

    let request = match ProviderDataRequest::parse(body.provider.as_deref(), body.id.as_deref()) {
        Ok(request) => request,
        Err(e) => return mediation_error_to_response(e),
    };

    match state.provider_use_case.data(&client, request).await {
        Ok(served) => served_response(served),
        Err(e) => mediation_error_to_response(e),
    }
}
