use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use mediagate_core::MediationError;

use crate::presentation::controllers::{CACHE_HEADER, OrchestratorState, SOURCE_HEADER};
use crate::presentation::middleware::{
    ClientIp, add_rate_limit_headers, mediation_error_to_response,
};
use crate::presentation::models::{ErrorResponse, MediaResolutionResponse, MediaResolveQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseFormat {
    Redirect,
    Json,
}

fn parse_format(format: Option<&str>) -> Result<ResponseFormat, MediationError> {
    match format.map(str::trim).filter(|f| !f.is_empty()) {
        None | Some("redirect") => Ok(ResponseFormat::Redirect),
        Some("json") => Ok(ResponseFormat::Json),
        Some(other) => Err(MediationError::validation(format!(
            "format must be 'redirect' or 'json', got '{}'",
            other
        ))),
    }
}

/// GET /media-resolve - Resolve a vendor page to a direct asset URL
#[utoipa::path(
    get,
    path = "/media-resolve",
    params(MediaResolveQuery),
    responses(
        (status = 200, description = "Resolution record (format=json)", body = MediaResolutionResponse),
        (status = 302, description = "Redirect to the asset or the placeholder"),
        (status = 400, description = "Missing or invalid URL", body = ErrorResponse),
        (status = 403, description = "Host not allow-listed", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    ),
    tag = "media"
)]
pub async fn media_resolve(
    State(state): State<OrchestratorState>,
    ClientIp(client): ClientIp,
    Query(params): Query<MediaResolveQuery>,
) -> Response {
    let format = match parse_format(params.format.as_deref()) {
        Ok(format) => format,
        Err(e) => return mediation_error_to_response(e),
    };
    let page_url = match state.media_use_case.validate(params.url.as_deref()) {
        Ok(url) => url,
        Err(e) => return mediation_error_to_response(e),
    };

    let resolved = match state.media_use_case.execute(&client, page_url).await {
        Ok(resolved) => resolved,
        Err(e) => return mediation_error_to_response(e),
    };

    let placeholder = resolved.resolution.placeholder;
    let mut response = match format {
        ResponseFormat::Json => {
            Json(MediaResolutionResponse::from(resolved.resolution)).into_response()
        }
        ResponseFormat::Redirect => match HeaderValue::from_str(&resolved.resolution.url) {
            Ok(location) => {
                let mut response = StatusCode::FOUND.into_response();
                response.headers_mut().insert(header::LOCATION, location);
                response
            }
            Err(_) => {
                return mediation_error_to_response(MediationError::internal(
                    "resolved URL is not a valid header value",
                ));
            }
        },
    };

    let headers = response.headers_mut();
    headers.insert(CACHE_HEADER, HeaderValue::from_static(resolved.cache.as_str()));
    if placeholder {
        headers.insert(SOURCE_HEADER, HeaderValue::from_static("placeholder"));
    }
    add_rate_limit_headers(&mut response, resolved.rate.as_ref());
    response
}
