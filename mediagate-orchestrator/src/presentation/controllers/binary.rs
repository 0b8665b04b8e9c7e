use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};

use mediagate_core::domain::BinaryKind;

use crate::application::{BinaryRequest, BinaryResponse};
use crate::presentation::controllers::{OrchestratorState, served_response};
use crate::presentation::middleware::{
    ClientIp, add_rate_limit_headers, mediation_error_to_response,
};
use crate::presentation::models::{ErrorResponse, UrlQuery};

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// GET /binary-proxy/{kind} - Proxy image, video or audio bytes
#[utoipa::path(
    get,
    path = "/binary-proxy/{kind}",
    params(
        ("kind" = String, Path, description = "image, video or audio"),
        UrlQuery
    ),
    responses(
        (status = 200, description = "Full body, or the placeholder image for failed image fetches"),
        (status = 206, description = "Partial content for ranged audio/video requests"),
        (status = 400, description = "Unknown kind or invalid URL", body = ErrorResponse),
        (status = 403, description = "Host not allow-listed", body = ErrorResponse),
        (status = 408, description = "Origin did not answer in time", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 502, description = "Origin failed", body = ErrorResponse)
    ),
    tag = "media"
)]
pub async fn binary_proxy(
    State(state): State<OrchestratorState>,
    ClientIp(client): ClientIp,
    Path(kind): Path<String>,
    Query(params): Query<UrlQuery>,
    headers: HeaderMap,
) -> Response {
    let kind = match kind.parse::<BinaryKind>() {
        Ok(kind) => kind,
        Err(e) => return mediation_error_to_response(e),
    };
    let url = match state.binary_use_case.validate(params.url.as_deref()) {
        Ok(url) => url,
        Err(e) => return mediation_error_to_response(e),
    };

    let request = BinaryRequest {
        kind,
        url,
        range: header_string(&headers, header::RANGE),
        authorization: header_string(&headers, header::AUTHORIZATION),
    };

    match state.binary_use_case.execute(&client, request).await {
        Ok(BinaryResponse::Buffered(served)) => {
            let mut response = served_response(served);
            if kind.supports_ranges() {
                response
                    .headers_mut()
                    .insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
            }
            response
        }
        Ok(BinaryResponse::Streamed { response: upstream, rate }) => {
            let mut response = Response::new(Body::from_stream(upstream.body));
            *response.status_mut() =
                StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::OK);

            let out = response.headers_mut();
            let content_type = upstream
                .content_type
                .unwrap_or_else(|| kind.default_content_type().to_string());
            if let Ok(value) = HeaderValue::from_str(&content_type) {
                out.insert(header::CONTENT_TYPE, value);
            }
            if let Some(value) = upstream
                .content_range
                .and_then(|v| HeaderValue::from_str(&v).ok())
            {
                out.insert(header::CONTENT_RANGE, value);
            }
            let accept_ranges = upstream.accept_ranges.unwrap_or_else(|| "bytes".to_string());
            if let Ok(value) = HeaderValue::from_str(&accept_ranges) {
                out.insert(header::ACCEPT_RANGES, value);
            }
            if let Some(length) = upstream.content_length {
                out.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
            }

            add_rate_limit_headers(&mut response, rate.as_ref());
            response
        }
        Err(e) => mediation_error_to_response(e),
    }
}
