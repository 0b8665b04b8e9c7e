//! HTTP middleware and response helpers

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use std::convert::Infallible;
use std::time::Instant;
use uuid::Uuid;

use mediagate_core::MediationError;
use mediagate_core::infrastructure::RateDecision;

use crate::presentation::models::ErrorResponse;

/// Convert a MediationError to an HTTP response
pub fn mediation_error_to_response(error: MediationError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let code = error.code();

    // 4xx = client errors (warn level), 5xx = server errors (error level)
    if status.is_server_error() {
        tracing::error!(
            error = %error,
            http_status = %status,
            error_code = code,
            "Server error mapped to HTTP response"
        );
    } else {
        tracing::warn!(
            error = %error,
            http_status = %status,
            error_code = code,
            "Client error mapped to HTTP response"
        );
    }

    let details = match &error {
        MediationError::RateLimited { retry_after_secs } => {
            Some(serde_json::json!({ "retry_after": retry_after_secs }))
        }
        MediationError::UpstreamUnavailable {
            status: Some(upstream_status),
            ..
        } => Some(serde_json::json!({ "upstream_status": upstream_status })),
        _ => None,
    };

    let message = match &error {
        // Internal details stay in the logs
        MediationError::Internal { .. } => "Internal server error".to_string(),
        other => other.to_string(),
    };

    let mut response = (
        status,
        Json(ErrorResponse {
            code: code.to_string(),
            message,
            details,
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        }),
    )
        .into_response();

    if let MediationError::RateLimited { retry_after_secs } = error {
        let headers = response.headers_mut();
        headers.insert("ratelimit-remaining", HeaderValue::from(0u32));
        headers.insert("ratelimit-reset", HeaderValue::from(retry_after_secs));
        headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
    }

    response
}

/// Add IETF draft rate limit headers to response
pub fn add_rate_limit_headers(response: &mut Response, decision: Option<&RateDecision>) {
    let Some(decision) = decision else {
        return;
    };
    let headers = response.headers_mut();

    // https://datatracker.ietf.org/doc/html/draft-ietf-httpapi-ratelimit-headers
    headers.insert("ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert(
        "ratelimit-reset",
        HeaderValue::from(decision.retry_after_secs()),
    );
}

/// Client key used for rate limiting: first forwarded address, then the real IP header
pub fn extract_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| "unknown-ip".to_string())
}

/// Rate-limit identity of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(extract_ip(&parts.headers)))
    }
}

/// Bearer token from the Authorization header, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(|token| token.trim().to_string())
}

/// Answer every preflight request with an empty 204 and permissive CORS headers
pub async fn preflight_middleware(request: Request<Body>, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }

    let allow_headers = request
        .headers()
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_static("content-type, authorization, range, accept")
        });

    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("3600"),
    );
    response
}

/// Request logging middleware with timing and request ID
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Processing request"
    );

    let response = next.run(request).await;
    let duration = start_time.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}
