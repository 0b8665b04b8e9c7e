//! Orchestrator API controllers

pub mod admin;
pub mod binary;
pub mod health;
pub mod media;
pub mod preview;
pub mod provider;
pub mod search;
pub mod stats;

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use crate::application::{
    AdminStatsUseCase, AggregateStatsUseCase, BinaryProxyUseCase, Fetched, MediaResolveUseCase,
    MediationServices, PreviewResolveUseCase, ProviderLookupUseCase, ResolveSearchUseCase, Served,
};
use crate::presentation::middleware::add_rate_limit_headers;
use mediagate_core::infrastructure::{RequestCoalescer, ResponseCache};

pub const CACHE_HEADER: &str = "x-cache";
pub const SOURCE_HEADER: &str = "x-mediagate-source";

/// Application state for orchestrator
#[derive(Clone)]
pub struct OrchestratorState {
    pub search_use_case: Arc<ResolveSearchUseCase>,
    pub provider_use_case: Arc<ProviderLookupUseCase>,
    pub media_use_case: Arc<MediaResolveUseCase>,
    pub binary_use_case: Arc<BinaryProxyUseCase>,
    pub preview_use_case: Arc<PreviewResolveUseCase>,
    pub stats_use_case: Arc<AggregateStatsUseCase>,
    pub admin_use_case: Arc<AdminStatsUseCase>,
    pub cache: Arc<ResponseCache>,
    pub coalescer: Arc<RequestCoalescer<Fetched>>,
    pub startup_time: Instant,
}

impl From<&MediationServices> for OrchestratorState {
    fn from(services: &MediationServices) -> Self {
        Self {
            search_use_case: Arc::clone(&services.search),
            provider_use_case: Arc::clone(&services.provider),
            media_use_case: Arc::clone(&services.media),
            binary_use_case: Arc::clone(&services.binary),
            preview_use_case: Arc::clone(&services.preview),
            stats_use_case: Arc::clone(&services.stats),
            admin_use_case: Arc::clone(&services.admin),
            cache: Arc::clone(&services.cache),
            coalescer: Arc::clone(&services.coalescer),
            startup_time: Instant::now(),
        }
    }
}

/// Write a gated payload with cache, source and rate limit headers
pub(crate) fn served_response(served: Served) -> Response {
    let mut response = Response::new(Body::from(served.payload));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(content_type) = HeaderValue::from_str(&served.content_type) {
        headers.insert(header::CONTENT_TYPE, content_type);
    }
    headers.insert(CACHE_HEADER, HeaderValue::from_static(served.cache.as_str()));
    if served.fallback {
        headers.insert(SOURCE_HEADER, HeaderValue::from_static("fallback"));
    }

    add_rate_limit_headers(&mut response, served.rate.as_ref());
    response
}
