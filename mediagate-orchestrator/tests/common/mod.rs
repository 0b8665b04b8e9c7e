//! Shared harness for orchestrator HTTP tests
//!
//! Every upstream (search, provider, media origins) is a single wiremock
//! server. The router is built exactly as production builds it, only the
//! configuration points at the mock.

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::MockServer;

use mediagate_core::Config;
use mediagate_core::infrastructure::{Clock, SystemClock};
use mediagate_orchestrator::application::{MediationServices, Upstreams};
use mediagate_orchestrator::presentation::{OrchestratorState, create_router};

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Configuration aimed at `server`, with small timeouts and no sweeper
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.server.enable_docs = false;
    config.upstream.search_base_url = server.uri();
    config.upstream.provider_base_url = format!("{}/provider", server.uri());
    config.upstream.timeout_seconds = 2;
    config.media.allowed_hosts = vec!["vendor.test".to_string()];
    config.media.cdn_hosts = vec![server.uri()];
    config.media.probe_timeout_ms = 1000;
    config.media.max_candidates = 8;
    config.stats.sample_queries = vec!["design".to_string(), "nature".to_string()];
    config.cache.sweep_interval_seconds = 0;
    config
}

pub fn build_router(config: &Config) -> Router {
    build_router_with_clock(config, Arc::new(SystemClock))
}

/// Same wiring, with the caller's clock driving cache and rate windows
pub fn build_router_with_clock(config: &Config, clock: Arc<dyn Clock>) -> Router {
    let services = MediationServices::new(config, clock, Upstreams::from_config(config));
    create_router(OrchestratorState::from(&services), &config.server)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn get_with_header(uri: &str, name: &str, value: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(name, value)
        .body(Body::empty())
        .expect("request")
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.expect("router is infallible")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body")
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Query-string encoding for URLs passed as the `url` parameter
pub fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
