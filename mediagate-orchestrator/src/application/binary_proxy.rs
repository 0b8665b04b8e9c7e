//! Binary media proxy
//!
//! Anonymous full fetches go through the gate and are cached when small
//! enough. Credentialed fetches belong to one caller and skip the shared
//! cache and coalescer. Ranged audio/video requests, and bodies too large to
//! buffer, are streamed straight through.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use mediagate_core::config::{BinaryProxyConfig, CacheConfig, UpstreamConfig};
use mediagate_core::domain::{BinaryKind, Candidate, MediationError, ProbeErrorKind, ProbeOutcome};
use mediagate_core::infrastructure::cache::keys;
use mediagate_core::infrastructure::fallback::{self, PLACEHOLDER_CONTENT_TYPE};
use mediagate_core::infrastructure::probe::{ProbeRequest, Prober, StreamedResponse};
use mediagate_core::infrastructure::rate_limiter::RateDecision;

use super::gate::{CacheStatus, EndpointGate, Fetched, Served};
use super::media_resolve::{host_allowed, parse_http_url};

/// Inbound binary proxy request
#[derive(Debug, Clone)]
pub struct BinaryRequest {
    pub kind: BinaryKind,
    pub url: String,
    pub range: Option<String>,
    pub authorization: Option<String>,
}

/// How the bytes reach the caller
pub enum BinaryResponse {
    Buffered(Served),
    Streamed {
        response: StreamedResponse,
        rate: Option<RateDecision>,
    },
}

/// `GET /binary-proxy/{kind}`
pub struct BinaryProxyUseCase {
    gate: Arc<EndpointGate>,
    prober: Arc<dyn Prober>,
    allowed_hosts: Vec<String>,
    policy: FetchPolicy,
}

/// Timeouts, TTLs and the buffering bound for one buffered fetch
#[derive(Debug, Clone, Copy)]
struct FetchPolicy {
    timeout: Duration,
    ttl: Duration,
    placeholder_ttl: Duration,
    max_buffered_bytes: usize,
}

fn outcome_error(outcome: &ProbeOutcome, policy: &FetchPolicy) -> MediationError {
    match outcome.error_kind {
        Some(ProbeErrorKind::Timeout) => MediationError::UpstreamTimeout {
            seconds: policy.timeout.as_secs(),
        },
        Some(ProbeErrorKind::Status) => MediationError::upstream(
            outcome.status_code,
            format!(
                "Origin answered {}",
                outcome.status_code.unwrap_or_default()
            ),
        ),
        Some(ProbeErrorKind::TooLarge) => MediationError::PayloadTooLarge {
            limit_bytes: policy.max_buffered_bytes,
        },
        _ => MediationError::upstream(None, "Origin unreachable"),
    }
}

/// Fetch the whole body once. `shareable` results may be cached.
async fn fetch_buffered(
    prober: Arc<dyn Prober>,
    request: BinaryRequest,
    policy: FetchPolicy,
    shareable: bool,
) -> Result<Fetched, MediationError> {
    let mut probe = ProbeRequest::new(policy.timeout).with_body_limit(policy.max_buffered_bytes);
    if let Some(authorization) = &request.authorization {
        probe = probe.with_authorization(authorization.clone());
    }

    let candidate = Candidate::new(request.url.clone(), 0);
    let outcome = prober.probe(&candidate, &probe).await;

    if outcome.succeeded {
        let content_type = outcome
            .content_type
            .clone()
            .unwrap_or_else(|| request.kind.default_content_type().to_string());
        return Ok(Fetched {
            payload: outcome.body,
            content_type,
            cache_ttl: shareable.then_some(policy.ttl),
            fallback: false,
        });
    }

    match (request.kind, outcome.error_kind) {
        (_, Some(ProbeErrorKind::TooLarge)) => Err(outcome_error(&outcome, &policy)),
        (BinaryKind::Image, _) => {
            warn!(
                url = %request.url,
                status = ?outcome.status_code,
                kind = outcome.error_kind.map(|k| k.as_str()).unwrap_or("unknown"),
                "Image fetch failed, serving placeholder"
            );
            Ok(Fetched::fallback(
                fallback::placeholder_image(),
                PLACEHOLDER_CONTENT_TYPE,
                shareable.then_some(policy.placeholder_ttl),
            ))
        }
        (BinaryKind::Video | BinaryKind::Audio, _) => Err(outcome_error(&outcome, &policy)),
    }
}

impl BinaryProxyUseCase {
    pub fn new(
        gate: Arc<EndpointGate>,
        prober: Arc<dyn Prober>,
        proxy: &BinaryProxyConfig,
        upstream: &UpstreamConfig,
        cache: &CacheConfig,
    ) -> Self {
        Self {
            gate,
            prober,
            allowed_hosts: proxy.allowed_hosts.clone(),
            policy: FetchPolicy {
                timeout: upstream.timeout(),
                ttl: cache.binary_ttl(),
                placeholder_ttl: cache.placeholder_ttl(),
                max_buffered_bytes: cache.max_cacheable_body_bytes,
            },
        }
    }

    /// Check the target URL; an empty allow-list admits any http(s) host
    pub fn validate(&self, raw_url: Option<&str>) -> Result<String, MediationError> {
        let url = parse_http_url(raw_url)?;
        let host = url.host_str().unwrap_or_default();
        if !self.allowed_hosts.is_empty() && !host_allowed(host, &self.allowed_hosts) {
            return Err(MediationError::forbidden(format!(
                "host '{}' is not allowed for proxying",
                host
            )));
        }
        Ok(url.to_string())
    }

    pub async fn execute(
        &self,
        client: &str,
        request: BinaryRequest,
    ) -> Result<BinaryResponse, MediationError> {
        let rate = self.gate.admit(client)?;

        if request.range.is_some() && request.kind.supports_ranges() {
            return self.stream(&request, rate).await;
        }

        let buffered = if request.authorization.is_some() {
            fetch_buffered(Arc::clone(&self.prober), request.clone(), self.policy, false)
                .await
                .map(|fetched| Served {
                    payload: fetched.payload,
                    content_type: fetched.content_type,
                    cache: CacheStatus::Miss,
                    fallback: fetched.fallback,
                    rate: None,
                })
        } else {
            let key = keys::binary_key(request.kind, &request.url);
            let prober = Arc::clone(&self.prober);
            let owned = request.clone();
            let policy = self.policy;
            self.gate
                .lookup_or_fetch(&key, move || fetch_buffered(prober, owned, policy, true))
                .await
        };

        match buffered {
            Ok(mut served) => {
                served.rate = rate;
                Ok(BinaryResponse::Buffered(served))
            }
            Err(MediationError::PayloadTooLarge { limit_bytes }) => {
                debug!(url = %request.url, limit_bytes, "Body too large to buffer, streaming");
                self.stream(&request, rate).await
            }
            Err(e) => Err(e),
        }
    }

    /// Pass the origin response through as it arrives; never cached or coalesced
    async fn stream(
        &self,
        request: &BinaryRequest,
        rate: Option<RateDecision>,
    ) -> Result<BinaryResponse, MediationError> {
        let mut probe = ProbeRequest::new(self.policy.timeout);
        if let Some(range) = &request.range {
            probe = probe.with_range(range.clone());
        }
        if let Some(authorization) = &request.authorization {
            probe = probe.with_authorization(authorization.clone());
        }

        let response = self.prober.stream(&request.url, &probe).await?;
        Ok(BinaryResponse::Streamed { response, rate })
    }
}
