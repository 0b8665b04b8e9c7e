//! Resolve-and-probe media resolution
//!
//! A vendor page URL is expanded into candidate asset URLs which are probed
//! in priority order. The first candidate that answers wins. Exhaustion is
//! not an error: the caller gets the placeholder, cached only briefly so a
//! recovering origin is picked up again.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use mediagate_core::config::{CacheConfig, MediaConfig};
use mediagate_core::domain::MediationError;
use mediagate_core::infrastructure::cache::keys;
use mediagate_core::infrastructure::probe::{ProbeRequest, Prober};
use mediagate_core::infrastructure::rate_limiter::RateDecision;
use mediagate_core::infrastructure::resolver::CandidateResolver;

use super::gate::{CacheStatus, EndpointGate, Fetched};

/// Cached outcome of one resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaResolution {
    /// Direct asset URL, or the placeholder URL
    pub url: String,
    pub content_type: Option<String>,
    pub placeholder: bool,
    /// Candidates probed before the outcome was decided
    pub attempts: usize,
}

/// Resolution plus how it was served
#[derive(Debug, Clone)]
pub struct ResolvedMedia {
    pub resolution: MediaResolution,
    pub cache: CacheStatus,
    pub rate: Option<RateDecision>,
}

/// Host allow-list check: exact host or any subdomain of an allowed host
pub fn host_allowed(host: &str, allowed: &[String]) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    allowed.iter().any(|entry| {
        let entry = entry.trim().trim_start_matches('.').to_ascii_lowercase();
        !entry.is_empty() && (host == entry || host.ends_with(&format!(".{}", entry)))
    })
}

/// Parse an absolute http(s) URL or reject it as a validation error
pub fn parse_http_url(raw: Option<&str>) -> Result<Url, MediationError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(MediationError::validation("url is required"));
    }
    let url = Url::parse(raw)
        .map_err(|e| MediationError::validation(format!("url is not a valid absolute URL: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(MediationError::validation("url must be an http(s) URL"));
    }
    Ok(url)
}

/// `GET /media-resolve`
pub struct MediaResolveUseCase {
    gate: Arc<EndpointGate>,
    resolver: Arc<CandidateResolver>,
    prober: Arc<dyn Prober>,
    allowed_hosts: Vec<String>,
    probe_timeout: Duration,
    placeholder_url: String,
    media_ttl: Duration,
    placeholder_ttl: Duration,
}

impl MediaResolveUseCase {
    pub fn new(
        gate: Arc<EndpointGate>,
        resolver: Arc<CandidateResolver>,
        prober: Arc<dyn Prober>,
        media: &MediaConfig,
        cache: &CacheConfig,
    ) -> Self {
        Self {
            gate,
            resolver,
            prober,
            allowed_hosts: media.allowed_hosts.clone(),
            probe_timeout: media.probe_timeout(),
            placeholder_url: media.placeholder_url.clone(),
            media_ttl: cache.media_ttl(),
            placeholder_ttl: cache.placeholder_ttl(),
        }
    }

    /// Validate the page URL against the allow-list
    pub fn validate(&self, raw_url: Option<&str>) -> Result<Url, MediationError> {
        let url = parse_http_url(raw_url)?;
        let host = url.host_str().unwrap_or_default();
        if !host_allowed(host, &self.allowed_hosts) {
            return Err(MediationError::forbidden(format!(
                "host '{}' is not allowed for media resolution",
                host
            )));
        }
        Ok(url)
    }

    pub async fn execute(&self, client: &str, page_url: Url) -> Result<ResolvedMedia, MediationError> {
        let key = keys::media_key(page_url.as_str());
        let resolver = Arc::clone(&self.resolver);
        let prober = Arc::clone(&self.prober);
        let probe = ProbeRequest::new(self.probe_timeout).with_range("bytes=0-0");
        let placeholder_url = self.placeholder_url.clone();
        let media_ttl = self.media_ttl;
        let placeholder_ttl = self.placeholder_ttl;

        let served = self
            .gate
            .serve(client, &key, move || async move {
                let source = page_url.to_string();
                let candidates = resolver.resolve(&source);
                let mut attempts = 0;

                for candidate in &candidates {
                    attempts += 1;
                    let outcome = prober.probe(candidate, &probe).await;
                    if outcome.succeeded {
                        debug!(
                            url = %source,
                            candidate = %candidate.url,
                            attempts,
                            "Resolved media candidate"
                        );
                        let resolution = MediaResolution {
                            url: candidate.url.clone(),
                            content_type: outcome.content_type,
                            placeholder: false,
                            attempts,
                        };
                        return Ok(Fetched::cacheable(
                            Bytes::from(serde_json::to_vec(&resolution)?),
                            "application/json",
                            media_ttl,
                        ));
                    }
                }

                warn!(
                    url = %source,
                    candidates = candidates.len(),
                    "No candidate resolved, serving placeholder"
                );
                let resolution = MediaResolution {
                    url: placeholder_url,
                    content_type: None,
                    placeholder: true,
                    attempts,
                };
                Ok(Fetched::fallback(
                    Bytes::from(serde_json::to_vec(&resolution)?),
                    "application/json",
                    Some(placeholder_ttl),
                ))
            })
            .await?;

        let resolution: MediaResolution = serde_json::from_slice(&served.payload)
            .map_err(|e| MediationError::internal(format!("Corrupt media resolution: {}", e)))?;

        Ok(ResolvedMedia {
            resolution,
            cache: served.cache,
            rate: served.rate,
        })
    }
}
