//! Preview image scraping
//!
//! Pages advertise their preview image through Open Graph and Twitter card
//! meta tags. Tags are matched with patterns rather than a full HTML parse.

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use mediagate_core::config::{CacheConfig, UpstreamConfig};
use mediagate_core::domain::{Candidate, MediationError};
use mediagate_core::infrastructure::cache::keys;
use mediagate_core::infrastructure::probe::{ProbeRequest, Prober};

use super::gate::{EndpointGate, Fetched, Served};
use super::media_resolve::parse_http_url;

/// Meta keys in the order they are trusted
const PREVIEW_KEYS: [&str; 4] = [
    "og:image:secure_url",
    "og:image",
    "twitter:image",
    "twitter:image:src",
];

static META_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").unwrap());

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)([a-z][a-z0-9:_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// `{ "image": url | null }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewImage {
    pub image: Option<String>,
}

fn unescape(value: &str) -> String {
    value.trim().replace("&amp;", "&")
}

fn absolute_http(value: &str) -> Option<String> {
    let url = Url::parse(value).ok()?;
    if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() {
        Some(value.to_string())
    } else {
        None
    }
}

/// First absolute http(s) preview URL advertised by the page
pub fn extract_preview_image(html: &str) -> Option<String> {
    // key -> content values in document order
    let mut advertised: HashMap<String, Vec<String>> = HashMap::new();
    for tag in META_TAG.find_iter(html) {
        let mut key = None;
        let mut content = None;
        for caps in ATTRIBUTE.captures_iter(tag.as_str()) {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match name.as_str() {
                "property" | "name" => key = Some(value.trim().to_ascii_lowercase()),
                "content" => content = Some(unescape(value)),
                _ => {}
            }
        }
        if let (Some(key), Some(content)) = (key, content) {
            advertised.entry(key).or_default().push(content);
        }
    }

    PREVIEW_KEYS.iter().find_map(|key| {
        advertised
            .get(*key)?
            .iter()
            .find_map(|content| absolute_http(content))
    })
}

/// `GET /preview-resolve`
pub struct PreviewResolveUseCase {
    gate: Arc<EndpointGate>,
    prober: Arc<dyn Prober>,
    timeout: Duration,
    ttl: Duration,
    placeholder_ttl: Duration,
}

impl PreviewResolveUseCase {
    pub fn new(
        gate: Arc<EndpointGate>,
        prober: Arc<dyn Prober>,
        upstream: &UpstreamConfig,
        cache: &CacheConfig,
    ) -> Self {
        Self {
            gate,
            prober,
            timeout: upstream.timeout(),
            ttl: cache.preview_ttl(),
            placeholder_ttl: cache.placeholder_ttl(),
        }
    }

    pub fn validate(&self, raw_url: Option<&str>) -> Result<Url, MediationError> {
        parse_http_url(raw_url)
    }

    /// Cached `{ "image": ... }` record together with cache and rate metadata
    pub async fn execute(&self, client: &str, page_url: Url) -> Result<Served, MediationError> {
        let key = keys::preview_key(page_url.as_str());
        let prober = Arc::clone(&self.prober);
        let probe = ProbeRequest::new(self.timeout);
        let ttl = self.ttl;
        let placeholder_ttl = self.placeholder_ttl;

        self.gate
            .serve(client, &key, move || async move {
                let candidate = Candidate::new(page_url.to_string(), 0);
                let outcome = prober.probe(&candidate, &probe).await;

                if !outcome.succeeded {
                    warn!(
                        url = %page_url,
                        status = ?outcome.status_code,
                        "Preview page fetch failed"
                    );
                    let body = serde_json::to_vec(&PreviewImage { image: None })?;
                    return Ok(Fetched::fallback(
                        Bytes::from(body),
                        "application/json",
                        Some(placeholder_ttl),
                    ));
                }

                let html = String::from_utf8_lossy(&outcome.body);
                let image = extract_preview_image(&html);
                debug!(url = %page_url, found = image.is_some(), "Scraped preview meta tags");

                let cache_ttl = if image.is_some() { ttl } else { placeholder_ttl };
                let body = serde_json::to_vec(&PreviewImage { image })?;
                Ok(Fetched::cacheable(Bytes::from(body), "application/json", cache_ttl))
            })
            .await
    }
}
