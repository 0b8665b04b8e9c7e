//! Search passthrough with bundled fallback

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use mediagate_core::domain::MediationError;
use mediagate_core::infrastructure::cache::keys;
use mediagate_core::infrastructure::fallback;
use mediagate_core::infrastructure::upstream::SearchBackend;

use super::gate::{EndpointGate, Fetched, Served};

pub const MAX_QUERY_CHARS: usize = 200;
pub const MAX_PAGE: u32 = 1000;

/// Validated search parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub page: u32,
}

impl SearchRequest {
    /// Validate raw query-string values
    pub fn parse(query: Option<&str>, page: Option<&str>) -> Result<Self, MediationError> {
        let query = query.map(str::trim).unwrap_or_default();
        if query.is_empty() {
            return Err(MediationError::validation("query is required"));
        }
        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(MediationError::validation(format!(
                "query must be at most {} characters",
                MAX_QUERY_CHARS
            )));
        }

        Ok(Self {
            query: query.to_string(),
            page: parse_page(page)?,
        })
    }
}

/// Optional 1-based page number, defaulting to 1
pub fn parse_page(page: Option<&str>) -> Result<u32, MediationError> {
    match page.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(1),
        Some(raw) => match raw.parse::<u32>() {
            Ok(page) if (1..=MAX_PAGE).contains(&page) => Ok(page),
            _ => Err(MediationError::validation(format!(
                "page must be an integer between 1 and {}",
                MAX_PAGE
            ))),
        },
    }
}

/// `GET /resolve-search`
pub struct ResolveSearchUseCase {
    gate: Arc<EndpointGate>,
    backend: Arc<dyn SearchBackend>,
    ttl: Duration,
}

impl ResolveSearchUseCase {
    pub fn new(gate: Arc<EndpointGate>, backend: Arc<dyn SearchBackend>, ttl: Duration) -> Self {
        Self { gate, backend, ttl }
    }

    pub async fn execute(
        &self,
        client: &str,
        request: SearchRequest,
    ) -> Result<Served, MediationError> {
        let key = keys::search_key(&request.query, request.page);
        let backend = Arc::clone(&self.backend);
        let ttl = self.ttl;

        self.gate
            .serve(client, &key, move || async move {
                match backend.search(&request.query, request.page).await {
                    Ok(body) => Ok(Fetched::cacheable(
                        Bytes::from(serde_json::to_vec(&body)?),
                        "application/json",
                        ttl,
                    )),
                    Err(e) if e.is_upstream() => {
                        warn!(query = %request.query, page = request.page, "Search backend failed, serving fallback: {}", e);
                        let body = serde_json::to_vec(&fallback::search_results())?;
                        Ok(Fetched::fallback(Bytes::from(body), "application/json", None))
                    }
                    Err(e) => Err(e),
                }
            })
            .await
    }
}
