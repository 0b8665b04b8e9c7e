//! Provider lookups
//!
//! Validated, rate-limited passthroughs. Upstream failures surface as typed
//! errors so the caller can retry; nothing is substituted.

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

use mediagate_core::domain::MediationError;
use mediagate_core::infrastructure::cache::keys;
use mediagate_core::infrastructure::upstream::ProviderBackend;

use super::gate::{EndpointGate, Fetched, Served};
use super::search::{MAX_PAGE, MAX_QUERY_CHARS};

const MAX_ID_CHARS: usize = 128;

static PROVIDER_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_-]{1,32}$").unwrap());

fn validate_provider(provider: Option<&str>) -> Result<String, MediationError> {
    let provider = provider.map(str::trim).unwrap_or_default();
    if provider.is_empty() {
        return Err(MediationError::validation("provider is required"));
    }
    if !PROVIDER_NAME.is_match(provider) {
        return Err(MediationError::validation(
            "provider must be 1-32 characters of a-z, 0-9, '_' or '-'",
        ));
    }
    Ok(provider.to_string())
}

/// Validated `POST /provider-search` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSearchRequest {
    pub provider: String,
    pub query: String,
    pub page: u32,
}

impl ProviderSearchRequest {
    pub fn parse(
        provider: Option<&str>,
        query: Option<&str>,
        page: Option<u32>,
    ) -> Result<Self, MediationError> {
        let provider = validate_provider(provider)?;

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

        let page = page.unwrap_or(1);
        if !(1..=MAX_PAGE).contains(&page) {
            return Err(MediationError::validation(format!(
                "page must be between 1 and {}",
                MAX_PAGE
            )));
        }

        Ok(Self {
            provider,
            query: query.to_string(),
            page,
        })
    }
}

/// Validated `POST /provider-data` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDataRequest {
    pub provider: String,
    pub id: String,
}

impl ProviderDataRequest {
    pub fn parse(provider: Option<&str>, id: Option<&str>) -> Result<Self, MediationError> {
        let provider = validate_provider(provider)?;

        let id = id.map(str::trim).unwrap_or_default();
        if id.is_empty() {
            return Err(MediationError::validation("id is required"));
        }
        if id.chars().count() > MAX_ID_CHARS {
            return Err(MediationError::validation(format!(
                "id must be at most {} characters",
                MAX_ID_CHARS
            )));
        }

        Ok(Self {
            provider,
            id: id.to_string(),
        })
    }
}

/// `POST /provider-search` and `POST /provider-data`, sharing one budget
pub struct ProviderLookupUseCase {
    gate: Arc<EndpointGate>,
    backend: Arc<dyn ProviderBackend>,
    ttl: Duration,
}

impl ProviderLookupUseCase {
    pub fn new(gate: Arc<EndpointGate>, backend: Arc<dyn ProviderBackend>, ttl: Duration) -> Self {
        Self { gate, backend, ttl }
    }

    pub async fn search(
        &self,
        client: &str,
        request: ProviderSearchRequest,
    ) -> Result<Served, MediationError> {
        let key = keys::provider_search_key(&request.provider, &request.query, request.page);
        let backend = Arc::clone(&self.backend);
        let ttl = self.ttl;

        self.gate
            .serve(client, &key, move || async move {
                let body = backend
                    .search(&request.provider, &request.query, request.page)
                    .await?;
                Ok(Fetched::cacheable(
                    Bytes::from(serde_json::to_vec(&body)?),
                    "application/json",
                    ttl,
                ))
            })
            .await
    }

    pub async fn data(
        &self,
        client: &str,
        request: ProviderDataRequest,
    ) -> Result<Served, MediationError> {
        let key = keys::provider_data_key(&request.provider, &request.id);
        let backend = Arc::clone(&self.backend);
        let ttl = self.ttl;

        self.gate
            .serve(client, &key, move || async move {
                let body = backend.data(&request.provider, &request.id).await?;
                Ok(Fetched::cacheable(
                    Bytes::from(serde_json::to_vec(&body)?),
                    "application/json",
                    ttl,
                ))
            })
            .await
    }
}
