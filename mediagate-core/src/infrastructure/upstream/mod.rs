//! Upstream JSON backends
//!
//! The search/commerce backend and the provider lookup backend. Both are
//! reached through traits so the orchestrators can be exercised against
//! in-process fakes as well as mock HTTP servers.

pub mod provider;
pub mod search;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::domain::MediationError;

pub use provider::HttpProviderBackend;
pub use search::HttpSearchBackend;

/// Paged free-text search
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str, page: u32) -> Result<Value, MediationError>;
}

/// Third-party provider lookups
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    async fn search(
        &self,
        provider: &str,
        query: &str,
        page: u32,
    ) -> Result<Value, MediationError>;

    async fn data(&self, provider: &str, id: &str) -> Result<Value, MediationError>;
}

/// Map a transport failure, attributing timeouts to the configured bound
pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> MediationError {
    if err.is_timeout() {
        MediationError::UpstreamTimeout {
            seconds: timeout.as_secs(),
        }
    } else {
        err.into()
    }
}

/// Turn a response into JSON, rejecting non-2xx answers
pub(crate) async fn json_body(
    response: reqwest::Response,
    timeout: Duration,
) -> Result<Value, MediationError> {
    let status = response.status();
    if !status.is_success() {
        return Err(MediationError::upstream(
            Some(status.as_u16()),
            format!("Upstream answered {}", status),
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(e, timeout))?;
    Ok(serde_json::from_slice(&body)?)
}
