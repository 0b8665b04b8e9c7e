//! Privileged runtime statistics

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

use mediagate_core::domain::MediationError;
use mediagate_core::infrastructure::cache::ResponseCache;
use mediagate_core::infrastructure::coalescer::RequestCoalescer;

use super::gate::{EndpointGate, Fetched};

/// Snapshot of the in-memory tables
#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub cache_entries: usize,
    pub in_flight: usize,
    /// Tracked client windows per endpoint family
    pub rate_windows: BTreeMap<&'static str, usize>,
}

fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time comparison of two hex digests
fn digests_match(provided: &str, expected: &str) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// `GET /admin/stats`
pub struct AdminStatsUseCase {
    gate: Arc<EndpointGate>,
    token_digest: Option<String>,
    cache: Arc<ResponseCache>,
    coalescer: Arc<RequestCoalescer<Fetched>>,
    gates: Vec<Arc<EndpointGate>>,
}

impl AdminStatsUseCase {
    pub fn new(
        gate: Arc<EndpointGate>,
        token: Option<&str>,
        cache: Arc<ResponseCache>,
        coalescer: Arc<RequestCoalescer<Fetched>>,
        gates: Vec<Arc<EndpointGate>>,
    ) -> Self {
        Self {
            gate,
            token_digest: token.filter(|t| !t.is_empty()).map(digest),
            cache,
            coalescer,
            gates,
        }
    }

    /// Verify a bearer token; the endpoint is closed when no token is configured
    pub fn authorize(&self, bearer: Option<&str>) -> Result<(), MediationError> {
        let Some(expected) = &self.token_digest else {
            return Err(MediationError::forbidden("admin endpoints are disabled"));
        };
        let Some(provided) = bearer.map(str::trim).filter(|t| !t.is_empty()) else {
            return Err(MediationError::Unauthorized);
        };

        let provided = digest(provided);
        if !digests_match(&provided, expected) {
            warn!(fingerprint = &provided[..12], "Rejected admin token");
            return Err(MediationError::Unauthorized);
        }
        Ok(())
    }

    pub fn execute(&self, client: &str, bearer: Option<&str>) -> Result<AdminStats, MediationError> {
        self.gate.admit(client)?;
        self.authorize(bearer)?;

        let mut rate_windows: BTreeMap<&'static str, usize> = BTreeMap::new();
        for gate in &self.gates {
            *rate_windows.entry(gate.name()).or_insert(0) += gate.rate_windows();
        }

        Ok(AdminStats {
            cache_entries: self.cache.len(),
            in_flight: self.coalescer.in_flight_len(),
            rate_windows,
        })
    }
}
