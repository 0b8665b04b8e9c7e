//! Aggregate statistics sampled from the search backend

use bytes::Bytes;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use mediagate_core::domain::{MediationError, StatsDimension};
use mediagate_core::infrastructure::cache::keys;
use mediagate_core::infrastructure::fallback;
use mediagate_core::infrastructure::upstream::SearchBackend;

use super::gate::{EndpointGate, Fetched, Served};

/// One tallied `{name, count}` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    pub dimension: StatsDimension,
    pub items: Vec<StatCount>,
    /// Sample queries that answered
    pub sampled_queries: usize,
    pub total: u64,
    pub fallback: bool,
}

impl StatsReport {
    fn from_counts(dimension: StatsDimension, counts: HashMap<String, u64>, sampled: usize) -> Self {
        let mut items: Vec<StatCount> = counts
            .into_iter()
            .map(|(name, count)| StatCount { name, count })
            .collect();
        items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        let total = items.iter().map(|item| item.count).sum();
        Self {
            dimension,
            items,
            sampled_queries: sampled,
            total,
            fallback: false,
        }
    }

    fn bundled(dimension: StatsDimension) -> Self {
        let counts = fallback::stats(dimension)
            .into_iter()
            .map(|row| (row.name, row.count))
            .collect();
        Self {
            fallback: true,
            ..Self::from_counts(dimension, counts, 0)
        }
    }
}

/// Result items of one search response, whatever envelope the backend used
fn result_items(body: &Value) -> &[Value] {
    if let Some(items) = body.as_array() {
        return items;
    }
    ["results", "items", "data"]
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn dimension_value(item: &Value, dimension: StatsDimension) -> Option<String> {
    let fields: &[&str] = match dimension {
        StatsDimension::Providers => &["provider", "source"],
        StatsDimension::FileTypes => &["file_type", "fileType", "extension"],
    };
    fields
        .iter()
        .find_map(|field| item.get(*field).and_then(Value::as_str))
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
}

/// Count dimension values across every sampled response
pub fn tally(bodies: &[Value], dimension: StatsDimension) -> HashMap<String, u64> {
    let mut counts = HashMap::new();
    for body in bodies {
        for item in result_items(body) {
            if let Some(name) = dimension_value(item, dimension) {
                *counts.entry(name).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// `GET /aggregate-stats/{dimension}`
pub struct AggregateStatsUseCase {
    gate: Arc<EndpointGate>,
    backend: Arc<dyn SearchBackend>,
    sample_queries: Vec<String>,
    ttl: Duration,
}

impl AggregateStatsUseCase {
    pub fn new(
        gate: Arc<EndpointGate>,
        backend: Arc<dyn SearchBackend>,
        sample_queries: Vec<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            gate,
            backend,
            sample_queries,
            ttl,
        }
    }

    pub async fn execute(
        &self,
        client: &str,
        dimension: StatsDimension,
    ) -> Result<Served, MediationError> {
        let key = keys::stats_key(dimension);
        let backend = Arc::clone(&self.backend);
        let queries = self.sample_queries.clone();
        let ttl = self.ttl;

        self.gate
            .serve(client, &key, move || async move {
                let samples = join_all(queries.iter().map(|query| backend.search(query, 1))).await;

                let mut bodies = Vec::with_capacity(samples.len());
                for (query, sample) in queries.iter().zip(samples) {
                    match sample {
                        Ok(body) => bodies.push(body),
                        Err(e) => debug!(query = %query, "Stats sample failed: {}", e),
                    }
                }

                if bodies.is_empty() {
                    warn!(dimension = %dimension, "Every stats sample failed, serving bundled dataset");
                    let report = StatsReport::bundled(dimension);
                    return Ok(Fetched::fallback(
                        Bytes::from(serde_json::to_vec(&report)?),
                        "application/json",
                        None,
                    ));
                }

                let report =
                    StatsReport::from_counts(dimension, tally(&bodies, dimension), bodies.len());
                Ok(Fetched::cacheable(
                    Bytes::from(serde_json::to_vec(&report)?),
                    "application/json",
                    ttl,
                ))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tally_accepts_envelope_variants() {
        let bodies = vec![
            json!({"results": [{"provider": "Pexels", "file_type": "jpg"}, {"provider": "pixabay"}]}),
            json!({"items": [{"source": "pexels", "fileType": "PNG"}]}),
            json!([{"provider": "unsplash", "extension": "jpg"}]),
            json!({"unexpected": true}),
        ];

        let providers = tally(&bodies, StatsDimension::Providers);
        assert_eq!(providers.get("pexels"), Some(&2));
        assert_eq!(providers.get("pixabay"), Some(&1));
        assert_eq!(providers.get("unsplash"), Some(&1));

        let file_types = tally(&bodies, StatsDimension::FileTypes);
        assert_eq!(file_types.get("jpg"), Some(&2));
        assert_eq!(file_types.get("png"), Some(&1));
    }

    #[test]
    fn test_report_sorted_by_count_then_name() {
        let counts = HashMap::from([
            ("b".to_string(), 2),
            ("a".to_string(), 2),
            ("c".to_string(), 5),
        ]);
        let report = StatsReport::from_counts(StatsDimension::Providers, counts, 3);
        let names: Vec<_> = report.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
        assert_eq!(report.total, 9);
        assert!(!report.fallback);
    }

    #[test]
    fn test_bundled_report_is_flagged() {
        let report = StatsReport::bundled(StatsDimension::FileTypes);
        assert!(report.fallback);
        assert_eq!(report.sampled_queries, 0);
        assert!(!report.items.is_empty());
    }
}
