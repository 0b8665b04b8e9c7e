//! Bundled static fallbacks
//!
//! Served when an origin cannot be reached. Compiled into the binary so a
//! fallback can never fail to load.

use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::domain::StatsDimension;

const SEARCH_JSON: &str = include_str!("../../assets/fallback_search.json");
const PROVIDERS_JSON: &str = include_str!("../../assets/fallback_providers.json");
const FILE_TYPES_JSON: &str = include_str!("../../assets/fallback_file_types.json");
const PLACEHOLDER_SVG: &[u8] = include_bytes!("../../assets/placeholder.svg");

pub const PLACEHOLDER_CONTENT_TYPE: &str = "image/svg+xml";

/// One `{name, count}` row of a bundled statistics dataset
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FallbackCount {
    pub name: String,
    pub count: u64,
}

/// Search dataset served when the search backend is down
pub fn search_results() -> Value {
    serde_json::from_str(SEARCH_JSON).unwrap_or_else(|e| {
        error!("Bundled search fallback is not valid JSON: {}", e);
        Value::Null
    })
}

/// Statistics served when no sample query could be answered
pub fn stats(dimension: StatsDimension) -> Vec<FallbackCount> {
    let raw = match dimension {
        StatsDimension::Providers => PROVIDERS_JSON,
        StatsDimension::FileTypes => FILE_TYPES_JSON,
    };
    serde_json::from_str(raw).unwrap_or_else(|e| {
        error!(dimension = %dimension, "Bundled stats fallback is not valid JSON: {}", e);
        Vec::new()
    })
}

/// Placeholder image bytes
pub fn placeholder_image() -> Bytes {
    Bytes::from_static(PLACEHOLDER_SVG)
}
