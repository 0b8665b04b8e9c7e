//! Cache key builders
//!
//! Every key starts with the endpoint namespace so entries from different
//! endpoints can never collide.

use crate::domain::{BinaryKind, StatsDimension};

/// Normalized free-text query: trimmed and lowercased
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Key for a search result page
/// Example: search:sunset beach:2
pub fn search_key(query: &str, page: u32) -> String {
    let query = normalize_query(query);
    let mut key = String::with_capacity(8 + query.len() + 5);
    key.push_str("search:");
    key.push_str(&query);
    key.push(':');
    key.push_str(&page.to_string());
    key
}

pub fn provider_search_key(provider: &str, query: &str, page: u32) -> String {
    format!(
        "provider-search:{}:{}:{}",
        provider,
        normalize_query(query),
        page
    )
}

pub fn provider_data_key(provider: &str, id: &str) -> String {
    format!("provider-data:{}:{}", provider, id.trim())
}

pub fn media_key(page_url: &str) -> String {
    format!("media:{}", page_url)
}

pub fn binary_key(kind: BinaryKind, url: &str) -> String {
    format!("binary:{}:{}", kind.as_str(), url)
}

pub fn preview_key(page_url: &str) -> String {
    format!("preview:{}", page_url)
}

pub fn stats_key(dimension: StatsDimension) -> String {
    format!("stats:{}", dimension.as_str())
}
