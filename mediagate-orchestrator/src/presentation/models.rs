//! API request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::{AdminStats, MediaResolution};

/// Query parameters for `GET /resolve-search`
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Free-text search, 1-200 characters
    pub query: Option<String>,
    /// 1-based page number, defaults to 1
    pub page: Option<String>,
}

/// Body of `POST /provider-search`
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProviderSearchBody {
    #[schema(example = "pexels")]
    pub provider: Option<String>,
    #[schema(example = "mountain lake")]
    pub query: Option<String>,
    #[schema(example = 1)]
    pub page: Option<u32>,
}

/// Body of `POST /provider-data`
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProviderDataBody {
    #[schema(example = "pexels")]
    pub provider: Option<String>,
    #[schema(example = "2014422")]
    pub id: Option<String>,
}

/// Query parameters carrying a target URL
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UrlQuery {
    /// Absolute http(s) URL
    pub url: Option<String>,
}

/// Query parameters for `GET /media-resolve`
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MediaResolveQuery {
    /// Vendor page URL
    pub url: Option<String>,
    /// `redirect` (default) or `json`
    pub format: Option<String>,
}

/// Media resolution record
#[derive(Debug, Serialize, ToSchema)]
pub struct MediaResolutionResponse {
    #[schema(example = "https://cdn.vendor.com/videos/preview/sunset_123456.mp4")]
    pub url: String,
    #[schema(example = "video/mp4")]
    pub content_type: Option<String>,
    /// The URL points at the placeholder because no candidate answered
    pub placeholder: bool,
    /// Candidates probed before the outcome was decided
    pub attempts: usize,
}

impl From<MediaResolution> for MediaResolutionResponse {
    fn from(resolution: MediaResolution) -> Self {
        Self {
            url: resolution.url,
            content_type: resolution.content_type,
            placeholder: resolution.placeholder,
            attempts: resolution.attempts,
        }
    }
}

/// Preview image lookup result, as written by the preview use case
#[derive(Debug, Serialize, ToSchema)]
pub struct PreviewResponse {
    #[schema(example = "https://cdn.example.com/og/cover.jpg")]
    pub image: Option<String>,
}

/// One `{name, count}` statistics row
#[derive(Debug, Serialize, ToSchema)]
pub struct StatCountDto {
    #[schema(example = "pexels")]
    pub name: String,
    #[schema(example = 42)]
    pub count: u64,
}

/// Aggregated statistics for one dimension, as written by the stats use case
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    #[schema(example = "providers")]
    pub dimension: String,
    pub items: Vec<StatCountDto>,
    pub sampled_queries: usize,
    pub total: u64,
    /// Served from the bundled dataset
    pub fallback: bool,
}

/// Snapshot of the in-memory tables
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStatsResponse {
    pub cache_entries: usize,
    pub in_flight: usize,
    #[schema(example = r#"{"search": 12, "media": 3}"#)]
    pub rate_windows: BTreeMap<String, usize>,
}

impl From<AdminStats> for AdminStatsResponse {
    fn from(stats: AdminStats) -> Self {
        Self {
            cache_entries: stats.cache_entries,
            in_flight: stats.in_flight,
            rate_windows: stats
                .rate_windows
                .into_iter()
                .map(|(name, count)| (name.to_string(), count))
                .collect(),
        }
    }
}

/// Error response model
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    #[schema(example = "VALIDATION_ERROR")]
    pub code: String,

    /// Human-readable error message
    #[schema(example = "Validation error: query is required")]
    pub message: String,

    /// Additional error context
    #[schema(example = r#"{"retry_after": 12}"#)]
    pub details: Option<serde_json::Value>,

    /// Unique request identifier for tracking and support
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub request_id: Uuid,

    /// Error occurrence timestamp
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service health status
    #[schema(example = "healthy")]
    pub status: String,

    /// Current service version
    #[schema(example = "0.1.0")]
    pub version: String,

    /// Health check timestamp
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,

    /// Table sizes and uptime
    #[schema(example = r#"{"cache_entries": 120, "in_flight": 2, "uptime_seconds": 3600}"#)]
    pub details: Option<serde_json::Value>,
}
