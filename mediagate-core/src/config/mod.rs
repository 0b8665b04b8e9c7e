//! Configuration management

pub mod validation;

pub use validation::{Validate, ValidationError};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub upstream: UpstreamConfig,
    pub rate_limits: RateLimitsConfig,
    pub cache: CacheConfig,
    pub media: MediaConfig,
    pub binary_proxy: BinaryProxyConfig,
    pub stats: StatsConfig,
    pub admin: AdminConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whether to expose interactive API docs (Swagger UI)
    pub enable_docs: bool,
    /// Global request timeout in seconds applied at the HTTP layer
    pub request_timeout_seconds: u64,
    /// Allowed CORS origins. `["*"]` allows any origin.
    pub allowed_origins: Vec<String>,
    /// Seconds to wait for in-flight work after a shutdown signal
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_docs: true,
            request_timeout_seconds: 30,
            allowed_origins: vec!["*".to_string()],
            shutdown_timeout_seconds: 5,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `json` or `pretty`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

/// Upstream origin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the search/commerce backend
    pub search_base_url: String,
    /// Base URL of the provider lookup backend
    pub provider_base_url: String,
    /// Bearer credential forwarded to the provider backend
    pub provider_api_key: Option<String>,
    /// Timeout for search and provider calls
    pub timeout_seconds: u64,
    /// Browser-like identity presented to origins
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            search_base_url: "http://127.0.0.1:8081".to_string(),
            provider_base_url: "http://127.0.0.1:8082".to_string(),
            provider_api_key: None,
            timeout_seconds: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Request budget for one endpoint family
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatePolicy {
    /// Requests allowed per window
    pub limit: u32,
    /// Window length in seconds
    pub window_seconds: u64,
}

impl RatePolicy {
    pub const fn new(limit: u32, window_seconds: u64) -> Self {
        Self {
            limit,
            window_seconds,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

/// Per-endpoint rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitsConfig {
    pub enabled: bool,
    pub search: RatePolicy,
    pub provider: RatePolicy,
    pub media: RatePolicy,
    pub binary: RatePolicy,
    pub preview: RatePolicy,
    pub stats: RatePolicy,
    pub admin: RatePolicy,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            search: RatePolicy::new(30, 60),
            provider: RatePolicy::new(30, 60),
            media: RatePolicy::new(30, 60),
            binary: RatePolicy::new(120, 60),
            preview: RatePolicy::new(30, 60),
            stats: RatePolicy::new(30, 60),
            admin: RatePolicy::new(10, 60),
        }
    }
}

impl RateLimitsConfig {
    /// All policies with their endpoint names, for validation and logging
    pub fn policies(&self) -> [(&'static str, RatePolicy); 7] {
        [
            ("search", self.search),
            ("provider", self.provider),
            ("media", self.media),
            ("binary", self.binary),
            ("preview", self.preview),
            ("stats", self.stats),
            ("admin", self.admin),
        ]
    }
}

/// Cache TTLs per endpoint purpose
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub search_ttl_seconds: u64,
    pub provider_ttl_seconds: u64,
    pub stats_ttl_seconds: u64,
    pub media_ttl_seconds: u64,
    pub binary_ttl_seconds: u64,
    pub preview_ttl_seconds: u64,
    /// TTL for placeholder outcomes, kept short so real content can reappear
    pub placeholder_ttl_seconds: u64,
    /// Bodies larger than this are served but not cached
    pub max_cacheable_body_bytes: usize,
    /// How often stale cache entries and closed rate windows are swept; 0 disables
    pub sweep_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_ttl_seconds: 120,
            provider_ttl_seconds: 120,
            stats_ttl_seconds: 600,
            media_ttl_seconds: 12 * 3600,
            binary_ttl_seconds: 6 * 3600,
            preview_ttl_seconds: 6 * 3600,
            placeholder_ttl_seconds: 300,
            max_cacheable_body_bytes: 25 * 1024 * 1024,
            sweep_interval_seconds: 60,
        }
    }
}

impl CacheConfig {
    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl_seconds)
    }

    pub fn provider_ttl(&self) -> Duration {
        Duration::from_secs(self.provider_ttl_seconds)
    }

    pub fn stats_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_ttl_seconds)
    }

    pub fn media_ttl(&self) -> Duration {
        Duration::from_secs(self.media_ttl_seconds)
    }

    pub fn binary_ttl(&self) -> Duration {
        Duration::from_secs(self.binary_ttl_seconds)
    }

    pub fn preview_ttl(&self) -> Duration {
        Duration::from_secs(self.preview_ttl_seconds)
    }

    pub fn placeholder_ttl(&self) -> Duration {
        Duration::from_secs(self.placeholder_ttl_seconds)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_seconds > 0).then(|| Duration::from_secs(self.sweep_interval_seconds))
    }
}

/// Media resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Vendor page hosts accepted by media resolution (subdomains included)
    pub allowed_hosts: Vec<String>,
    /// CDN base URLs candidates are expanded across, most likely first
    pub cdn_hosts: Vec<String>,
    /// Bound for a single candidate probe
    pub probe_timeout_ms: u64,
    /// Upper bound on generated candidates per resolution
    pub max_candidates: usize,
    /// Where unresolvable media is redirected to
    pub placeholder_url: String,
    /// Referer sent per origin host; unlisted hosts get their own origin
    pub referers: HashMap<String, String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        let mut referers = HashMap::new();
        referers.insert(
            "static.vecteezy.com".to_string(),
            "https://www.vecteezy.com/".to_string(),
        );
        referers.insert(
            "cdn.pixabay.com".to_string(),
            "https://pixabay.com/".to_string(),
        );

        Self {
            allowed_hosts: vec![
                "vecteezy.com".to_string(),
                "pixabay.com".to_string(),
                "pexels.com".to_string(),
                "freepik.com".to_string(),
            ],
            cdn_hosts: vec![
                "https://static.vecteezy.com".to_string(),
                "https://cdn.vecteezy.com".to_string(),
            ],
            probe_timeout_ms: 4000,
            max_candidates: 64,
            placeholder_url: "/assets/placeholder.svg".to_string(),
            referers,
        }
    }
}

impl MediaConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Binary proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BinaryProxyConfig {
    /// Hosts the proxy may fetch from; empty allows any http(s) host
    pub allowed_hosts: Vec<String>,
}

/// Aggregate statistics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Representative queries sampled from the search backend
    pub sample_queries: Vec<String>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            sample_queries: ["design", "business", "nature", "technology", "people", "background"]
                .iter()
                .map(|q| q.to_string())
                .collect(),
        }
    }
}

/// Privileged endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token for `/admin/*`; the endpoints are disabled when unset
    pub token: Option<String>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        // Add environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        // Local config and environment variables last (highest priority)
        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("MEDIAGATE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .with_list_parse_key("media.allowed_hosts")
                    .with_list_parse_key("media.cdn_hosts")
                    .with_list_parse_key("binary_proxy.allowed_hosts")
                    .with_list_parse_key("stats.sample_queries")
                    .try_parsing(true),
            );

        let config: Config = builder.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.logging.validate()?;
        self.upstream.validate()?;
        self.rate_limits.validate()?;
        self.cache.validate()?;
        self.media.validate()?;
        self.stats.validate()?;
        self.admin.validate()?;
        Ok(())
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}
