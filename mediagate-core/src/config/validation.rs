//! Configuration validation module

use crate::config::{
    AdminConfig, CacheConfig, LoggingConfig, MediaConfig, RateLimitsConfig, ServerConfig,
    StatsConfig, UpstreamConfig,
};

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Server configuration error: {message}")]
    Server { message: String },

    #[error("Logging configuration error: {message}")]
    Logging { message: String },

    #[error("Upstream configuration error: {message}")]
    Upstream { message: String },

    #[error("Rate limit configuration error: {message}")]
    RateLimit { message: String },

    #[error("Cache configuration error: {message}")]
    Cache { message: String },

    #[error("Media configuration error: {message}")]
    Media { message: String },

    #[error("Statistics configuration error: {message}")]
    Stats { message: String },

    #[error("Admin configuration error: {message}")]
    Admin { message: String },
}

impl ValidationError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn media(message: impl Into<String>) -> Self {
        Self::Media {
            message: message.into(),
        }
    }

    pub fn stats(message: impl Into<String>) -> Self {
        Self::Stats {
            message: message.into(),
        }
    }

    pub fn admin(message: impl Into<String>) -> Self {
        Self::Admin {
            message: message.into(),
        }
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // u16 cannot exceed 65535, so only 0 is out of range
        if self.port == 0 {
            return Err(ValidationError::server(format!(
                "Port must be in range 1-65535, got {}",
                self.port
            )));
        }

        if self.host.is_empty() {
            return Err(ValidationError::server("Host cannot be empty"));
        }

        if self.request_timeout_seconds == 0 {
            return Err(ValidationError::server(
                "Request timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.format.as_str() {
            "json" | "pretty" => Ok(()),
            other => Err(ValidationError::logging(format!(
                "Log format must be 'json' or 'pretty', got: {}",
                other
            ))),
        }
    }
}

impl Validate for UpstreamConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !is_http_url(&self.search_base_url) {
            return Err(ValidationError::upstream(format!(
                "search_base_url must start with http:// or https://, got: {}",
                self.search_base_url
            )));
        }

        if !is_http_url(&self.provider_base_url) {
            return Err(ValidationError::upstream(format!(
                "provider_base_url must start with http:// or https://, got: {}",
                self.provider_base_url
            )));
        }

        if self.timeout_seconds == 0 {
            return Err(ValidationError::upstream(
                "Upstream timeout must be greater than 0 seconds",
            ));
        }

        Ok(())
    }
}

impl Validate for RateLimitsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        for (name, policy) in self.policies() {
            if policy.limit == 0 {
                return Err(ValidationError::rate_limit(format!(
                    "{} limit must be at least 1 request per window",
                    name
                )));
            }
            if policy.window_seconds == 0 {
                return Err(ValidationError::rate_limit(format!(
                    "{} window must be at least 1 second",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl Validate for CacheConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let ttls = [
            ("search", self.search_ttl_seconds),
            ("provider", self.provider_ttl_seconds),
            ("stats", self.stats_ttl_seconds),
            ("media", self.media_ttl_seconds),
            ("binary", self.binary_ttl_seconds),
            ("preview", self.preview_ttl_seconds),
            ("placeholder", self.placeholder_ttl_seconds),
        ];
        for (name, ttl) in ttls {
            if ttl == 0 {
                return Err(ValidationError::cache(format!(
                    "{} TTL must be greater than 0 seconds",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl Validate for MediaConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_candidates == 0 {
            return Err(ValidationError::media("max_candidates must be at least 1"));
        }

        if self.probe_timeout_ms == 0 {
            return Err(ValidationError::media(
                "Probe timeout must be greater than 0 milliseconds",
            ));
        }

        for host in &self.cdn_hosts {
            if !is_http_url(host) {
                return Err(ValidationError::media(format!(
                    "CDN host must start with http:// or https://, got: {}",
                    host
                )));
            }
        }

        if self.placeholder_url.is_empty() {
            return Err(ValidationError::media("placeholder_url cannot be empty"));
        }

        Ok(())
    }
}

impl Validate for StatsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.sample_queries.iter().all(|q| q.trim().is_empty()) {
            return Err(ValidationError::stats(
                "At least one non-empty sample query is required",
            ));
        }
        Ok(())
    }
}

impl Validate for AdminConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(token) = &self.token
            && token.trim().is_empty()
        {
            return Err(ValidationError::admin(
                "Admin token cannot be blank; leave it unset to disable admin endpoints",
            ));
        }
        Ok(())
    }
}
