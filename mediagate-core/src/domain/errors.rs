//! Mediation error taxonomy

use thiserror::Error;

/// Errors surfaced by the mediation layer.
///
/// The type is `Clone` because a single failed upstream operation is handed to
/// every coalesced waiter of the same key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediationError {
    /// Missing or malformed caller input
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Per-client request budget exhausted for the current window
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Credentials missing or not accepted
    #[error("Unauthorized")]
    Unauthorized,

    /// Request understood but refused
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// Upstream did not answer within the configured bound
    #[error("Upstream request timed out after {seconds}s")]
    UpstreamTimeout { seconds: u64 },

    /// Upstream answered with a failure or could not be reached
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable {
        status: Option<u16>,
        message: String,
    },

    /// Upstream body is larger than the buffering bound; pass it through unbuffered
    #[error("Upstream body exceeds {limit_bytes} bytes")]
    PayloadTooLarge { limit_bytes: usize },

    /// Anything unexpected
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl MediationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status code this error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            MediationError::Validation { .. } => 400,
            MediationError::Unauthorized => 401,
            MediationError::Forbidden { .. } => 403,
            MediationError::UpstreamTimeout { .. } => 408,
            MediationError::RateLimited { .. } => 429,
            MediationError::UpstreamUnavailable { status: Some(_), .. } => 502,
            MediationError::UpstreamUnavailable { status: None, .. } => 503,
            MediationError::PayloadTooLarge { .. } => 502,
            MediationError::Internal { .. } => 500,
        }
    }

    /// Machine-readable error code used in JSON error bodies
    pub fn code(&self) -> &'static str {
        match self {
            MediationError::Validation { .. } => "VALIDATION_ERROR",
            MediationError::RateLimited { .. } => "RATE_LIMITED",
            MediationError::Unauthorized => "UNAUTHORIZED",
            MediationError::Forbidden { .. } => "FORBIDDEN",
            MediationError::UpstreamTimeout { .. } => "UPSTREAM_TIMEOUT",
            MediationError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            MediationError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            MediationError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure originated upstream (candidates for fallback substitution)
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            MediationError::UpstreamTimeout { .. } | MediationError::UpstreamUnavailable { .. }
        )
    }
}

impl From<reqwest::Error> for MediationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MediationError::UpstreamTimeout { seconds: 0 }
        } else if err.is_connect() {
            MediationError::upstream(None, format!("Connection failed: {}", err))
        } else {
            MediationError::upstream(err.status().map(|s| s.as_u16()), err.to_string())
        }
    }
}

impl From<serde_json::Error> for MediationError {
    fn from(err: serde_json::Error) -> Self {
        MediationError::upstream(None, format!("Invalid JSON from upstream: {}", err))
    }
}
