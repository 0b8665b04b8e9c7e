//! Entities owned by the mediation services

use bytes::Bytes;
use std::time::{Duration, Instant};

/// A cached upstream response.
///
/// Owned by the response cache; callers receive clones (the payload is a
/// reference-counted `Bytes`, so cloning does not copy the body).
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Bytes,
    pub content_type: String,
    pub expires_at: Instant,
    /// Stored payload is a substitute, not upstream content
    pub fallback: bool,
}

impl CacheEntry {
    /// An entry is stale once `now` reaches its expiry instant
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Request counter for one client key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateWindow {
    pub client_key: String,
    pub window_start: Instant,
    pub count: u32,
    pub limit: u32,
    pub window_duration: Duration,
}

impl RateWindow {
    pub fn open(client_key: &str, now: Instant, limit: u32, window_duration: Duration) -> Self {
        Self {
            client_key: client_key.to_string(),
            window_start: now,
            count: 1,
            limit,
            window_duration,
        }
    }

    pub fn has_elapsed(&self, now: Instant) -> bool {
        now >= self.window_start + self.window_duration
    }

    /// Time left until this window closes
    pub fn remaining_time(&self, now: Instant) -> Duration {
        (self.window_start + self.window_duration).saturating_duration_since(now)
    }
}

/// One guessed direct-asset location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub url: String,
    /// Generation order; lower is tried first
    pub priority: usize,
}

impl Candidate {
    pub fn new(url: impl Into<String>, priority: usize) -> Self {
        Self {
            url: url.into(),
            priority,
        }
    }
}

/// Why a probe did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeErrorKind {
    /// Origin answered with a non-2xx status
    Status,
    /// No answer within the probe bound
    Timeout,
    /// Connection, TLS or body transfer failure
    Network,
    /// Body larger than the caller is willing to buffer
    TooLarge,
}

impl ProbeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeErrorKind::Status => "status",
            ProbeErrorKind::Timeout => "timeout",
            ProbeErrorKind::Network => "network",
            ProbeErrorKind::TooLarge => "too_large",
        }
    }
}

/// Classified result of probing one candidate
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub candidate: Candidate,
    pub succeeded: bool,
    pub status_code: Option<u16>,
    pub body: Bytes,
    pub content_type: Option<String>,
    pub content_range: Option<String>,
    pub accept_ranges: Option<String>,
    pub error_kind: Option<ProbeErrorKind>,
}

impl ProbeOutcome {
    pub fn success(
        candidate: Candidate,
        status_code: u16,
        body: Bytes,
        content_type: Option<String>,
    ) -> Self {
        Self {
            candidate,
            succeeded: true,
            status_code: Some(status_code),
            body,
            content_type,
            content_range: None,
            accept_ranges: None,
            error_kind: None,
        }
    }

    pub fn failure(candidate: Candidate, status_code: Option<u16>, kind: ProbeErrorKind) -> Self {
        Self {
            candidate,
            succeeded: false,
            status_code,
            body: Bytes::new(),
            content_type: None,
            content_range: None,
            accept_ranges: None,
            error_kind: Some(kind),
        }
    }
}
