//! Rate limiter types

use std::time::Duration;

/// Result of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Maximum requests allowed in a window
    pub limit: u32,
    /// Requests left in the current window after this one
    pub remaining: u32,
    /// Time until the current window closes
    pub reset_after: Duration,
}

impl RateDecision {
    pub fn allowed(limit: u32, remaining: u32, reset_after: Duration) -> Self {
        Self {
            allowed: true,
            limit,
            remaining,
            reset_after,
        }
    }

    pub fn blocked(limit: u32, reset_after: Duration) -> Self {
        Self {
            allowed: false,
            limit,
            remaining: 0,
            reset_after,
        }
    }

    /// Whole seconds until the window resets, rounded up and never zero
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 || secs == 0 {
            secs + 1
        } else {
            secs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_rounds_up() {
        let decision = RateDecision::blocked(10, Duration::from_millis(1500));
        assert_eq!(decision.retry_after_secs(), 2);

        let decision = RateDecision::blocked(10, Duration::from_secs(30));
        assert_eq!(decision.retry_after_secs(), 30);

        let decision = RateDecision::blocked(10, Duration::ZERO);
        assert_eq!(decision.retry_after_secs(), 1);
    }
}
