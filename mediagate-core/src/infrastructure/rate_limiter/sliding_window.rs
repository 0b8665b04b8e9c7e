//! Per-client window limiter
//!
//! A client's window opens on its first request and closes
//! `window_duration` later. Rejected requests do not touch the counter, so
//! a blocked client never extends its own lockout.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::types::RateDecision;
use crate::domain::RateWindow;
use crate::infrastructure::clock::Clock;

/// Window limiter keyed by client identity
pub struct SlidingWindowLimiter {
    name: &'static str,
    limit: u32,
    window_duration: Duration,
    windows: DashMap<String, RateWindow>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    /// Create a limiter admitting `limit` requests per `window_duration`
    pub fn new(
        name: &'static str,
        limit: u32,
        window_duration: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name,
            limit,
            window_duration,
            windows: DashMap::new(),
            clock,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window_duration(&self) -> Duration {
        self.window_duration
    }

    /// Count one request from `client_key` and decide whether it may proceed.
    ///
    /// The decision and the counter update happen under the map's per-key
    /// entry lock, so concurrent requests from one client never admit more
    /// than `limit` within a window.
    pub fn check(&self, client_key: &str) -> RateDecision {
        let now = self.clock.now();

        match self.windows.entry(client_key.to_string()) {
            Entry::Vacant(vacant) => {
                let window = RateWindow::open(client_key, now, self.limit, self.window_duration);
                let decision = RateDecision::allowed(
                    self.limit,
                    self.limit.saturating_sub(window.count),
                    window.remaining_time(now),
                );
                vacant.insert(window);
                decision
            }
            Entry::Occupied(mut occupied) => {
                let window = occupied.get_mut();

                if window.has_elapsed(now) {
                    *window = RateWindow::open(client_key, now, self.limit, self.window_duration);
                    return RateDecision::allowed(
                        self.limit,
                        self.limit.saturating_sub(window.count),
                        window.remaining_time(now),
                    );
                }

                if window.count < window.limit {
                    window.count += 1;
                    return RateDecision::allowed(
                        window.limit,
                        window.limit - window.count,
                        window.remaining_time(now),
                    );
                }

                let decision = RateDecision::blocked(window.limit, window.remaining_time(now));
                debug!(
                    limiter = self.name,
                    client = %client_key,
                    retry_after = decision.retry_after_secs(),
                    "Rate limit exceeded"
                );
                decision
            }
        }
    }

    /// Shorthand for `check(client_key).allowed`
    pub fn allow(&self, client_key: &str) -> bool {
        self.check(client_key).allowed
    }

    /// Number of tracked client windows, including closed ones not yet reused
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Forget clients whose window has closed, returning how many were dropped
    pub fn purge_elapsed(&self) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        self.windows.retain(|_, window| !window.has_elapsed(now));
        before.saturating_sub(self.windows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::ManualClock;

    fn limiter(limit: u32, window_secs: u64) -> (SlidingWindowLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let limiter = SlidingWindowLimiter::new(
            "test",
            limit,
            Duration::from_secs(window_secs),
            clock.clone(),
        );
        (limiter, clock)
    }

    #[test]
    fn test_admits_up_to_limit_then_blocks() {
        let (limiter, _clock) = limiter(3, 60);
        assert!(limiter.allow("a"));
        assert!(limiter.allow("a"));
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
        assert!(!limiter.allow("a"));
    }

    #[test]
    fn test_remaining_counts_down() {
        let (limiter, _clock) = limiter(2, 60);
        assert_eq!(limiter.check("a").remaining, 1);
        assert_eq!(limiter.check("a").remaining, 0);
        let blocked = limiter.check("a");
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
        assert_eq!(blocked.limit, 2);
    }

    #[test]
    fn test_window_resets_after_duration() {
        let (limiter, clock) = limiter(1, 10);
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));

        clock.advance(Duration::from_secs(9));
        assert!(!limiter.allow("a"));

        clock.advance(Duration::from_secs(1));
        assert!(limiter.allow("a"));
    }

    #[test]
    fn test_rejections_do_not_extend_window() {
        let (limiter, clock) = limiter(1, 10);
        assert!(limiter.allow("a"));
        for _ in 0..5 {
            clock.advance(Duration::from_secs(1));
            assert!(!limiter.allow("a"));
        }
        clock.advance(Duration::from_secs(5));
        assert!(limiter.allow("a"));
    }

    #[test]
    fn test_clients_are_independent() {
        let (limiter, _clock) = limiter(1, 60);
        assert!(limiter.allow("a"));
        assert!(limiter.allow("b"));
        assert!(!limiter.allow("a"));
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn test_blocked_reset_reports_time_left() {
        let (limiter, clock) = limiter(1, 60);
        limiter.check("a");
        clock.advance(Duration::from_secs(45));
        let decision = limiter.check("a");
        assert!(!decision.allowed);
        assert_eq!(decision.reset_after, Duration::from_secs(15));
        assert_eq!(decision.retry_after_secs(), 15);
    }

    #[test]
    fn test_purge_elapsed_drops_closed_windows() {
        let (limiter, clock) = limiter(5, 10);
        limiter.check("a");
        clock.advance(Duration::from_secs(6));
        limiter.check("b");
        clock.advance(Duration::from_secs(5));

        assert_eq!(limiter.purge_elapsed(), 1);
        assert_eq!(limiter.len(), 1);
        assert_eq!(limiter.check("b").remaining, 3);
    }
}
