//! Window limiter behavior driven by a manual clock

use std::sync::Arc;
use std::time::Duration;

use mediagate_core::infrastructure::clock::ManualClock;
use mediagate_core::infrastructure::rate_limiter::SlidingWindowLimiter;

// ============================================================================
// Test Fixtures
// ============================================================================

fn limiter(limit: u32, window: Duration) -> (Arc<SlidingWindowLimiter>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let limiter = Arc::new(SlidingWindowLimiter::new(
        "search",
        limit,
        window,
        clock.clone(),
    ));
    (limiter, clock)
}

// ============================================================================
// Window semantics
// ============================================================================

#[test]
fn test_ten_per_minute_then_fresh_window() {
    let (limiter, clock) = limiter(10, Duration::from_secs(60));

    for i in 1..=10 {
        assert!(limiter.allow("203.0.113.9"), "call {} should pass", i);
        clock.advance(Duration::from_secs(1));
    }
    assert!(!limiter.allow("203.0.113.9"), "call 11 should be denied");

    clock.advance(Duration::from_secs(60));
    let decision = limiter.check("203.0.113.9");
    assert!(decision.allowed);
    // Fresh window: count is 1, so 9 remain
    assert_eq!(decision.remaining, 9);
}

#[test]
fn test_admin_policy_is_independent_of_search() {
    let clock = Arc::new(ManualClock::new());
    let search = SlidingWindowLimiter::new("search", 30, Duration::from_secs(60), clock.clone());
    let admin = SlidingWindowLimiter::new("admin", 10, Duration::from_secs(60), clock.clone());

    for _ in 0..10 {
        assert!(admin.allow("client"));
    }
    assert!(!admin.allow("client"));
    assert!(search.allow("client"));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_exceed_limit() {
    let (limiter, _clock) = limiter(25, Duration::from_secs(60));

    let mut handles = Vec::new();
    for _ in 0..100 {
        let limiter = Arc::clone(&limiter);
        handles.push(tokio::spawn(async move { limiter.allow("burst-client") }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 25);
}
