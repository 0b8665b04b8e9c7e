//! Parameterized endpoint gate
//!
//! Every endpoint family runs the same pipeline: rate gate, cache lookup,
//! coalesced fetch, cache store. A gate is that pipeline bound to one
//! endpoint's limit, window and namespace; orchestrators supply only the
//! fetch operation.

use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use mediagate_core::config::RatePolicy;
use mediagate_core::domain::MediationError;
use mediagate_core::infrastructure::cache::ResponseCache;
use mediagate_core::infrastructure::clock::Clock;
use mediagate_core::infrastructure::coalescer::RequestCoalescer;
use mediagate_core::infrastructure::rate_limiter::{RateDecision, SlidingWindowLimiter};

/// Budget for one endpoint family
#[derive(Debug, Clone, Copy)]
pub struct EndpointPolicy {
    pub name: &'static str,
    pub rate: RatePolicy,
    /// Whether the rate gate is enforced at all
    pub rate_limited: bool,
}

impl EndpointPolicy {
    pub fn new(name: &'static str, rate: RatePolicy, rate_limited: bool) -> Self {
        Self {
            name,
            rate,
            rate_limited,
        }
    }
}

/// Result of a fetch operation, before it reaches the caller
#[derive(Debug, Clone)]
pub struct Fetched {
    pub payload: Bytes,
    pub content_type: String,
    /// How long to cache; `None` leaves the cache untouched
    pub cache_ttl: Option<Duration>,
    /// A substitute was served instead of upstream content
    pub fallback: bool,
}

impl Fetched {
    pub fn cacheable(payload: Bytes, content_type: impl Into<String>, ttl: Duration) -> Self {
        Self {
            payload,
            content_type: content_type.into(),
            cache_ttl: Some(ttl),
            fallback: false,
        }
    }

    pub fn fallback(payload: Bytes, content_type: impl Into<String>, ttl: Option<Duration>) -> Self {
        Self {
            payload,
            content_type: content_type.into(),
            cache_ttl: ttl,
            fallback: true,
        }
    }
}

/// Where a served payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Payload ready to be written to the caller
#[derive(Debug, Clone)]
pub struct Served {
    pub payload: Bytes,
    pub content_type: String,
    pub cache: CacheStatus,
    pub fallback: bool,
    pub rate: Option<RateDecision>,
}

/// Rate gate + cache + coalescer for one endpoint family
pub struct EndpointGate {
    policy: EndpointPolicy,
    limiter: SlidingWindowLimiter,
    cache: Arc<ResponseCache>,
    coalescer: Arc<RequestCoalescer<Fetched>>,
}

impl EndpointGate {
    pub fn new(
        policy: EndpointPolicy,
        clock: Arc<dyn Clock>,
        cache: Arc<ResponseCache>,
        coalescer: Arc<RequestCoalescer<Fetched>>,
    ) -> Self {
        let limiter =
            SlidingWindowLimiter::new(policy.name, policy.rate.limit, policy.rate.window(), clock);
        Self {
            policy,
            limiter,
            cache,
            coalescer,
        }
    }

    pub fn name(&self) -> &'static str {
        self.policy.name
    }

    /// Tracked client windows for this endpoint
    pub fn rate_windows(&self) -> usize {
        self.limiter.len()
    }

    /// Forget clients whose window has closed
    pub fn purge_rate_windows(&self) -> usize {
        self.limiter.purge_elapsed()
    }

    /// RateGate: count the request and reject it if the client is over budget
    pub fn admit(&self, client: &str) -> Result<Option<RateDecision>, MediationError> {
        if !self.policy.rate_limited {
            return Ok(None);
        }

        let decision = self.limiter.check(client);
        if decision.allowed {
            Ok(Some(decision))
        } else {
            Err(MediationError::RateLimited {
                retry_after_secs: decision.retry_after_secs(),
            })
        }
    }

    /// Full pipeline: rate gate, then cached-or-coalesced fetch
    pub async fn serve<F, Fut>(
        &self,
        client: &str,
        key: &str,
        fetch: F,
    ) -> Result<Served, MediationError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Fetched, MediationError>> + Send + 'static,
    {
        let rate = self.admit(client)?;
        let mut served = self.lookup_or_fetch(key, fetch).await?;
        served.rate = rate;
        Ok(served)
    }

    /// Cache lookup, then a coalesced fetch on miss.
    ///
    /// The owning operation re-checks the cache before fetching: a caller
    /// that missed just as a previous owner finished storing must not
    /// trigger a second upstream call.
    pub async fn lookup_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<Served, MediationError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Fetched, MediationError>> + Send + 'static,
    {
        if let Some(entry) = self.cache.get(key) {
            debug!(endpoint = self.policy.name, key = %key, "Cache hit");
            return Ok(Served {
                payload: entry.payload,
                content_type: entry.content_type,
                cache: CacheStatus::Hit,
                fallback: entry.fallback,
                rate: None,
            });
        }

        debug!(endpoint = self.policy.name, key = %key, "Cache miss");

        let cache = Arc::clone(&self.cache);
        let owned_key = key.to_string();
        let fetched = self
            .coalescer
            .run_exclusive(key, move || async move {
                if let Some(entry) = cache.get(&owned_key) {
                    return Ok(Fetched {
                        payload: entry.payload,
                        content_type: entry.content_type,
                        cache_ttl: None,
                        fallback: entry.fallback,
                    });
                }

                let fetched = fetch().await?;
                match (fetched.cache_ttl, fetched.fallback) {
                    (Some(ttl), false) => {
                        cache.put(&owned_key, fetched.payload.clone(), &fetched.content_type, ttl)
                    }
                    (Some(ttl), true) => cache.put_fallback(
                        &owned_key,
                        fetched.payload.clone(),
                        &fetched.content_type,
                        ttl,
                    ),
                    (None, _) => {}
                }
                Ok(fetched)
            })
            .await?;

        Ok(Served {
            payload: fetched.payload,
            content_type: fetched.content_type,
            cache: CacheStatus::Miss,
            fallback: fetched.fallback,
            rate: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use mediagate_core::infrastructure::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn gate(limit: u32) -> (EndpointGate, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let gate = EndpointGate::new(
            EndpointPolicy::new("search", RatePolicy::new(limit, 60), true),
            clock.clone(),
            Arc::new(ResponseCache::new(clock.clone())),
            Arc::new(RequestCoalescer::new()),
        );
        (gate, clock)
    }

    fn counted_fetch(
        calls: Arc<AtomicUsize>,
        ttl: Option<Duration>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Fetched, MediationError>> + Send + 'static {
        move || {
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let payload = Bytes::from_static(b"{}");
                Ok(match ttl {
                    Some(ttl) => Fetched::cacheable(payload, "application/json", ttl),
                    None => Fetched::fallback(payload, "application/json", None),
                })
            })
        }
    }

    #[tokio::test]
    async fn test_second_request_is_cache_hit() {
        let (gate, _clock) = gate(10);
        let calls = Arc::new(AtomicUsize::new(0));

        let first = gate
            .serve("c", "search:x:1", counted_fetch(calls.clone(), Some(Duration::from_secs(120))))
            .await
            .unwrap();
        let second = gate
            .serve("c", "search:x:1", counted_fetch(calls.clone(), Some(Duration::from_secs(120))))
            .await
            .unwrap();

        assert_eq!(first.cache, CacheStatus::Miss);
        assert_eq!(second.cache, CacheStatus::Hit);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.rate.unwrap().remaining, 8);
    }

    #[tokio::test]
    async fn test_uncached_fallback_is_refetched() {
        let (gate, _clock) = gate(10);
        let calls = Arc::new(AtomicUsize::new(0));

        let served = gate
            .serve("c", "search:x:1", counted_fetch(calls.clone(), None))
            .await
            .unwrap();
        assert!(served.fallback);
        gate.serve("c", "search:x:1", counted_fetch(calls.clone(), None))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cached_fallback_hit_is_still_marked_fallback() {
        let (gate, clock) = gate(10);
        let calls = Arc::new(AtomicUsize::new(0));
        let placeholder = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Fetched::fallback(
                    Bytes::from_static(b"<svg/>"),
                    "image/svg+xml",
                    Some(Duration::from_secs(300)),
                ))
            }
        };

        let first = gate
            .serve("c", "binary:image:x", placeholder(calls.clone()))
            .await
            .unwrap();
        let second = gate
            .serve("c", "binary:image:x", placeholder(calls.clone()))
            .await
            .unwrap();
        assert!(first.fallback);
        assert_eq!(second.cache, CacheStatus::Hit);
        assert!(second.fallback);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(301));
        gate.serve("c", "binary:image:x", placeholder(calls.clone()))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_gate_rejects_before_fetch() {
        let (gate, _clock) = gate(1);
        let calls = Arc::new(AtomicUsize::new(0));

        gate.serve("c", "k1", counted_fetch(calls.clone(), Some(Duration::from_secs(1))))
            .await
            .unwrap();
        let err = gate
            .serve("c", "k2", counted_fetch(calls.clone(), Some(Duration::from_secs(1))))
            .await
            .unwrap_err();

        assert!(matches!(err, MediationError::RateLimited { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let (gate, _clock) = gate(10);
        let err = gate
            .serve("c", "k", || async { Err(MediationError::upstream(Some(500), "boom")) })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 502);

        let calls = Arc::new(AtomicUsize::new(0));
        gate.serve("c", "k", counted_fetch(calls.clone(), Some(Duration::from_secs(5))))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
