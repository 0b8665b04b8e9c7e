//! Single-flight request coalescing
//!
//! Concurrent callers asking for the same key share one execution of the
//! underlying operation. The operation runs on its own task, so a caller
//! that disconnects never cancels work other callers are waiting on.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::domain::MediationError;

type SharedResult<T> = Shared<BoxFuture<'static, Result<T, MediationError>>>;

struct InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Distinguishes this execution from a later one under the same key
    id: u64,
    shared: SharedResult<T>,
    waiters: Arc<AtomicUsize>,
}

/// At most one in-flight execution per key
pub struct RequestCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    in_flight: Arc<DashMap<String, InFlight<T>>>,
    next_id: AtomicU64,
}

impl<T> RequestCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Run `op` for `key` unless an execution is already in flight, in which
    /// case wait for that one and receive its result.
    ///
    /// Every caller joined to one execution observes the same success value
    /// or the same error. The in-flight entry is removed as soon as the
    /// execution settles, so the next call starts fresh. `op` is invoked
    /// after the table lock is released and may use the coalescer itself.
    pub async fn run_exclusive<F, Fut>(&self, key: &str, op: F) -> Result<T, MediationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, MediationError>> + Send + 'static,
    {
        let (shared, owner) = match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(occupied) => {
                let joined = occupied.get().waiters.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(key = %key, waiters = joined, "Joining in-flight request");
                (occupied.get().shared.clone(), None)
            }
            Entry::Vacant(vacant) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let (settle, settled) = oneshot::channel();
                let shared = async move {
                    settled.await.unwrap_or_else(|_| {
                        Err(MediationError::internal("Upstream operation aborted"))
                    })
                }
                .boxed()
                .shared();

                vacant.insert(InFlight {
                    id,
                    shared: shared.clone(),
                    waiters: Arc::new(AtomicUsize::new(1)),
                });
                (shared, Some((id, settle)))
            }
        };

        if let Some((id, settle)) = owner {
            let table = Arc::clone(&self.in_flight);
            let owned_key = key.to_string();
            let work = op();

            // Detached: dropping any caller, the owner included, leaves it running
            tokio::spawn(async move {
                let result = match AssertUnwindSafe(work).catch_unwind().await {
                    Ok(result) => result,
                    Err(_) => {
                        error!(key = %owned_key, "Coalesced operation panicked");
                        Err(MediationError::internal("Upstream operation aborted"))
                    }
                };
                table.remove_if(&owned_key, |_, flight| flight.id == id);
                // Every waiter may already be gone
                let _ = settle.send(result);
            });
        }

        shared.await
    }

    /// Callers joined to the execution currently in flight for `key`
    pub fn waiters(&self, key: &str) -> usize {
        self.in_flight
            .get(key)
            .map(|flight| flight.waiters.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Number of keys with an execution in flight
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }
}

impl<T> Default for RequestCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
