//! Infrastructure Layer - time, storage, coordination and origin access
//!
//! Everything here is process-local. Shared tables are concurrent maps so
//! that request tasks never serialize on a global lock.

pub mod cache;
pub mod clock;
pub mod coalescer;
pub mod fallback;
pub mod probe;
pub mod rate_limiter;
pub mod resolver;
pub mod upstream;

pub use cache::ResponseCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use coalescer::RequestCoalescer;
pub use probe::{HttpProbeFetcher, ProbeRequest, Prober};
pub use rate_limiter::{RateDecision, SlidingWindowLimiter};
pub use resolver::CandidateResolver;
pub use upstream::{HttpProviderBackend, HttpSearchBackend, ProviderBackend, SearchBackend};
