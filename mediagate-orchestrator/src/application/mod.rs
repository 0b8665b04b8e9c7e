//! Orchestrator application layer
//!
//! One use case per endpoint family, each built on its own [`EndpointGate`].
//! All gates share a single response cache and coalescer; keys are
//! namespaced per endpoint so they never collide.

pub mod admin;
pub mod binary_proxy;
pub mod gate;
pub mod media_resolve;
pub mod preview;
pub mod provider;
pub mod search;
pub mod stats;

use std::sync::Arc;
use tracing::debug;

use mediagate_core::Config;
use mediagate_core::infrastructure::{
    CandidateResolver, Clock, HttpProbeFetcher, HttpProviderBackend, HttpSearchBackend, Prober,
    ProviderBackend, RequestCoalescer, ResponseCache, SearchBackend, SystemClock,
};

pub use admin::{AdminStats, AdminStatsUseCase};
pub use binary_proxy::{BinaryProxyUseCase, BinaryRequest, BinaryResponse};
pub use gate::{CacheStatus, EndpointGate, EndpointPolicy, Fetched, Served};
pub use media_resolve::{MediaResolution, MediaResolveUseCase, ResolvedMedia};
pub use preview::{PreviewImage, PreviewResolveUseCase};
pub use provider::{ProviderDataRequest, ProviderLookupUseCase, ProviderSearchRequest};
pub use search::{ResolveSearchUseCase, SearchRequest};
pub use stats::{AggregateStatsUseCase, StatCount, StatsReport};

/// Upstream collaborators, injectable for tests
pub struct Upstreams {
    pub search: Arc<dyn SearchBackend>,
    pub provider: Arc<dyn ProviderBackend>,
    pub prober: Arc<dyn Prober>,
}

impl Upstreams {
    /// HTTP clients built from configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            search: Arc::new(HttpSearchBackend::from_config(&config.upstream)),
            provider: Arc::new(HttpProviderBackend::from_config(&config.upstream)),
            prober: Arc::new(HttpProbeFetcher::from_config(&config.upstream, &config.media)),
        }
    }
}

/// Every use case, wired to shared state
pub struct MediationServices {
    pub search: Arc<ResolveSearchUseCase>,
    pub provider: Arc<ProviderLookupUseCase>,
    pub media: Arc<MediaResolveUseCase>,
    pub binary: Arc<BinaryProxyUseCase>,
    pub preview: Arc<PreviewResolveUseCase>,
    pub stats: Arc<AggregateStatsUseCase>,
    pub admin: Arc<AdminStatsUseCase>,
    pub cache: Arc<ResponseCache>,
    pub coalescer: Arc<RequestCoalescer<Fetched>>,
    gates: Vec<Arc<EndpointGate>>,
}

impl MediationServices {
    pub fn new(config: &Config, clock: Arc<dyn Clock>, upstreams: Upstreams) -> Self {
        let cache = Arc::new(ResponseCache::new(Arc::clone(&clock)));
        let coalescer: Arc<RequestCoalescer<Fetched>> = Arc::new(RequestCoalescer::new());
        let limits = &config.rate_limits;

        let gate = |name: &'static str, rate| {
            Arc::new(EndpointGate::new(
                EndpointPolicy::new(name, rate, limits.enabled),
                Arc::clone(&clock),
                Arc::clone(&cache),
                Arc::clone(&coalescer),
            ))
        };

        let search_gate = gate("search", limits.search);
        let provider_gate = gate("provider", limits.provider);
        let media_gate = gate("media", limits.media);
        let binary_gate = gate("binary", limits.binary);
        let preview_gate = gate("preview", limits.preview);
        let stats_gate = gate("stats", limits.stats);
        let admin_gate = gate("admin", limits.admin);

        let all_gates = vec![
            Arc::clone(&search_gate),
            Arc::clone(&provider_gate),
            Arc::clone(&media_gate),
            Arc::clone(&binary_gate),
            Arc::clone(&preview_gate),
            Arc::clone(&stats_gate),
            Arc::clone(&admin_gate),
        ];

        let resolver = Arc::new(CandidateResolver::from_config(&config.media));

        Self {
            search: Arc::new(ResolveSearchUseCase::new(
                search_gate,
                Arc::clone(&upstreams.search),
                config.cache.search_ttl(),
            )),
            provider: Arc::new(ProviderLookupUseCase::new(
                provider_gate,
                upstreams.provider,
                config.cache.provider_ttl(),
            )),
            media: Arc::new(MediaResolveUseCase::new(
                media_gate,
                resolver,
                Arc::clone(&upstreams.prober),
                &config.media,
                &config.cache,
            )),
            binary: Arc::new(BinaryProxyUseCase::new(
                binary_gate,
                Arc::clone(&upstreams.prober),
                &config.binary_proxy,
                &config.upstream,
                &config.cache,
            )),
            preview: Arc::new(PreviewResolveUseCase::new(
                preview_gate,
                upstreams.prober,
                &config.upstream,
                &config.cache,
            )),
            stats: Arc::new(AggregateStatsUseCase::new(
                stats_gate,
                upstreams.search,
                config.stats.sample_queries.clone(),
                config.cache.stats_ttl(),
            )),
            admin: Arc::new(AdminStatsUseCase::new(
                admin_gate,
                config.admin.token.as_deref(),
                Arc::clone(&cache),
                Arc::clone(&coalescer),
                all_gates.clone(),
            )),
            cache,
            coalescer,
            gates: all_gates,
        }
    }

    /// Drop stale cache entries and closed rate windows
    pub fn sweep(&self) -> (usize, usize) {
        let entries = self.cache.purge_expired();
        let windows: usize = self.gates.iter().map(|gate| gate.purge_rate_windows()).sum();
        debug!(entries, windows, "Swept in-memory tables");
        (entries, windows)
    }

    /// Production wiring: real HTTP clients and the system clock
    pub fn from_config(config: &Config) -> Self {
        Self::new(config, Arc::new(SystemClock), Upstreams::from_config(config))
    }
}
