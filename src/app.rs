//! Application setup and wiring

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio_util::sync::CancellationToken;

use mediagate_core::Config;
use mediagate_orchestrator::application::{MediationServices, Upstreams};
use mediagate_orchestrator::presentation::{OrchestratorState, create_router};

/// Handle returned from create_app for graceful shutdown coordination
pub struct AppHandle {
    pub router: Router,
    pub shutdown_token: CancellationToken,
}

/// Spawns a background worker that periodically drops stale cache entries
/// and closed rate windows. Respects the cancellation token for graceful shutdown.
fn spawn_sweep_worker(
    services: Arc<MediationServices>,
    interval: Duration,
    shutdown_token: CancellationToken,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => {
                    tracing::info!("Sweep worker received shutdown signal, stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let (entries, windows) = services.sweep();
                    if entries > 0 || windows > 0 {
                        tracing::info!(entries, windows, "Swept stale cache entries and rate windows");
                    }
                }
            }
        }
    });
}

/// Build the router over an explicit set of upstreams
pub fn create_app_with(config: &Config, upstreams: Upstreams) -> AppHandle {
    let shutdown_token = CancellationToken::new();
    let services = Arc::new(MediationServices::new(
        config,
        Arc::new(mediagate_core::infrastructure::SystemClock),
        upstreams,
    ));

    match config.cache.sweep_interval() {
        Some(interval) => {
            spawn_sweep_worker(Arc::clone(&services), interval, shutdown_token.clone());
            tracing::info!(interval_secs = interval.as_secs(), "Table sweep worker started");
        }
        None => tracing::info!("Table sweep disabled"),
    }

    let orchestrator_state = OrchestratorState::from(services.as_ref());
    let router = create_router(orchestrator_state, &config.server);

    AppHandle {
        router,
        shutdown_token,
    }
}

/// Create the application router and return an AppHandle for shutdown coordination
pub async fn create_app(
    config: Config,
) -> Result<AppHandle, Box<dyn std::error::Error + Send + Sync>> {
    tracing::info!(
        search = %config.upstream.search_base_url,
        provider = %config.upstream.provider_base_url,
        rate_limits = config.rate_limits.enabled,
        "Wiring upstream clients"
    );
    Ok(create_app_with(&config, Upstreams::from_config(&config)))
}
