//! Flight aggregator service binary.

use anyhow::Context;
use flight_aggregator::api::rest::{AppState, create_router};
use flight_aggregator::application::services::{FlightAggregationEngine, WeightedScoreStrategy};
use flight_aggregator::config::{AppConfig, ProviderSettings};
use flight_aggregator::infrastructure::cache::{FlightCache, FlightCacher, InMemoryStore, RedisStore};
use flight_aggregator::infrastructure::providers::{
    FileFlightSource, FlightSource, GovernorRateLimiter, HttpFlightSource, ProviderRegistry,
    RateLimiter, RedisRateLimiter, ResilientProvider,
};
use flight_aggregator::telemetry;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = match config_path() {
        Some(path) => AppConfig::load_from(&path, true),
        None => AppConfig::load(),
    }
    .context("loading configuration")?;

    telemetry::init_tracing(&config.log_level, config.log_json)
        .context("installing tracing subscriber")?;

    let (cache, limiter) = backends(&config).await?;
    let registry = build_registry(&config.providers, &limiter)?;
    if registry.is_empty() {
        warn!("no providers configured, every search will return no flights");
    }
    info!(providers = ?registry.names(), "providers registered");

    let engine = FlightAggregationEngine::new(
        Arc::new(registry),
        cache,
        Arc::new(WeightedScoreStrategy::new()),
        config.aggregator(),
    );

    let shutdown = CancellationToken::new();
    let mut state = AppState::new(Arc::new(engine), shutdown.clone());
    if let Some(timeout) = config.request_timeout() {
        state = state.with_request_timeout(timeout);
    }
    let router = create_router(Arc::new(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("serving HTTP")?;

    info!("shut down");
    Ok(())
}

/// Reads `--config <PATH>` from the command line.
fn config_path() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

/// Picks Redis for cache and rate limiting when configured, in-process
/// stores otherwise.
async fn backends(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn FlightCacher>, Arc<dyn RateLimiter>)> {
    match &config.redis.url {
        Some(url) => {
            let store = RedisStore::connect(url)
                .await
                .context("connecting to Redis")?;
            let limiter: Arc<dyn RateLimiter> =
                Arc::new(RedisRateLimiter::new(store.connection()));
            let cache: Arc<dyn FlightCacher> = Arc::new(FlightCache::new(Arc::new(store)));
            info!("using Redis cache and rate limiter");
            Ok((cache, limiter))
        }
        None => {
            let limiter: Arc<dyn RateLimiter> = Arc::new(GovernorRateLimiter::new());
            let cache: Arc<dyn FlightCacher> =
                Arc::new(FlightCache::new(Arc::new(InMemoryStore::new())));
            info!("using in-process cache and rate limiter");
            Ok((cache, limiter))
        }
    }
}

fn build_registry(
    providers: &[ProviderSettings],
    limiter: &Arc<dyn RateLimiter>,
) -> anyhow::Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    for settings in providers {
        let source: Arc<dyn FlightSource> = match (&settings.url, &settings.path) {
            (Some(url), _) => Arc::new(
                HttpFlightSource::new(url.clone(), settings.timeout_ms)
                    .with_context(|| format!("building HTTP source for {}", settings.name))?,
            ),
            (None, Some(path)) => Arc::new(FileFlightSource::new(path.clone())),
            (None, None) => anyhow::bail!("provider {} needs a url or a path", settings.name),
        };
        let provider = ResilientProvider::new(settings.name.clone(), source, Arc::clone(limiter))
            .with_policy(settings.policy());
        registry = registry.with_provider(Arc::new(provider));
    }
    Ok(registry)
}

/// Resolves on Ctrl-C or SIGTERM and cancels every in-flight search.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, cancelling in-flight searches");
    shutdown.cancel();
}
