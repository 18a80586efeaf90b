//! HTTP server initialization and runtime setup.
//!
//! Handles cache backend selection, service wiring, the initial network probe
//! and the Axum server lifecycle.

use crate::application::services::{ImageCacheService, NetworkMonitor, ResponseCacheStore};
use crate::config::Config;
use crate::domain::repositories::VolatileCache;
use crate::infrastructure::cache::{FileCache, MemoryCache, RedisCache};
use crate::infrastructure::http::{HttpImageFetcher, HttpProbe, HttpUpstream};
use crate::infrastructure::media::FileImageRepository;
use crate::routes::app_router;
use crate::state::{AppState, PipelineSettings};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Volatile tier (Redis, or in-memory fallback)
/// - Durable tier and image store on the local filesystem
/// - Network monitor, with one probe before the first request
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - An HTTP client cannot be built
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config).await?;

    let initial = state.network.probe().await;
    tracing::info!("Initial network state: {}", initial);

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Builds the production [`AppState`] from configuration.
///
/// # Errors
///
/// Returns an error if one of the HTTP clients cannot be built.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let volatile: Arc<dyn VolatileCache> = if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url).await {
            Ok(redis) => {
                tracing::info!("Volatile tier: Redis");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using in-memory tier.", e);
                Arc::new(MemoryCache::with_capacity(config.memory_cache_max_entries))
            }
        }
    } else {
        tracing::info!("Volatile tier: in-memory");
        Arc::new(MemoryCache::with_capacity(config.memory_cache_max_entries))
    };

    let durable = Arc::new(FileCache::new(config.cache_dir.clone()));
    let cache = Arc::new(ResponseCacheStore::new(volatile, durable, config.cache_ttl()));

    let probe = HttpProbe::new(config.probe_url.clone(), config.probe_timeout())
        .context("Failed to build probe client")?;
    let network = Arc::new(NetworkMonitor::new(
        Arc::new(probe),
        config.probe_cooldown(),
    ));

    let fetcher = HttpImageFetcher::new(config.image_fetch_timeout())
        .context("Failed to build image client")?;
    let image_store = FileImageRepository::new(
        config.image_cache_dir.clone(),
        config.image_public_path.clone(),
    );
    let images = Arc::new(ImageCacheService::new(
        Arc::new(image_store),
        Arc::new(fetcher),
        network.clone(),
        config.image_max_age(),
    ));

    let upstream = HttpUpstream::new(config.upstream_url.clone(), config.upstream_timeout())
        .context("Failed to build upstream client")?
        .with_max_body_bytes(config.max_body_bytes);

    Ok(AppState::new(
        network,
        cache,
        images,
        Arc::new(upstream),
        PipelineSettings::from(config),
    ))
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
