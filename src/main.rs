use std::sync::Arc;

use movie_swiper::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, Cache, JsonFileWatchlistStore},
    services::{SessionConfig, SwipeSession, TmdbClient},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,movie_swiper=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (cache, cache_handle) = match &config.redis_url {
        Some(url) => Cache::new(create_redis_client(url)?),
        None => {
            tracing::info!("REDIS_URL not set, catalog responses will not be cached");
            Cache::disabled()
        }
    };

    let catalog = Arc::new(TmdbClient::from_config(&config, cache));

    let watchlist_path = config.resolve_watchlist_path();
    tracing::info!(path = %watchlist_path.display(), "Opening watchlist");
    let watchlist = Arc::new(JsonFileWatchlistStore::open(watchlist_path).await);

    let session = SwipeSession::start(catalog, watchlist, SessionConfig::from_config(&config)).await;
    let app = create_router(AppState::new(session));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_handle.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
