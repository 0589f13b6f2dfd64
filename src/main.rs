use std::sync::Arc;
use std::time::Duration;

use papaya_api::{
    config::Config,
    db::{self, Cache, PgCatalogStore, PgLookStore, PgUserStore},
    routes::{create_router, AppState},
    services::{FeedComposer, GorseClient},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("papaya_api=debug,tower_http=info")),
        )
        .init();

    let pool = db::create_pool(&config.database_url).await?;
    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client).await;

    let recommender = Arc::new(GorseClient::new(
        config.recommender_url.clone(),
        config.recommender_api_key.clone(),
        Duration::from_secs(config.recommender_timeout_secs),
    )?);
    let looks = Arc::new(PgLookStore::new(pool.clone(), cache.clone()));

    let state = Arc::new(AppState {
        feed: FeedComposer::new(recommender.clone(), looks.clone()),
        looks,
        users: Arc::new(PgUserStore::new(pool.clone())),
        catalog: Arc::new(PgCatalogStore::new(pool, cache)),
        recommender,
        latest_app_version: config.latest_app_version.clone(),
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        addr = %config.bind_addr(),
        recommender = %config.recommender_url,
        "Server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_writer.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
