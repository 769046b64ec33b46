mod cache;
mod config;
mod db;
mod errors;
mod routes;
mod state;
mod streaks;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::redis_backend::RedisBackend;
use crate::cache::CacheLayer;
use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::streaks::notify::PgNotificationSink;
use crate::streaks::store::PgStreakStore;
use crate::streaks::tracker::StreakTracker;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Stride API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize the cache layer. No REDIS_URL means the cache is disabled
    // and every read falls through to Postgres.
    let cache = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.clone())?;
            info!("Redis cache enabled");
            CacheLayer::new(Arc::new(RedisBackend::new(client)))
        }
        None => {
            info!("REDIS_URL not set; running with cache disabled");
            CacheLayer::disabled()
        }
    };

    // Wire the streak tracker with its Postgres collaborators
    let store = Arc::new(PgStreakStore::new(db.clone()));
    let notifier = Arc::new(PgNotificationSink::new(db.clone()));
    let tracker = StreakTracker::new(store, notifier, cache, config.rest_days_allowed);

    let state = AppState { tracker };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
