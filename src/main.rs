//! AlgoJudge Standings - Application Entry Point

use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use redis::Client as RedisClient;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use algojudge_standings::{
    cache::{RedisCache, RedisDeadLetterQueue, RedisLockProvider},
    config::CONFIG,
    constants::API_BASE_PATH,
    db::{self, PgContestStore},
    handlers,
    realtime::RoomHub,
    services::{Engine, EngineDeps},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| CONFIG.server.rust_log.clone().into());
    let registry = tracing_subscriber::registry().with(filter);
    if CONFIG.server.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting standings engine...");

    // Initialize database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::connection::create_pool(&CONFIG.database).await?;

    // Run database migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&db_pool).await?;

    // Initialize Redis connection
    tracing::info!("Connecting to Redis...");
    let redis_client = RedisClient::open(CONFIG.redis.url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;

    // Wire the engine
    let hub = RoomHub::default();
    let engine = Engine::new(
        EngineDeps {
            store: Arc::new(PgContestStore::new(db_pool)),
            locks: Arc::new(RedisLockProvider::new(redis_conn.clone())),
            cache: Arc::new(RedisCache::new(redis_conn.clone())),
            dead_letters: Arc::new(RedisDeadLetterQueue::new(redis_conn)),
            publisher: Arc::new(hub.clone()),
        },
        CONFIG.standings.clone(),
        CONFIG.dead_letter.clone(),
    );

    let _replay = engine.dead_letters.clone().spawn();

    // Create application state
    let state = AppState::new(engine, hub);

    // Build the router
    let app = Router::new()
        .nest(API_BASE_PATH, handlers::routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start the server
    let addr = SocketAddr::new(CONFIG.server.host.parse()?, CONFIG.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
