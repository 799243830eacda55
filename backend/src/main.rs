//! Inventory Purchasing Platform - Backend Server

use std::{net::SocketAddr, time::Duration};

use purchasing_backend::{
    config::{Config, StorageBackend},
    create_app,
    store::{MemoryStore, PgStore, Store},
    AppState,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "po_server=debug,purchasing_backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Inventory Purchasing Server");
    tracing::info!("Environment: {}", config.environment);

    let prefix = config.purchasing.order_number_prefix.clone();
    match config.storage.backend {
        StorageBackend::Postgres => {
            // Create database connection pool
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;

            tracing::info!("Database connection established");
            let store = PgStore::new(db_pool, &prefix);

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                store.migrate().await?;
                tracing::info!("Migrations completed");
            }

            serve(store, config).await
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            serve(MemoryStore::new(&prefix), config).await
        }
    }
}

async fn serve<S: Store>(store: S, config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = create_app(AppState::new(store, config));

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
