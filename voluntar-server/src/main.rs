use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod graphql;
pub mod realtime;
pub mod repository;
pub mod service;
pub mod state;

use config::{Config, mask_credentials};
use realtime::EventBus;
use repository::{MemoryStore, Store, memory::SEED_PASSWORD};
use service::auth::{self, TokenService};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voluntar_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Voluntar server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;

    let store = open_store(&config).await?;

    let tokens = TokenService::new(&config.jwt_secret, config.jwt_ttl);
    tracing::info!("Access tokens expire after {}s", tokens.ttl().as_secs());

    let state = AppState::new(store, tokens, EventBus::new(config.event_capacity));

    // Build router with all endpoints
    let app = api::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}

/// Connects to PostgreSQL when configured, otherwise (or when the database
/// is unreachable and not required) serves from memory
async fn open_store(config: &Config) -> anyhow::Result<Store> {
    if let Some(url) = &config.database_url {
        tracing::info!("Connecting to database at {}", mask_credentials(url));

        match connect(url).await {
            Ok(pool) => {
                tracing::info!("Database ready");
                return Ok(Store::postgres(pool));
            }
            Err(err) if config.require_database => {
                return Err(err.context("Database is required but unavailable"));
            }
            Err(err) => {
                tracing::error!("Database unavailable, falling back to memory: {:#}", err);
            }
        }
    } else {
        tracing::info!("No DATABASE_URL set, using the in-memory store");
    }

    memory_store(config.seed).await
}

async fn connect(url: &str) -> anyhow::Result<sqlx::PgPool> {
    let pool = db::create_pool(url)
        .await
        .context("Failed to create database pool")?;

    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

async fn memory_store(seed: bool) -> anyhow::Result<Store> {
    if !seed {
        return Ok(Store::memory(MemoryStore::new()));
    }

    let hash = auth::hash_password(SEED_PASSWORD)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    tracing::info!("Seeded in-memory store with demo accounts and listings");

    Ok(Store::memory(MemoryStore::seeded(&hash)))
}
