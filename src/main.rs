use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use resource_proxy::auth::{IdentityProvider, JwtIdentityProvider};
use resource_proxy::config::{self, StoreBackend};
use resource_proxy::database::{DocumentStore, InMemoryStore, PostgresStore};
use resource_proxy::resource::ResourceRegistry;
use resource_proxy::schema::SchemaCatalog;
use resource_proxy::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Resource Proxy in {:?} mode", config.environment);

    let catalog = SchemaCatalog::from_dir(&config.schemas.dir)
        .with_context(|| format!("failed to load schemas from {}", config.schemas.dir.display()))?;
    if catalog.is_empty() {
        tracing::warn!("No schemas registered; every resource request will return 404");
    }

    let mut postgres = None;
    let store: Arc<dyn DocumentStore> = match config.database.backend {
        StoreBackend::Postgres => {
            let store = PostgresStore::connect(&config.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            postgres = Some(store.clone());
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            Arc::new(InMemoryStore::new())
        }
    };

    let identity: Arc<dyn IdentityProvider> = Arc::new(
        JwtIdentityProvider::from_config(&config.security).context("JWT_SECRET must be set")?,
    );

    let registry = Arc::new(ResourceRegistry::new(Arc::new(catalog), store));
    let app = server::app(AppState::new(registry, identity), config);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Resource Proxy listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(store) = postgres {
        store.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
