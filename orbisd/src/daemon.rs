//! Daemon: Main runtime orchestrator.
//!
//! The Daemon ties together all components:
//! - Store (in-memory, or PostgreSQL when configured)
//! - Source clients for the two upstream datasets
//! - Refresher and read facade
//! - API Server (HTTP endpoints)
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Select the store (running migrations for PostgreSQL)
//! 3. Wire clients, merge engine and summary renderer
//! 4. Serve the API
//! 5. Graceful shutdown on SIGINT

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use orbis_connectors::{ExchangeRateClient, RestCountriesClient};
use orbis_engine::{MergeEngine, SeededMultiplier};
use orbis_store::{MemoryStore, Store};
use orbis_sync::{CountryService, Refresher};

use crate::api::{create_router, ApiState};
use crate::config::Config;
use crate::error::{DaemonError, DaemonResult};
use crate::summary::SvgSummaryRenderer;

// =============================================================================
// Daemon
// =============================================================================

/// The main Orbis daemon.
pub struct Daemon<S: Store + ?Sized + 'static> {
    /// Configuration
    config: Config,
    /// Shared API state
    state: Arc<ApiState<S>>,
}

impl Daemon<dyn Store> {
    /// Create a daemon with the store selected by configuration.
    pub async fn from_config(config: Config) -> DaemonResult<Self> {
        let store: Arc<dyn Store> = match config.database_url.as_deref() {
            #[cfg(feature = "postgres")]
            Some(url) => connect_postgres(url).await?,
            #[cfg(not(feature = "postgres"))]
            Some(_) => {
                tracing::warn!("postgres feature disabled; ignoring DATABASE_URL");
                Arc::new(MemoryStore::new())
            },
            None => {
                info!("Using in-memory store");
                Arc::new(MemoryStore::new())
            },
        };

        Self::new(config, store)
    }
}

#[cfg(feature = "postgres")]
async fn connect_postgres(url: &str) -> DaemonResult<Arc<dyn Store>> {
    let store = orbis_store::PgStore::connect(url).await?;
    orbis_db::migrate(store.pool())
        .await
        .map_err(|e| DaemonError::Migration(e.to_string()))?;
    info!("Using PostgreSQL store");
    Ok(Arc::new(store))
}

impl<S: Store + ?Sized + 'static> Daemon<S> {
    /// Create a new daemon over `store`, wiring the HTTP source clients.
    pub fn new(config: Config, store: Arc<S>) -> DaemonResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.sources.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| DaemonError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let countries =
            RestCountriesClient::with_client(client.clone(), &config.sources.countries_url);
        let rates = ExchangeRateClient::with_client(client, &config.sources.rates_url);
        info!(
            countries = countries.url(),
            rates = rates.url(),
            timeout = ?config.sources.timeout,
            "Upstream sources configured"
        );

        let engine = match config.gdp_seed {
            Some(seed) => {
                let multiplier = SeededMultiplier::new(seed);
                info!(seed = multiplier.seed(), "Using seeded GDP multiplier");
                MergeEngine::new(Arc::new(multiplier))
            },
            None => MergeEngine::random(),
        };

        let renderer = SvgSummaryRenderer::new(&config.summary.cache_dir);
        let summary_path = renderer.summary_path();

        let refresher = Arc::new(Refresher::new(
            Arc::new(countries),
            Arc::new(rates),
            engine,
            store.clone(),
            Arc::new(renderer),
        ));

        let state = Arc::new(ApiState {
            refresher,
            countries: CountryService::new(store),
            summary_path,
        });

        Ok(Self { config, state })
    }

    /// Shared API state.
    pub fn state(&self) -> &Arc<ApiState<S>> {
        &self.state
    }

    /// Run the daemon.
    ///
    /// This method blocks until shutdown is requested (SIGINT).
    pub async fn run(self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            "Starting Orbis daemon"
        );

        let listener = self.bind().await?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "API server started");

        let router = create_router(self.state.clone());
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Shutdown complete");
        Ok(())
    }

    /// Start the API server in the background.
    pub async fn start_api_server(&self) -> DaemonResult<SocketAddr> {
        let listener = self.bind().await?;
        let local_addr = listener.local_addr()?;
        let router = create_router(self.state.clone());

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = %e, "API server error");
            }
        });

        Ok(local_addr)
    }

    async fn bind(&self) -> DaemonResult<TcpListener> {
        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);
        TcpListener::bind(&addr)
            .await
            .map_err(|e| DaemonError::Config(format!("Failed to bind to {}: {}", addr, e)))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Received shutdown signal");
}

// =============================================================================
// Tests
// =============================================================================
