//! Orbis Daemon
//!
//! Country data refresh service and read API.
//!
//! # Usage
//!
//! ```bash
//! # Start with default configuration
//! cargo run -p orbisd
//!
//! # Start with custom environment
//! ORBIS_ENV=test ORBIS_API_PORT=8081 cargo run -p orbisd
//!
//! # Schema management (requires the postgres feature)
//! DATABASE_URL=postgres://... cargo run -p orbisd --features postgres -- db migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ORBIS_ENV`: Environment (test, development, production)
//! - `ORBIS_API_HOST`: API host (default: 0.0.0.0)
//! - `ORBIS_API_PORT`: API port (default: 8080)
//! - `ORBIS_COUNTRIES_URL`: Countries dataset (default: restcountries v2)
//! - `ORBIS_RATES_URL`: Exchange-rate dataset (default: open.er-api.com, USD base)
//! - `ORBIS_HTTP_TIMEOUT_SECS`: Optional upstream request deadline (default: none)
//! - `ORBIS_CACHE_DIR`: Summary image directory (default: cache)
//! - `ORBIS_GDP_SEED`: Seed for reproducible GDP estimates (default: random)
//! - `DATABASE_URL`: PostgreSQL store (postgres feature; default: in-memory)

use orbisd::{Config, Daemon};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("orbisd=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("db") {
        return run_db(&args).await;
    }

    // Load configuration
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        cache_dir = %config.summary.cache_dir.display(),
        "Orbis Daemon"
    );

    let daemon = Daemon::from_config(config).await?;
    daemon.run().await?;

    Ok(())
}

#[cfg(feature = "postgres")]
async fn run_db(args: &[String]) -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    orbisd::db::run_db_command(args).await
}

#[cfg(not(feature = "postgres"))]
async fn run_db(_args: &[String]) -> anyhow::Result<()> {
    Err(anyhow::anyhow!("db commands require orbisd to be built with the postgres feature"))
}
