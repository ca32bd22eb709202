//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use orbis_connectors::{DEFAULT_COUNTRIES_URL, DEFAULT_RATES_URL};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Upstream dataset endpoints
    pub sources: SourcesConfig,

    /// Summary artifact configuration
    pub summary: SummaryConfig,

    /// Seed for the GDP multiplier; random when unset
    pub gdp_seed: Option<u64>,

    /// PostgreSQL connection string; in-memory store when unset
    pub database_url: Option<String>,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Upstream endpoints.
#[derive(Debug, Clone)]
pub struct SourcesConfig {
    /// Countries dataset URL
    pub countries_url: String,
    /// Exchange-rate dataset URL
    pub rates_url: String,
    /// Optional per-request deadline; the transport default applies when unset
    pub timeout: Option<Duration>,
}

/// Summary artifact configuration.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Directory the summary image is written to
    pub cache_dir: PathBuf,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let environment = Self::load_environment()?;
        let api = Self::load_api_config()?;
        let sources = Self::load_sources_config()?;
        let summary = SummaryConfig {
            cache_dir: env::var("ORBIS_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("cache")),
        };
        let gdp_seed = Self::load_optional_u64_env("ORBIS_GDP_SEED")?;
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());

        Ok(Self {
            api,
            sources,
            summary,
            gdp_seed,
            database_url,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            sources: SourcesConfig {
                countries_url: "http://127.0.0.1:9/countries".to_string(),
                rates_url: "http://127.0.0.1:9/rates".to_string(),
                timeout: None,
            },
            summary: SummaryConfig {
                cache_dir: env::temp_dir().join("orbisd-test-cache"),
            },
            gdp_seed: Some(42),
            database_url: None,
            environment: Environment::Test,
        }
    }

    fn load_environment() -> DaemonResult<Environment> {
        let env_str = env::var("ORBIS_ENV").unwrap_or_else(|_| "development".to_string());
        Environment::parse(&env_str)
    }

    fn load_api_config() -> DaemonResult<ApiConfig> {
        let host = env::var("ORBIS_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port_str = env::var("ORBIS_API_PORT").unwrap_or_else(|_| "8080".to_string());

        let port = port_str
            .parse::<u16>()
            .map_err(|_| DaemonError::Config(format!("Invalid ORBIS_API_PORT: {}", port_str)))?;

        Ok(ApiConfig { host, port })
    }

    fn load_sources_config() -> DaemonResult<SourcesConfig> {
        let countries_url =
            env::var("ORBIS_COUNTRIES_URL").unwrap_or_else(|_| DEFAULT_COUNTRIES_URL.to_string());
        let rates_url =
            env::var("ORBIS_RATES_URL").unwrap_or_else(|_| DEFAULT_RATES_URL.to_string());
        let timeout = match Self::load_optional_u64_env("ORBIS_HTTP_TIMEOUT_SECS")? {
            Some(0) => {
                return Err(DaemonError::Config(
                    "ORBIS_HTTP_TIMEOUT_SECS must be positive".to_string(),
                ))
            },
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(SourcesConfig {
            countries_url,
            rates_url,
            timeout,
        })
    }

    fn load_optional_u64_env(key: &str) -> DaemonResult<Option<u64>> {
        match env::var(key) {
            Ok(val) => val
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| DaemonError::Config(format!("Invalid {} value: {}", key, val))),
            Err(_) => Ok(None),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            sources: SourcesConfig {
                countries_url: DEFAULT_COUNTRIES_URL.to_string(),
                rates_url: DEFAULT_RATES_URL.to_string(),
                timeout: None,
            },
            summary: SummaryConfig {
                cache_dir: PathBuf::from("cache"),
            },
            gdp_seed: None,
            database_url: None,
            environment: Environment::Development,
        }
    }
}

impl Environment {
    /// Parse an `ORBIS_ENV` value.
    pub fn parse(value: &str) -> DaemonResult<Self> {
        match value.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid ORBIS_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
