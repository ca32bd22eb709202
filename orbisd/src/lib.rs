//! Orbis Daemon Library
//!
//! Runtime for the country refresh service.
//!
//! # Architecture
//!
//! ```text
//! HTTP API → Refresher → (Countries API + Exchange Rates API) → Store
//!          ↘ CountryService → Store            ↘ SvgSummaryRenderer → cache/summary.svg
//! ```
//!
//! # Components
//!
//! - **Daemon**: Wires store, source clients and renderer; serves the API
//! - **API**: HTTP endpoints (axum)
//! - **Summary**: SVG summary image written after each refresh
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use orbisd::{Config, Daemon};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let daemon = Daemon::from_config(config).await?;
//!     daemon.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;
pub mod summary;

#[cfg(feature = "postgres")]
pub mod db;

// Re-exports for convenience
pub use api::{create_router, ApiState};
pub use config::{ApiConfig, Config, Environment, SourcesConfig, SummaryConfig};
pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult};
pub use summary::{SvgSummaryRenderer, SUMMARY_CONTENT_TYPE};
