//! Port definitions for the refresh pipeline.
//!
//! Ports define the interfaces for the upstream datasets and the summary
//! artifact. Adapters implement them for specific services (HTTP, stub, SVG).

use std::path::PathBuf;

use async_trait::async_trait;

use orbis_domain::{ExchangeRates, RawCountry, SummarySnapshot};

use crate::error::{RenderError, SyncError};

/// Port for the country metadata dataset.
///
/// Implementations:
/// - `RestCountriesClient` - HTTP (see `adapters`)
/// - `StubCountrySource` - fixed data for tests
#[async_trait]
pub trait CountrySource: Send + Sync {
    /// Fetch every country. One upstream call, no retry.
    ///
    /// Errors are `SourceUnavailable` or `DecodeFailed`.
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SyncError>;
}

/// Port for the exchange-rate dataset.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetch the rate table. One upstream call, no retry.
    ///
    /// Errors are `SourceUnavailable` or `DecodeFailed`.
    async fn fetch_exchange_rates(&self) -> Result<ExchangeRates, SyncError>;
}

/// Port for the downstream summary artifact.
#[async_trait]
pub trait SummaryRenderer: Send + Sync {
    /// Render and persist the snapshot, returning where it was written.
    async fn render(&self, snapshot: &SummarySnapshot) -> Result<PathBuf, RenderError>;
}
