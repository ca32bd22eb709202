//! Port implementations over the HTTP connectors.

use async_trait::async_trait;

use orbis_connectors::{ExchangeRateClient, RestCountriesClient};
use orbis_domain::{ExchangeRates, RawCountry};

use crate::error::{SourceKind, SyncError};
use crate::ports::{CountrySource, RateSource};

#[async_trait]
impl CountrySource for RestCountriesClient {
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SyncError> {
        RestCountriesClient::fetch_countries(self)
            .await
            .map_err(|e| SyncError::from_source(SourceKind::Countries, e))
    }
}

#[async_trait]
impl RateSource for ExchangeRateClient {
    async fn fetch_exchange_rates(&self) -> Result<ExchangeRates, SyncError> {
        self.fetch_rates()
            .await
            .map_err(|e| SyncError::from_source(SourceKind::ExchangeRates, e))
    }
}
