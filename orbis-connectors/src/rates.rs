//! Exchange-rate source client (open.er-api.com shape).
//!
//! Response: `{ "result": "success", "base_code": "USD", "rates": { "EUR": 0.92, ... } }`.

use reqwest::Client;
use tracing::info;

use orbis_domain::ExchangeRates;

use crate::http::{get_json, SourceError};

/// Default rates endpoint, quoted against USD
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// HTTP client for the exchange-rate dataset.
#[derive(Debug, Clone)]
pub struct ExchangeRateClient {
    client: Client,
    url: String,
}

impl ExchangeRateClient {
    /// Create a client for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Create a client sharing an existing connection pool.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Endpoint this client reads from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current rate table.
    pub async fn fetch_rates(&self) -> Result<ExchangeRates, SourceError> {
        let rates: ExchangeRates = get_json(&self.client, &self.url).await?;
        info!(
            count = rates.len(),
            base = rates.base_code.as_deref().unwrap_or("?"),
            "Fetched exchange rates"
        );
        Ok(rates)
    }
}

impl Default for ExchangeRateClient {
    fn default() -> Self {
        Self::new(DEFAULT_RATES_URL)
    }
}
