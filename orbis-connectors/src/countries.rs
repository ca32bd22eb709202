//! Countries source client (restcountries v2 shape).
//!
//! Response: JSON array of
//! `{ name, capital, region, population, flag, currencies: [{ code, ... }] }`.

use reqwest::Client;
use tracing::info;

use orbis_domain::RawCountry;

use crate::http::{get_json, SourceError};

/// Default countries endpoint, trimmed to the fields we merge
pub const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";

/// HTTP client for the countries dataset.
#[derive(Debug, Clone)]
pub struct RestCountriesClient {
    client: Client,
    url: String,
}

impl RestCountriesClient {
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

    /// Fetch all countries.
    pub async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError> {
        let countries: Vec<RawCountry> = get_json(&self.client, &self.url).await?;
        info!(count = countries.len(), "Fetched countries");
        Ok(countries)
    }
}

impl Default for RestCountriesClient {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTRIES_URL)
    }
}
