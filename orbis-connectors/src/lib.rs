//! Orbis Upstream Connectors
//!
//! HTTP clients for the two upstream datasets:
//! - countries (name, capital, region, population, flag, currencies)
//! - exchange rates against a fixed base currency
//!
//! Each fetch is a single GET with no retry; timeouts come from the
//! `reqwest::Client` passed to `with_client`.

#![warn(clippy::all)]

// Public modules
pub mod countries;
pub mod http;
pub mod rates;

// Re-exports
pub use countries::{RestCountriesClient, DEFAULT_COUNTRIES_URL};
pub use http::SourceError;
pub use rates::{ExchangeRateClient, DEFAULT_RATES_URL};
