//! Domain Entities for Orbis
//!
//! Three shapes of a country travel through the system:
//! - `RawCountry` / `ExchangeRates`: decoded upstream payloads
//! - `MergedCountry`: the denormalized record produced by a refresh
//! - `Country`: a merged record persisted under a store-assigned id

use crate::value_objects::{CountrySort, DomainError, NameKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Store-assigned identifier for a Country
pub type CountryId = i64;

// =============================================================================
// Upstream records
// =============================================================================

/// Country metadata as published by the countries source.
///
/// Only `name` and `population` are required; the rest default when the
/// upstream omits them (e.g. territories without a capital).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCountry {
    pub name: String,
    #[serde(default)]
    pub capital: String,
    #[serde(default)]
    pub region: String,
    pub population: u64,
    #[serde(default)]
    pub flag: String,
    #[serde(default)]
    pub currencies: Vec<CurrencyEntry>,
}

impl RawCountry {
    /// Code of the first listed currency, or "" when none is listed.
    ///
    /// Only the first entry is considered, even when it carries no code.
    pub fn first_currency_code(&self) -> &str {
        self.currencies
            .first()
            .and_then(|c| c.code.as_deref())
            .unwrap_or("")
    }

    /// Case-insensitive identity key
    pub fn key(&self) -> Result<NameKey, DomainError> {
        NameKey::new(&self.name)
    }
}

/// One currency entry of a raw country
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyEntry {
    #[serde(default)]
    pub code: Option<String>,
}

impl CurrencyEntry {
    /// Entry with the given code
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
        }
    }
}

/// Exchange rates quoted as units of currency per one unit of the base currency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    #[serde(default)]
    pub base_code: Option<String>,
    pub rates: HashMap<String, f64>,
}

impl ExchangeRates {
    /// Build from an iterator of (code, rate) pairs
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            base_code: None,
            rates: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Look up a usable rate by exact, case-sensitive code.
    ///
    /// Empty codes, missing codes and rates that are not finite and positive
    /// all yield `None`.
    pub fn rate_for(&self, code: &str) -> Option<f64> {
        if code.is_empty() {
            return None;
        }
        self.rates
            .get(code)
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }

    /// Number of quoted currencies
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// True when no currency is quoted
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

// =============================================================================
// MergedCountry
// =============================================================================

/// A country joined with its exchange rate, ready to be reconciled.
///
/// # Invariants
/// - `estimated_gdp.is_some() == exchange_rate.is_some()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedCountry {
    pub name: String,
    pub capital: String,
    pub region: String,
    pub population: u64,
    pub currency_code: String,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: String,
    pub last_refreshed_at: DateTime<Utc>,
}

impl MergedCountry {
    /// Case-insensitive identity key
    pub fn key(&self) -> Result<NameKey, DomainError> {
        NameKey::new(&self.name)
    }

    /// True when a rate matched and GDP was derived
    pub fn has_rate(&self) -> bool {
        self.exchange_rate.is_some()
    }
}

// =============================================================================
// Country
// =============================================================================

/// A persisted country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub capital: String,
    pub region: String,
    pub population: u64,
    pub currency_code: String,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: String,
    pub last_refreshed_at: DateTime<Utc>,
}

impl Country {
    /// Materialize a merged record under a store-assigned id
    pub fn from_merged(id: CountryId, merged: &MergedCountry) -> Self {
        Self {
            id,
            name: merged.name.clone(),
            capital: merged.capital.clone(),
            region: merged.region.clone(),
            population: merged.population,
            currency_code: merged.currency_code.clone(),
            exchange_rate: merged.exchange_rate,
            estimated_gdp: merged.estimated_gdp,
            flag_url: merged.flag_url.clone(),
            last_refreshed_at: merged.last_refreshed_at,
        }
    }

    /// Overwrite the mutable fields in place.
    ///
    /// `id` and the stored `name` spelling are kept.
    pub fn apply(&mut self, merged: &MergedCountry) {
        self.capital = merged.capital.clone();
        self.region = merged.region.clone();
        self.population = merged.population;
        self.currency_code = merged.currency_code.clone();
        self.exchange_rate = merged.exchange_rate;
        self.estimated_gdp = merged.estimated_gdp;
        self.flag_url = merged.flag_url.clone();
        self.last_refreshed_at = merged.last_refreshed_at;
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, key: &NameKey) -> bool {
        key.matches(&self.name)
    }
}

// =============================================================================
// Queries and reports
// =============================================================================

/// Filters and sort order for listing countries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryQuery {
    /// Exact region match
    pub region: Option<String>,
    /// Exact currency code match
    pub currency: Option<String>,
    /// Sort order; insertion order when unset
    pub sort: Option<CountrySort>,
}

impl CountryQuery {
    /// Check whether a country passes the filters
    pub fn matches(&self, country: &Country) -> bool {
        let region_ok = self.region.as_deref().map_or(true, |r| country.region == r);
        let currency_ok = self
            .currency
            .as_deref()
            .map_or(true, |c| country.currency_code == c);
        region_ok && currency_ok
    }
}

/// Aggregate store status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub total_countries: u64,
    /// Most recent refresh across all countries; `None` for an empty store
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

/// Data rendered into the summary artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarySnapshot {
    pub total_countries: u64,
    /// Highest estimated GDP first
    pub top: Vec<Country>,
    pub generated_at: DateTime<Utc>,
}

/// Compare two optional GDP values: largest first, `None` last.
pub fn gdp_desc_nulls_last(a: Option<f64>, b: Option<f64>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// =============================================================================
// Tests
// =============================================================================
