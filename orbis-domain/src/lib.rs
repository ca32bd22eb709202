//! Orbis Domain Layer
//!
//! Pure domain types with zero I/O dependencies.
//! Contains upstream records, merged and stored countries, and value objects.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
#[allow(missing_docs)]
pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use entities::{
    gdp_desc_nulls_last, Country, CountryId, CountryQuery, CurrencyEntry, ExchangeRates,
    MergedCountry, RawCountry, StatusReport, SummarySnapshot,
};
pub use value_objects::{CountrySort, DomainError, NameKey};
