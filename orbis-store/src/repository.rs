//! Repository trait definitions (Ports)
//!
//! These traits define the storage interface for the domain.
//! Implementations can be PostgreSQL, in-memory, or mock for testing.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orbis_domain::{Country, CountryId, CountryQuery, MergedCountry};

/// Repository for Country entities.
///
/// Every `name` argument is matched case-insensitively.
#[async_trait]
pub trait CountryRepository: Send + Sync {
    /// Find a country by name
    async fn find_by_name(&self, name: &str) -> Result<Option<Country>, StoreError>;

    /// Insert a new country, assigning its id
    async fn create(&self, country: &MergedCountry) -> Result<Country, StoreError>;

    /// Overwrite the mutable fields of an existing country; id and name are kept
    async fn update(&self, id: CountryId, country: &MergedCountry) -> Result<Country, StoreError>;

    /// Delete every country with this name, returning how many were removed
    async fn delete_by_name(&self, name: &str) -> Result<u64, StoreError>;

    /// Total number of countries
    async fn count(&self) -> Result<u64, StoreError>;

    /// List countries matching the query
    async fn list(&self, query: &CountryQuery) -> Result<Vec<Country>, StoreError>;

    /// Highest estimated GDP first, countries without GDP last
    async fn top_by_gdp(&self, limit: usize) -> Result<Vec<Country>, StoreError>;

    /// Most recent `last_refreshed_at`, `None` when empty
    async fn latest_refresh(&self) -> Result<Option<DateTime<Utc>>, StoreError>;
}

/// Combined store interface
pub trait Store: Send + Sync {
    /// Get country repository
    fn countries(&self) -> &dyn CountryRepository;
}
