//! In-memory store implementation
//!
//! Used for testing and development without a database.
//! Thread-safe using an async RwLock; each call holds the lock for one operation.

use crate::error::StoreError;
use crate::repository::{CountryRepository, Store};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orbis_domain::{
    gdp_desc_nulls_last, Country, CountryId, CountryQuery, CountrySort, MergedCountry, NameKey,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory store for testing
pub struct MemoryStore {
    /// Ordered by id, which is insertion order
    countries: RwLock<BTreeMap<CountryId, Country>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            countries: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(0),
        }
    }

    /// Get the number of countries
    pub async fn country_count(&self) -> usize {
        self.countries.read().await.len()
    }

    /// Snapshot of every stored country, in id order
    pub async fn all(&self) -> Vec<Country> {
        self.countries.read().await.values().cloned().collect()
    }

    /// Clear all data (useful for test setup)
    pub async fn clear(&self) {
        self.countries.write().await.clear();
        self.next_id.store(0, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Country Repository Implementation
// =============================================================================

#[async_trait]
impl CountryRepository for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Country>, StoreError> {
        let Ok(key) = NameKey::new(name) else {
            return Ok(None);
        };
        let countries = self.countries.read().await;
        Ok(countries.values().find(|c| c.is_named(&key)).cloned())
    }

    async fn create(&self, country: &MergedCountry) -> Result<Country, StoreError> {
        let key = country.key()?;
        let mut countries = self.countries.write().await;

        if countries.values().any(|c| c.is_named(&key)) {
            return Err(StoreError::duplicate("country", country.name.clone()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = Country::from_merged(id, country);
        countries.insert(id, stored.clone());
        debug!(id, name = %stored.name, "Country inserted");
        Ok(stored)
    }

    async fn update(&self, id: CountryId, country: &MergedCountry) -> Result<Country, StoreError> {
        let mut countries = self.countries.write().await;
        let existing = countries
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("country", id.to_string()))?;
        existing.apply(country);
        Ok(existing.clone())
    }

    async fn delete_by_name(&self, name: &str) -> Result<u64, StoreError> {
        let Ok(key) = NameKey::new(name) else {
            return Ok(0);
        };
        let mut countries = self.countries.write().await;
        let before = countries.len();
        countries.retain(|_, c| !c.is_named(&key));
        let removed = (before - countries.len()) as u64;
        debug!(name = key.as_str(), removed, "Countries deleted");
        Ok(removed)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.countries.read().await.len() as u64)
    }

    async fn list(&self, query: &CountryQuery) -> Result<Vec<Country>, StoreError> {
        let countries = self.countries.read().await;
        let mut found: Vec<Country> =
            countries.values().filter(|c| query.matches(c)).cloned().collect();

        if let Some(CountrySort::GdpDesc) = query.sort {
            // stable sort keeps id order among equal GDPs
            found.sort_by(|a, b| gdp_desc_nulls_last(a.estimated_gdp, b.estimated_gdp));
        }

        Ok(found)
    }

    async fn top_by_gdp(&self, limit: usize) -> Result<Vec<Country>, StoreError> {
        let query = CountryQuery {
            sort: Some(CountrySort::GdpDesc),
            ..Default::default()
        };
        let mut found = self.list(&query).await?;
        found.truncate(limit);
        Ok(found)
    }

    async fn latest_refresh(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let countries = self.countries.read().await;
        Ok(countries.values().map(|c| c.last_refreshed_at).max())
    }
}

// =============================================================================
// Store Implementation
// =============================================================================

impl Store for MemoryStore {
    fn countries(&self) -> &dyn CountryRepository {
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn merged(name: &str, region: &str, code: &str, gdp: Option<f64>) -> MergedCountry {
        MergedCountry {
            name: name.to_string(),
            capital: format!("{} City", name),
            region: region.to_string(),
            population: 1000,
            currency_code: code.to_string(),
            exchange_rate: gdp.map(|_| 1.0),
            estimated_gdp: gdp,
            flag_url: String::new(),
            last_refreshed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_case_insensitive() {
        let store = MemoryStore::new();
        let created = store.create(&merged("France", "Europe", "EUR", Some(1.0))).await.unwrap();

        for query in ["France", "FRANCE", "france"] {
            let found = store.find_by_name(query).await.unwrap();
            assert_eq!(found.map(|c| c.id), Some(created.id), "lookup {}", query);
        }
    }

    #[tokio::test]
    async fn test_padded_name_matches_trimmed_lookup() {
        let store = MemoryStore::new();
        let created = store.create(&merged(" France ", "Europe", "EUR", None)).await.unwrap();

        let found = store.find_by_name("france").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, " France ");

        let duplicate = store.create(&merged("FRANCE", "Europe", "EUR", None)).await;
        assert!(matches!(duplicate, Err(StoreError::Duplicate { .. })));
        assert_eq!(store.delete_by_name("France").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_blank_name_is_none() {
        let store = MemoryStore::new();
        assert!(store.find_by_name("  ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store.create(&merged("A", "X", "", None)).await.unwrap();
        let b = store.create(&merged("B", "X", "", None)).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn test_create_duplicate_name_is_rejected() {
        let store = MemoryStore::new();
        store.create(&merged("France", "Europe", "EUR", None)).await.unwrap();

        let result = store.create(&merged("FRANCE", "Europe", "EUR", None)).await;
        assert!(matches!(result, Err(StoreError::Duplicate { .. })));
        assert_eq!(store.country_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_in_place() {
        let store = MemoryStore::new();
        let created = store.create(&merged("France", "Europe", "EUR", Some(1.0))).await.unwrap();

        let mut changed = merged("FRANCE", "Europe", "EUR", None);
        changed.population = 68_000_000;
        let updated = store.update(created.id, &changed).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "France");
        assert_eq!(updated.population, 68_000_000);
        assert!(updated.estimated_gdp.is_none());
        assert_eq!(store.country_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_missing_id_is_not_found() {
        let store = MemoryStore::new();
        let result = store.update(99, &merged("Ghost", "X", "", None)).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_by_name() {
        let store = MemoryStore::new();
        store.create(&merged("France", "Europe", "EUR", None)).await.unwrap();
        store.create(&merged("Spain", "Europe", "EUR", None)).await.unwrap();

        assert_eq!(store.delete_by_name("fRaNcE").await.unwrap(), 1);
        assert_eq!(store.delete_by_name("France").await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let store = MemoryStore::new();
        store.create(&merged("France", "Europe", "EUR", Some(3.0))).await.unwrap();
        store.create(&merged("Japan", "Asia", "JPY", Some(5.0))).await.unwrap();
        store.create(&merged("Spain", "Europe", "EUR", None)).await.unwrap();

        let europe = store
            .list(&CountryQuery {
                region: Some("Europe".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(europe.len(), 2);

        let yen = store
            .list(&CountryQuery {
                currency: Some("JPY".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(yen.len(), 1);
        assert_eq!(yen[0].name, "Japan");

        let all = store.list(&CountryQuery::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["France", "Japan", "Spain"]);
    }

    #[tokio::test]
    async fn test_list_sorted_by_gdp_nulls_last() {
        let store = MemoryStore::new();
        store.create(&merged("None1", "X", "", None)).await.unwrap();
        store.create(&merged("Low", "X", "A", Some(1.0))).await.unwrap();
        store.create(&merged("High", "X", "B", Some(9.0))).await.unwrap();

        let sorted = store
            .list(&CountryQuery {
                sort: Some(CountrySort::GdpDesc),
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = sorted.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["High", "Low", "None1"]);
    }

    #[tokio::test]
    async fn test_top_by_gdp_limits() {
        let store = MemoryStore::new();
        for i in 0..8 {
            store.create(&merged(&format!("C{}", i), "X", "A", Some(i as f64))).await.unwrap();
        }

        let top = store.top_by_gdp(5).await.unwrap();
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].name, "C7");
        assert_eq!(top[4].name, "C3");
    }

    #[tokio::test]
    async fn test_latest_refresh() {
        let store = MemoryStore::new();
        assert!(store.latest_refresh().await.unwrap().is_none());

        let now = Utc::now();
        let mut older = merged("Old", "X", "", None);
        older.last_refreshed_at = now - Duration::hours(1);
        let mut newer = merged("New", "X", "", None);
        newer.last_refreshed_at = now;
        store.create(&older).await.unwrap();
        store.create(&newer).await.unwrap();

        assert_eq!(store.latest_refresh().await.unwrap(), Some(now));
    }

    #[tokio::test]
    async fn test_store_clear() {
        let store = MemoryStore::new();
        store.create(&merged("A", "X", "", None)).await.unwrap();
        assert_eq!(store.country_count().await, 1);

        store.clear().await;

        assert_eq!(store.country_count().await, 0);
        let again = store.create(&merged("A", "X", "", None)).await.unwrap();
        assert_eq!(again.id, 1);
    }
}
