//! Read-side facade over the country store.

use std::sync::Arc;

use tracing::info;

use orbis_domain::{Country, CountryQuery, StatusReport};
use orbis_store::Store;

use crate::error::{SyncError, SyncResult};

/// List, get, delete and status over a store.
pub struct CountryService<S: Store + ?Sized> {
    store: Arc<S>,
}

impl<S: Store + ?Sized> CountryService<S> {
    /// Create a service over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Countries passing `query`, in its sort order.
    pub async fn list(&self, query: &CountryQuery) -> SyncResult<Vec<Country>> {
        Ok(self.store.countries().list(query).await?)
    }

    /// Country named `name`, ignoring case.
    pub async fn get(&self, name: &str) -> SyncResult<Country> {
        self.store
            .countries()
            .find_by_name(name)
            .await?
            .ok_or_else(|| SyncError::NotFound(name.to_string()))
    }

    /// Delete the country named `name`, ignoring case.
    pub async fn delete(&self, name: &str) -> SyncResult<()> {
        let deleted = self.store.countries().delete_by_name(name).await?;
        if deleted == 0 {
            return Err(SyncError::NotFound(name.to_string()));
        }
        info!(name, deleted, "Country deleted");
        Ok(())
    }

    /// Total count and most recent refresh time.
    pub async fn status(&self) -> SyncResult<StatusReport> {
        let repo = self.store.countries();
        Ok(StatusReport {
            total_countries: repo.count().await?,
            last_refreshed_at: repo.latest_refresh().await?,
        })
    }
}

impl<S: Store + ?Sized> Clone for CountryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orbis_domain::{CountrySort, MergedCountry};
    use orbis_store::{CountryRepository, MemoryStore};

    fn merged(name: &str, region: &str, code: &str, gdp: Option<f64>) -> MergedCountry {
        MergedCountry {
            name: name.to_string(),
            capital: String::new(),
            region: region.to_string(),
            population: 100,
            currency_code: code.to_string(),
            exchange_rate: gdp.map(|_| 1.0),
            estimated_gdp: gdp,
            flag_url: String::new(),
            last_refreshed_at: Utc::now(),
        }
    }

    async fn seeded() -> (Arc<MemoryStore>, CountryService<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.create(&merged("Nigeria", "Africa", "NGN", Some(5.0))).await.unwrap();
        store.create(&merged("Ghana", "Africa", "GHS", Some(9.0))).await.unwrap();
        store.create(&merged("Norway", "Europe", "NOK", None)).await.unwrap();
        let service = CountryService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn test_status_on_empty_store() {
        let service = CountryService::new(Arc::new(MemoryStore::new()));
        let status = service.status().await.unwrap();
        assert_eq!(status.total_countries, 0);
        assert!(status.last_refreshed_at.is_none());
    }

    #[tokio::test]
    async fn test_get_is_case_insensitive() {
        let (_, service) = seeded().await;
        assert_eq!(service.get("nIgErIa").await.unwrap().name, "Nigeria");
        assert!(matches!(service.get("Atlantis").await, Err(SyncError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_with_filter_and_sort() {
        let (_, service) = seeded().await;
        let query = CountryQuery {
            region: Some("Africa".into()),
            sort: Some(CountrySort::GdpDesc),
            ..Default::default()
        };

        let names: Vec<_> =
            service.list(&query).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Ghana", "Nigeria"]);
    }

    #[tokio::test]
    async fn test_delete_missing_leaves_count() {
        let (store, service) = seeded().await;

        assert!(matches!(service.delete("Atlantis").await, Err(SyncError::NotFound(_))));
        assert_eq!(store.country_count().await, 3);

        service.delete("NORWAY").await.unwrap();
        assert_eq!(service.status().await.unwrap().total_countries, 2);
    }
}
