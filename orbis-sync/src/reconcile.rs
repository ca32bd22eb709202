//! Reconciliation: upsert merged records by case-insensitive name.
//!
//! Records are applied one at a time in input order. There is no batch
//! transaction: when a store call fails, records applied before it stay
//! persisted and the error reports how many that was.

use tracing::{debug, info, warn};

use orbis_domain::MergedCountry;
use orbis_store::{Store, StoreError};

use crate::error::SyncError;

/// Counters from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Records inserted under a new id
    pub created: usize,
    /// Records that overwrote an existing country in place
    pub updated: usize,
}

impl ReconcileReport {
    /// Total records written.
    pub fn applied(&self) -> usize {
        self.created + self.updated
    }
}

/// Upsert every merged record into `store`.
///
/// A record whose name matches an existing country (ignoring case) updates
/// that country and keeps its id; otherwise a new country is created. A
/// `Duplicate` from `create` means another writer inserted the name after
/// our lookup, so the record is looked up again and applied as an update.
pub async fn reconcile<S: Store + ?Sized>(
    store: &S,
    merged: &[MergedCountry],
) -> Result<ReconcileReport, SyncError> {
    let repo = store.countries();
    let mut report = ReconcileReport::default();

    for record in merged {
        let fail = |source: StoreError, report: &ReconcileReport| {
            warn!(
                name = %record.name,
                applied = report.applied(),
                error = %source,
                "Reconcile aborted"
            );
            SyncError::StoreFailure {
                applied: report.applied(),
                source,
            }
        };

        let existing = match repo.find_by_name(&record.name).await {
            Ok(existing) => existing,
            Err(e) => return Err(fail(e, &report)),
        };

        match existing {
            Some(country) => {
                if let Err(e) = repo.update(country.id, record).await {
                    return Err(fail(e, &report));
                }
                report.updated += 1;
            },
            None => match repo.create(record).await {
                Ok(created) => {
                    debug!(id = created.id, name = %created.name, "Country created");
                    report.created += 1;
                },
                Err(StoreError::Duplicate { .. }) => {
                    debug!(name = %record.name, "Concurrent insert detected, updating instead");
                    let country = match repo.find_by_name(&record.name).await {
                        Ok(Some(country)) => country,
                        Ok(None) => {
                            return Err(fail(
                                StoreError::not_found("country", record.name.clone()),
                                &report,
                            ))
                        },
                        Err(e) => return Err(fail(e, &report)),
                    };
                    if let Err(e) = repo.update(country.id, record).await {
                        return Err(fail(e, &report));
                    }
                    report.updated += 1;
                },
                Err(e) => return Err(fail(e, &report)),
            },
        }
    }

    info!(created = report.created, updated = report.updated, "Reconcile complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::FaultyStore;
    use chrono::{DateTime, Duration, Utc};
    use orbis_store::{CountryRepository, MemoryStore};

    fn merged(name: &str, population: u64, at: DateTime<Utc>) -> MergedCountry {
        MergedCountry {
            name: name.to_string(),
            capital: format!("{} City", name),
            region: "Testregion".to_string(),
            population,
            currency_code: "TST".to_string(),
            exchange_rate: Some(2.0),
            estimated_gdp: Some(population as f64 * 750.0),
            flag_url: format!("https://flags.example/{}.svg", name.to_lowercase()),
            last_refreshed_at: at,
        }
    }

    #[tokio::test]
    async fn test_reconcile_creates_new_countries() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let report = reconcile(&store, &[merged("Alpha", 10, now), merged("Beta", 20, now)])
            .await
            .unwrap();

        assert_eq!(
            report,
            ReconcileReport {
                created: 2,
                updated: 0
            }
        );
        assert_eq!(store.country_count().await, 2);
    }

    #[tokio::test]
    async fn test_reconcile_updates_case_insensitively_and_keeps_id() {
        let store = MemoryStore::new();
        let first = Utc::now();
        reconcile(&store, &[merged("Alpha", 10, first)]).await.unwrap();
        let original = store.find_by_name("Alpha").await.unwrap().unwrap();

        let second = first + Duration::minutes(5);
        let report = reconcile(&store, &[merged("ALPHA", 99, second)]).await.unwrap();

        assert_eq!(
            report,
            ReconcileReport {
                created: 0,
                updated: 1
            }
        );
        let stored = store.all().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, original.id);
        assert_eq!(stored[0].name, "Alpha");
        assert_eq!(stored[0].population, 99);
        assert_eq!(stored[0].last_refreshed_at, second);
    }

    #[tokio::test]
    async fn test_reconcile_same_name_twice_in_batch() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let report = reconcile(&store, &[merged("Alpha", 1, now), merged("alpha", 2, now)])
            .await
            .unwrap();

        assert_eq!(
            report,
            ReconcileReport {
                created: 1,
                updated: 1
            }
        );
        let stored = store.all().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].population, 2);
    }

    #[tokio::test]
    async fn test_reconcile_store_failure_keeps_prefix() {
        let store = FaultyStore::new();
        store.fail_lookups_after(2);
        let now = Utc::now();

        let batch = [merged("A", 1, now), merged("B", 2, now), merged("C", 3, now)];
        let err = reconcile(&store, &batch).await.unwrap_err();

        match err {
            SyncError::StoreFailure { applied, source } => {
                assert_eq!(applied, 2);
                assert!(matches!(source, StoreError::Connection(_)));
            },
            other => panic!("expected StoreFailure, got {:?}", other),
        }

        let names: Vec<_> = store.inner().all().await.into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_reconcile_concurrent_insert_falls_back_to_update() {
        let store = FaultyStore::new();
        let first = Utc::now();
        reconcile(&store, &[merged("Alpha", 10, first)]).await.unwrap();
        let original = store.inner().find_by_name("Alpha").await.unwrap().unwrap();

        // The lookup misses, so create hits the existing row and reports Duplicate
        store.miss_next_lookups(1);
        let second = first + Duration::minutes(1);
        let report = reconcile(&store, &[merged("alpha", 42, second)]).await.unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.created, 0);
        let stored = store.inner().all().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, original.id);
        assert_eq!(stored[0].population, 42);
        assert_eq!(stored[0].last_refreshed_at, second);
    }

    #[tokio::test]
    async fn test_reconcile_duplicate_without_row_is_store_failure() {
        let store = FaultyStore::new();
        let now = Utc::now();
        reconcile(&store, &[merged("Alpha", 10, now)]).await.unwrap();

        store.miss_next_lookups(2);
        let err = reconcile(&store, &[merged("Alpha", 11, now)]).await.unwrap_err();

        match err {
            SyncError::StoreFailure { applied, source } => {
                assert_eq!(applied, 0);
                assert!(matches!(source, StoreError::NotFound { .. }));
            },
            other => panic!("expected StoreFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reconcile_empty_batch_is_noop() {
        let store = MemoryStore::new();
        let report = reconcile(&store, &[]).await.unwrap();
        assert_eq!(report.applied(), 0);
        assert_eq!(store.country_count().await, 0);
    }
}
