//! Stub implementations for testing.
//!
//! These implementations simulate the upstream sources, the summary renderer
//! and a misbehaving store without any network or disk I/O.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use orbis_domain::{
    Country, CountryId, CountryQuery, ExchangeRates, MergedCountry, RawCountry, SummarySnapshot,
};
use orbis_store::{CountryRepository, MemoryStore, Store, StoreError};

use crate::error::{RenderError, SourceKind, SyncError};
use crate::ports::{CountrySource, RateSource, SummaryRenderer};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Failure a stub source can simulate on its next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubFailure {
    /// Transport failure
    Unavailable,
    /// Malformed payload
    Decode,
}

impl StubFailure {
    fn into_error(self, source_kind: SourceKind) -> SyncError {
        match self {
            StubFailure::Unavailable => SyncError::SourceUnavailable {
                source_kind,
                message: "Simulated connection failure".to_string(),
            },
            StubFailure::Decode => SyncError::DecodeFailed {
                source_kind,
                message: "Simulated malformed payload".to_string(),
            },
        }
    }
}

// =============================================================================
// Stub Country Source
// =============================================================================

/// Stub country source returning a configurable list.
pub struct StubCountrySource {
    countries: Mutex<Vec<RawCountry>>,
    fail_next: Mutex<Option<StubFailure>>,
    calls: AtomicUsize,
}

impl StubCountrySource {
    /// Create a source returning `countries`.
    pub fn new(countries: Vec<RawCountry>) -> Self {
        Self {
            countries: Mutex::new(countries),
            fail_next: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replace the returned list.
    pub fn set_countries(&self, countries: Vec<RawCountry>) {
        *lock(&self.countries) = countries;
    }

    /// Make the next call fail.
    pub fn fail_next(&self, failure: StubFailure) {
        *lock(&self.fail_next) = Some(failure);
    }

    /// Number of fetches so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CountrySource for StubCountrySource {
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = lock(&self.fail_next).take() {
            return Err(failure.into_error(SourceKind::Countries));
        }
        Ok(lock(&self.countries).clone())
    }
}

// =============================================================================
// Stub Rate Source
// =============================================================================

/// Stub rate source returning a configurable table.
#[derive(Default)]
pub struct StubRateSource {
    rates: Mutex<ExchangeRates>,
    fail_next: Mutex<Option<StubFailure>>,
    calls: AtomicUsize,
}

impl StubRateSource {
    /// Create a source returning `rates`.
    pub fn new(rates: ExchangeRates) -> Self {
        Self {
            rates: Mutex::new(rates),
            fail_next: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replace the returned table.
    pub fn set_rates(&self, rates: ExchangeRates) {
        *lock(&self.rates) = rates;
    }

    /// Make the next call fail.
    pub fn fail_next(&self, failure: StubFailure) {
        *lock(&self.fail_next) = Some(failure);
    }

    /// Number of fetches so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for StubRateSource {
    async fn fetch_exchange_rates(&self) -> Result<ExchangeRates, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = lock(&self.fail_next).take() {
            return Err(failure.into_error(SourceKind::ExchangeRates));
        }
        Ok(lock(&self.rates).clone())
    }
}

// =============================================================================
// Recording Renderer
// =============================================================================

/// Renderer that keeps the snapshots it was given.
#[derive(Default)]
pub struct RecordingRenderer {
    snapshots: Mutex<Vec<SummarySnapshot>>,
    fail: AtomicBool,
}

impl RecordingRenderer {
    /// Create a renderer that succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every render fail (or succeed again).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Most recent snapshot, if any.
    pub fn last(&self) -> Option<SummarySnapshot> {
        lock(&self.snapshots).last().cloned()
    }

    /// Number of render calls that succeeded.
    pub fn renders(&self) -> usize {
        lock(&self.snapshots).len()
    }
}

#[async_trait]
impl SummaryRenderer for RecordingRenderer {
    async fn render(&self, snapshot: &SummarySnapshot) -> Result<PathBuf, RenderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RenderError::Render("Simulated render failure".to_string()));
        }
        lock(&self.snapshots).push(snapshot.clone());
        Ok(PathBuf::from("memory://summary"))
    }
}

// =============================================================================
// Faulty Store
// =============================================================================

/// Memory store that starts failing after a number of lookups.
///
/// The lookup budget counts `find_by_name` calls; once exhausted every
/// further lookup returns `StoreError::Connection`. Stale lookups report
/// no match even when the row exists, as a reader racing another writer
/// would see.
pub struct FaultyStore {
    inner: MemoryStore,
    lookups_left: Mutex<Option<usize>>,
    stale_lookups: Mutex<usize>,
    fail_reads: AtomicBool,
}

impl FaultyStore {
    /// Store that never fails until configured.
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            lookups_left: Mutex::new(None),
            stale_lookups: Mutex::new(0),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Allow `n` more successful lookups, then fail.
    pub fn fail_lookups_after(&self, n: usize) {
        *lock(&self.lookups_left) = Some(n);
    }

    /// Make the next `n` lookups miss.
    pub fn miss_next_lookups(&self, n: usize) {
        *lock(&self.stale_lookups) = n;
    }

    /// Make `count`, `list`, `top_by_gdp` and `latest_refresh` fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Stop failing.
    pub fn heal(&self) {
        *lock(&self.lookups_left) = None;
        *lock(&self.stale_lookups) = 0;
        self.fail_reads.store(false, Ordering::SeqCst);
    }

    /// Underlying memory store.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check_lookup(&self) -> Result<(), StoreError> {
        let mut left = lock(&self.lookups_left);
        match left.as_mut() {
            Some(0) => Err(StoreError::Connection("Simulated storage outage".to_string())),
            Some(n) => {
                *n -= 1;
                Ok(())
            },
            None => Ok(()),
        }
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("Simulated read failure".to_string()));
        }
        Ok(())
    }
}

impl Default for FaultyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CountryRepository for FaultyStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Country>, StoreError> {
        self.check_lookup()?;
        {
            let mut stale = lock(&self.stale_lookups);
            if *stale > 0 {
                *stale -= 1;
                return Ok(None);
            }
        }
        self.inner.find_by_name(name).await
    }

    async fn create(&self, country: &MergedCountry) -> Result<Country, StoreError> {
        self.inner.create(country).await
    }

    async fn update(&self, id: CountryId, country: &MergedCountry) -> Result<Country, StoreError> {
        self.inner.update(id, country).await
    }

    async fn delete_by_name(&self, name: &str) -> Result<u64, StoreError> {
        self.inner.delete_by_name(name).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.check_read()?;
        self.inner.count().await
    }

    async fn list(&self, query: &CountryQuery) -> Result<Vec<Country>, StoreError> {
        self.check_read()?;
        self.inner.list(query).await
    }

    async fn top_by_gdp(&self, limit: usize) -> Result<Vec<Country>, StoreError> {
        self.check_read()?;
        self.inner.top_by_gdp(limit).await
    }

    async fn latest_refresh(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.check_read()?;
        self.inner.latest_refresh().await
    }
}

impl Store for FaultyStore {
    fn countries(&self) -> &dyn CountryRepository {
        self
    }
}
