//! Refresher: runs one refresh invocation end to end.
//!
//! # Flow
//!
//! ```text
//! fetch countries ┐
//!                 ├→ merge → reconcile → notify downstream (best-effort)
//! fetch rates ────┘
//! ```
//!
//! A fetch failure aborts before the store is touched. A renderer failure
//! is logged and reported in the outcome but never fails the refresh.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use orbis_domain::SummarySnapshot;
use orbis_engine::MergeEngine;
use orbis_store::{Store, StoreError};

use crate::error::{RenderError, SyncResult};
use crate::ports::{CountrySource, RateSource, SummaryRenderer};
use crate::reconcile::reconcile;

/// Number of countries listed in the summary artifact.
pub const SUMMARY_TOP_N: usize = 5;

// =============================================================================
// Phases and outcome
// =============================================================================

/// Stage a refresh invocation is in, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    FetchingCountries,
    FetchingRates,
    Merging,
    Reconciling,
    NotifyingDownstream,
}

impl fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshPhase::Idle => "idle",
            RefreshPhase::FetchingCountries => "fetching_countries",
            RefreshPhase::FetchingRates => "fetching_rates",
            RefreshPhase::Merging => "merging",
            RefreshPhase::Reconciling => "reconciling",
            RefreshPhase::NotifyingDownstream => "notifying_downstream",
        };
        f.write_str(name)
    }
}

/// What happened to the summary artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryStatus {
    Rendered { path: PathBuf },
    Failed { reason: String },
}

/// Result of a successful refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshOutcome {
    /// Merged records written to the store
    pub countries_applied: usize,
    pub created: usize,
    pub updated: usize,
    /// Timestamp shared by every record of this refresh
    pub refreshed_at: DateTime<Utc>,
    pub summary: SummaryStatus,
}

// =============================================================================
// Refresher
// =============================================================================

/// Orchestrates fetch, merge, reconcile and the summary artifact.
pub struct Refresher<S: Store + ?Sized> {
    countries: Arc<dyn CountrySource>,
    rates: Arc<dyn RateSource>,
    engine: MergeEngine,
    store: Arc<S>,
    renderer: Arc<dyn SummaryRenderer>,
}

impl<S: Store + ?Sized> Refresher<S> {
    /// Create a new refresher.
    pub fn new(
        countries: Arc<dyn CountrySource>,
        rates: Arc<dyn RateSource>,
        engine: MergeEngine,
        store: Arc<S>,
        renderer: Arc<dyn SummaryRenderer>,
    ) -> Self {
        Self {
            countries,
            rates,
            engine,
            store,
            renderer,
        }
    }

    /// Store this refresher writes to.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run one refresh stamped with the current time.
    pub async fn refresh(&self) -> SyncResult<RefreshOutcome> {
        self.refresh_at(Utc::now()).await
    }

    /// Run one refresh, stamping every record with `now`.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> SyncResult<RefreshOutcome> {
        info!(refreshed_at = %now, "Refresh started");

        debug!(
            phase = %RefreshPhase::FetchingCountries,
            next = %RefreshPhase::FetchingRates,
            "Fetching sources"
        );
        let (countries, rates) = tokio::try_join!(
            self.countries.fetch_countries(),
            self.rates.fetch_exchange_rates(),
        )
        .map_err(|e| {
            warn!(error = %e, "Refresh aborted before reconcile");
            e
        })?;

        debug!(phase = %RefreshPhase::Merging, countries = countries.len(), rates = rates.len());
        let (merged, stats) = self.engine.merge_with_stats(&countries, &rates, now);

        debug!(phase = %RefreshPhase::Reconciling, records = merged.len());
        let report = reconcile(self.store.as_ref(), &merged).await?;

        debug!(phase = %RefreshPhase::NotifyingDownstream);
        let summary = match self.notify_downstream(now).await {
            Ok(path) => SummaryStatus::Rendered { path },
            Err(e) => {
                warn!(error = %e, "Summary generation failed");
                SummaryStatus::Failed {
                    reason: e.to_string(),
                }
            },
        };

        info!(
            applied = report.applied(),
            created = report.created,
            updated = report.updated,
            without_rate = stats.without_rate,
            skipped = stats.skipped,
            phase = %RefreshPhase::Idle,
            "Refresh complete"
        );

        Ok(RefreshOutcome {
            countries_applied: report.applied(),
            created: report.created,
            updated: report.updated,
            refreshed_at: now,
            summary,
        })
    }

    /// Read the data the summary artifact is built from.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Result<SummarySnapshot, StoreError> {
        let repo = self.store.countries();
        Ok(SummarySnapshot {
            total_countries: repo.count().await?,
            top: repo.top_by_gdp(SUMMARY_TOP_N).await?,
            generated_at: now,
        })
    }

    async fn notify_downstream(&self, now: DateTime<Utc>) -> Result<PathBuf, RenderError> {
        let snapshot = self.snapshot(now).await?;
        self.renderer.render(&snapshot).await
    }
}
