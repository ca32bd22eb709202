//! Orbis Refresh Pipeline
//!
//! Fetch → merge → reconcile, plus the read-side facade.
//!
//! # Architecture
//!
//! ```text
//! CountrySource ─┐
//!                ├→ MergeEngine → reconcile(Store) → SummaryRenderer (best-effort)
//! RateSource ────┘
//! ```
//!
//! # Components
//!
//! - **Ports**: Traits for the two upstream sources and the summary renderer
//! - **Adapters**: Port implementations over the HTTP connectors
//! - **Reconcile**: Case-insensitive upsert, record by record, not transactional
//! - **Refresher**: Runs one refresh invocation end to end
//! - **CountryService**: list/get/delete/status over the store
//! - **Stub**: Test implementations of every port, plus a fault-injecting store
//!
//! # Example
//!
//! ```rust,ignore
//! use orbis_sync::{Refresher, StubCountrySource, StubRateSource, RecordingRenderer};
//! use orbis_engine::MergeEngine;
//! use orbis_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let refresher = Refresher::new(
//!     Arc::new(StubCountrySource::new(vec![])),
//!     Arc::new(StubRateSource::default()),
//!     MergeEngine::random(),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(RecordingRenderer::new()),
//! );
//! let outcome = refresher.refresh().await?;
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod error;
pub mod ports;
pub mod query;
pub mod reconcile;
pub mod refresh;
pub mod stub;

// Re-exports for convenience
pub use error::{RenderError, SourceKind, SyncError, SyncResult};
pub use ports::{CountrySource, RateSource, SummaryRenderer};
pub use query::CountryService;
pub use reconcile::{reconcile, ReconcileReport};
pub use refresh::{RefreshOutcome, RefreshPhase, Refresher, SummaryStatus, SUMMARY_TOP_N};
pub use stub::{FaultyStore, RecordingRenderer, StubCountrySource, StubFailure, StubRateSource};
