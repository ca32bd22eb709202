//! Refresh pipeline error types.

use std::fmt;

use orbis_connectors::SourceError;
use orbis_store::StoreError;
use thiserror::Error;

/// Which upstream a fetch error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Country metadata source
    Countries,
    /// Exchange-rate source
    ExchangeRates,
}

impl SourceKind {
    /// Human-readable name, as reported to API callers
    pub fn api_name(&self) -> &'static str {
        match self {
            SourceKind::Countries => "Countries API",
            SourceKind::ExchangeRates => "Exchange Rates API",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Errors that can occur in the refresh pipeline and the read facade.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Upstream could not be reached (transport failure or non-success status)
    #[error("External data source unavailable: {source_kind}: {message}")]
    SourceUnavailable {
        source_kind: SourceKind,
        message: String,
    },

    /// Upstream answered with a body of the wrong shape
    #[error("Failed to parse {source_kind} data: {message}")]
    DecodeFailed {
        source_kind: SourceKind,
        message: String,
    },

    /// Reconciliation aborted; the first `applied` records stay persisted
    #[error("Store failure after {applied} applied records: {source}")]
    StoreFailure {
        applied: usize,
        #[source]
        source: StoreError,
    },

    /// Requested country absent
    #[error("Country not found: {0}")]
    NotFound(String),

    /// Read-side store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Classify a connector error for `kind`.
    pub fn from_source(source_kind: SourceKind, err: SourceError) -> Self {
        if err.is_decode() {
            SyncError::DecodeFailed {
                source_kind,
                message: err.to_string(),
            }
        } else {
            SyncError::SourceUnavailable {
                source_kind,
                message: err.to_string(),
            }
        }
    }

    /// True for errors raised before the store was touched.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, SyncError::SourceUnavailable { .. } | SyncError::DecodeFailed { .. })
    }
}

/// Errors from rendering the summary artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Reading the snapshot from the store failed
    #[error("Failed to read summary data: {0}")]
    Snapshot(#[from] StoreError),

    /// Writing the artifact failed
    #[error("Failed to write summary: {0}")]
    Io(#[from] std::io::Error),

    /// Renderer-specific failure
    #[error("Failed to render summary: {0}")]
    Render(String),
}

/// Result type for pipeline operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_source_classifies_errors() {
        let decode = SyncError::from_source(
            SourceKind::Countries,
            SourceError::ParseError("expected array".into()),
        );
        assert!(matches!(
            decode,
            SyncError::DecodeFailed { source_kind: SourceKind::Countries, .. }
        ));

        let status = SyncError::from_source(
            SourceKind::ExchangeRates,
            SourceError::HttpStatus {
                status: 503,
                body: String::new(),
            },
        );
        assert!(matches!(status, SyncError::SourceUnavailable { .. }));
        assert!(status.is_fetch_failure());
        assert!(status.to_string().contains("Exchange Rates API"));
    }
}
