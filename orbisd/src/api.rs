//! HTTP API for the Orbis daemon.
//!
//! Provides REST endpoints for:
//! - Refresh (fetch, merge, reconcile, regenerate summary)
//! - Country list, lookup and delete
//! - Summary image
//! - Status and health

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use orbis_domain::{Country, CountryQuery, CountrySort, StatusReport};
use orbis_store::Store;
use orbis_sync::{CountryService, Refresher, SourceKind, SummaryStatus, SyncError};

use crate::summary::SUMMARY_CONTENT_TYPE;

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState<S: Store + ?Sized + 'static> {
    pub refresher: Arc<Refresher<S>>,
    pub countries: CountryService<S>,
    /// Where the summary renderer writes the image
    pub summary_path: PathBuf,
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Refresh response.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: String,
    pub countries_applied: usize,
    pub refreshed_at: DateTime<Utc>,
    pub summary: SummaryStatus,
}

/// Query string for the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<String>,
}

impl ListParams {
    /// Blank filters are dropped; unknown sort values fall back to id order.
    pub fn into_query(self) -> CountryQuery {
        let present = |value: Option<String>| value.filter(|v| !v.is_empty());
        CountryQuery {
            region: present(self.region),
            currency: present(self.currency),
            sort: self.sort.as_deref().and_then(|s| s.parse::<CountrySort>().ok()),
        }
    }
}

/// Plain message response.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.into());
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router<S>(state: Arc<ApiState<S>>) -> Router
where
    S: Store + ?Sized + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler::<S>))
        .route("/countries", get(list_handler::<S>))
        .route("/countries/refresh", post(refresh_handler::<S>))
        .route("/countries/image", get(image_handler::<S>))
        .route("/countries/:name", get(get_country_handler::<S>).delete(delete_handler::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Run one refresh.
async fn refresh_handler<S>(
    State(state): State<Arc<ApiState<S>>>,
) -> Result<Json<RefreshResponse>, ApiError>
where
    S: Store + ?Sized + 'static,
{
    let outcome = state.refresher.refresh().await.map_err(to_error_response)?;

    Ok(Json(RefreshResponse {
        message: "Data refreshed successfully".to_string(),
        countries_applied: outcome.countries_applied,
        refreshed_at: outcome.refreshed_at,
        summary: outcome.summary,
    }))
}

/// List countries with optional filters and sort.
async fn list_handler<S>(
    State(state): State<Arc<ApiState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Country>>, ApiError>
where
    S: Store + ?Sized + 'static,
{
    let countries = state
        .countries
        .list(&params.into_query())
        .await
        .map_err(to_error_response)?;
    Ok(Json(countries))
}

/// Get a single country by name.
async fn get_country_handler<S>(
    State(state): State<Arc<ApiState<S>>>,
    Path(name): Path<String>,
) -> Result<Json<Country>, ApiError>
where
    S: Store + ?Sized + 'static,
{
    let country = state.countries.get(&name).await.map_err(to_error_response)?;
    Ok(Json(country))
}

/// Delete a country by name.
async fn delete_handler<S>(
    State(state): State<Arc<ApiState<S>>>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError>
where
    S: Store + ?Sized + 'static,
{
    state.countries.delete(&name).await.map_err(to_error_response)?;
    Ok(Json(MessageResponse {
        message: "Country deleted successfully".to_string(),
    }))
}

/// Store status.
async fn status_handler<S>(
    State(state): State<Arc<ApiState<S>>>,
) -> Result<Json<StatusReport>, ApiError>
where
    S: Store + ?Sized + 'static,
{
    let status = state.countries.status().await.map_err(to_error_response)?;
    Ok(Json(status))
}

/// Serve the most recent summary image.
async fn image_handler<S>(State(state): State<Arc<ApiState<S>>>) -> Result<Response, ApiError>
where
    S: Store + ?Sized + 'static,
{
    match tokio::fs::read(&state.summary_path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, SUMMARY_CONTENT_TYPE)], bytes).into_response()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Summary image not found")),
        )),
        Err(e) => {
            error!(
                error = %e,
                path = %state.summary_path.display(),
                "Failed to read summary image"
            );
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to read summary image")),
            ))
        },
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Map a pipeline error to its HTTP status and body.
pub fn to_error_response(error: SyncError) -> ApiError {
    let (status, body) = match &error {
        SyncError::SourceUnavailable { source_kind, .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorResponse::new("External data source unavailable")
                .with_detail("api", source_kind.api_name()),
        ),
        SyncError::DecodeFailed { source_kind, .. } => {
            let message = match source_kind {
                SourceKind::Countries => "Failed to parse countries data",
                SourceKind::ExchangeRates => "Failed to parse exchange rates data",
            };
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(message))
        },
        SyncError::StoreFailure { applied, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Database error").with_detail("applied", applied.to_string()),
        ),
        SyncError::Store(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new("Database error"))
        },
        SyncError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorResponse::new("Country not found")),
    };

    if status.is_server_error() {
        error!(error = %error, status = status.as_u16(), "Request failed");
    } else {
        warn!(error = %error, status = status.as_u16(), "Request rejected");
    }

    (status, Json(body))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_store::StoreError;

    #[test]
    fn test_source_unavailable_names_api() {
        let (status, Json(body)) = to_error_response(SyncError::SourceUnavailable {
            source_kind: SourceKind::ExchangeRates,
            message: "connection refused".into(),
        });

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error, "External data source unavailable");
        assert_eq!(body.details.unwrap()["api"], "Exchange Rates API");
    }

    #[test]
    fn test_decode_failure_is_internal() {
        let (status, Json(body)) = to_error_response(SyncError::DecodeFailed {
            source_kind: SourceKind::Countries,
            message: "expected array".into(),
        });

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Failed to parse countries data");
        assert!(body.details.is_none());
    }

    #[test]
    fn test_store_failure_reports_applied() {
        let (status, Json(body)) = to_error_response(SyncError::StoreFailure {
            applied: 3,
            source: StoreError::Connection("gone".into()),
        });

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Database error");
        assert_eq!(body.details.unwrap()["applied"], "3");
    }

    #[test]
    fn test_not_found() {
        let (status, Json(body)) = to_error_response(SyncError::NotFound("Atlantis".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Country not found");
    }

    #[test]
    fn test_list_params_into_query() {
        let query = ListParams {
            region: Some("Africa".into()),
            currency: Some(String::new()),
            sort: Some("gdp_desc".into()),
        }
        .into_query();
        assert_eq!(query.region.as_deref(), Some("Africa"));
        assert!(query.currency.is_none());
        assert_eq!(query.sort, Some(CountrySort::GdpDesc));

        let unknown = ListParams {
            sort: Some("name_asc".into()),
            ..Default::default()
        }
        .into_query();
        assert!(unknown.sort.is_none());
    }

    #[test]
    fn test_error_body_omits_empty_details() {
        let json = serde_json::to_value(ErrorResponse::new("Country not found")).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Country not found" }));
    }
}
