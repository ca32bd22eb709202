//! Shared GET + decode helper for upstream sources.

use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Longest upstream error body kept in an error message
const MAX_ERROR_BODY: usize = 256;

/// Errors that can occur while fetching an upstream dataset.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Connection or transport failure
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// Upstream answered with a non-success status
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Body did not decode into the expected shape
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl SourceError {
    /// True when the upstream answered but the payload was malformed.
    pub fn is_decode(&self) -> bool {
        matches!(self, SourceError::ParseError(_))
    }
}

/// GET `url` and decode the JSON body as `T`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
) -> Result<T, SourceError> {
    debug!(%url, "Fetching upstream dataset");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::RequestFailed(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SourceError::RequestFailed(e.to_string()))?;

    if !status.is_success() {
        return Err(SourceError::HttpStatus {
            status: status.as_u16(),
            body: truncate(&body, MAX_ERROR_BODY),
        });
    }

    decode(&body)
}

/// Decode a JSON body.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::ParseError(e.to_string()))
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_decode_error_is_decode() {
        let err = decode::<Vec<u32>>("{not json").unwrap_err();
        assert!(err.is_decode());
        assert!(!SourceError::RequestFailed("refused".into()).is_decode());
    }
}
