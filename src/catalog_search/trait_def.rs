//! CatalogSearch trait definition.

use super::models::CatalogTrack;
use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by catalog search backends.
#[derive(Debug, Error)]
pub enum CatalogSearchError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

impl From<reqwest::Error> for CatalogSearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogSearchError::Timeout
        } else {
            CatalogSearchError::Connection(e.to_string())
        }
    }
}

/// Free-text track search against an external music catalog.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Name of the backend, for logs and stats.
    fn name(&self) -> &'static str;

    /// Search tracks matching `query`, best match first, at most `limit` results.
    async fn search_tracks(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogSearchError>;
}
