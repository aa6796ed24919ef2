//! Null catalog search implementation.
//!
//! Used when no catalog backend is configured: every lookup finds nothing,
//! so recommendations are returned with their model-provided fields only.

use super::models::CatalogTrack;
use super::trait_def::{CatalogSearch, CatalogSearchError};
use async_trait::async_trait;

pub struct NullCatalogSearch;

#[async_trait]
impl CatalogSearch for NullCatalogSearch {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn search_tracks(
        &self,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogSearchError> {
        Ok(Vec::new())
    }
}
