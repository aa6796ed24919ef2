//! Music catalog search used to enrich recommended songs with metadata.

mod models;
mod null_search;
mod spotify;
mod trait_def;

pub use models::{CatalogAlbum, CatalogArtist, CatalogImage, CatalogTrack};
pub use null_search::NullCatalogSearch;
pub use spotify::SpotifyCatalogSearch;
pub use trait_def::{CatalogSearch, CatalogSearchError};

#[cfg(any(test, feature = "mock"))]
pub use trait_def::MockCatalogSearch;

use crate::config::CatalogSettings;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Build the configured catalog search backend.
pub fn create_catalog_search(settings: &CatalogSettings) -> Result<Arc<dyn CatalogSearch>> {
    match settings {
        CatalogSettings::None => Ok(Arc::new(NullCatalogSearch)),
        CatalogSettings::Spotify {
            client_id,
            client_secret,
            market,
            timeout_secs,
        } => {
            let client = SpotifyCatalogSearch::new(
                client_id.clone(),
                client_secret.clone(),
                market.clone(),
                *timeout_secs,
            )
            .context("Failed to create Spotify catalog client")?;
            Ok(Arc::new(client))
        }
    }
}
