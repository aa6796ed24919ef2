use serde::{Deserialize, Serialize};

/// A track match returned by a catalog search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub artists: Vec<CatalogArtist>,
    pub album: Option<CatalogAlbum>,
    pub external_url: Option<String>,
    pub preview_url: Option<String>,
    /// 0-100.
    pub popularity: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogArtist {
    pub name: String,
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogAlbum {
    pub name: String,
    /// Sorted largest first when the backend provides sizes.
    pub images: Vec<CatalogImage>,
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD` depending on precision.
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogImage {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl CatalogImage {
    fn area(&self) -> Option<u64> {
        Some(self.width? as u64 * self.height? as u64)
    }
}

impl CatalogTrack {
    /// Artist names joined for display.
    pub fn artist_names(&self) -> Option<String> {
        let names: Vec<&str> = self
            .artists
            .iter()
            .map(|a| a.name.trim())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    }

    /// First artist link available.
    pub fn artist_url(&self) -> Option<String> {
        self.artists.iter().find_map(|a| a.external_url.clone())
    }

    /// The largest album image; falls back to the first one when sizes are unknown.
    pub fn largest_image(&self) -> Option<&CatalogImage> {
        let images = &self.album.as_ref()?.images;
        images
            .iter()
            .filter(|img| img.area().is_some())
            .max_by_key(|img| img.area())
            .or_else(|| images.first())
    }

    pub fn release_date(&self) -> Option<&str> {
        self.album.as_ref()?.release_date.as_deref()
    }
}
