use super::models::{EnrichedSong, ValidatedSong};
use crate::catalog_search::{CatalogSearch, CatalogTrack};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

const EMBED_URL_BASE: &str = "https://open.spotify.com/embed/track/";

/// Adds catalog metadata to validated songs. Lookup failures never fail a song.
#[derive(Clone)]
pub struct CatalogEnricher {
    catalog: Arc<dyn CatalogSearch>,
    concurrency: usize,
}

impl CatalogEnricher {
    pub fn new(catalog: Arc<dyn CatalogSearch>, concurrency: usize) -> Self {
        Self {
            catalog,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn enrich(&self, song: ValidatedSong) -> EnrichedSong {
        let query = search_query(&song);

        match self.catalog.search_tracks(&query, 1).await {
            Ok(tracks) => match tracks.into_iter().next() {
                Some(track) => merge_track(song, track),
                None => {
                    debug!("No catalog match for '{}'", query);
                    song.into()
                }
            },
            Err(e) => {
                warn!("Catalog lookup failed for '{}': {}", query, e);
                song.into()
            }
        }
    }

    /// Enrich every song with bounded concurrency. Output order matches input order.
    pub async fn enrich_all(&self, songs: Vec<ValidatedSong>) -> Vec<EnrichedSong> {
        stream::iter(songs)
            .map(|song| self.enrich(song))
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

pub fn search_query(song: &ValidatedSong) -> String {
    format!("{} artist:{}", song.title, song.artist)
}

/// Merge the top catalog match into a validated song.
///
/// Catalog title and artist names win over the model's when present. The
/// model's year and link are kept and only filled from the catalog when missing.
pub fn merge_track(song: ValidatedSong, track: CatalogTrack) -> EnrichedSong {
    let title = Some(track.name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or(song.title);
    let artist = track.artist_names().unwrap_or(song.artist);

    let release_date = track.release_date().map(str::to_string);
    let year = song.year.or_else(|| {
        release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string)
    });

    let embed_url = track
        .external_url
        .as_ref()
        .filter(|_| !track.id.is_empty())
        .map(|_| format!("{}{}", EMBED_URL_BASE, track.id));

    EnrichedSong {
        title,
        artist,
        reason: song.reason,
        year,
        genre: song.genre,
        link: song.link.or_else(|| track.external_url.clone()),
        album: track.album.as_ref().map(|album| album.name.clone()),
        spotify_id: Some(track.id.clone()).filter(|id| !id.is_empty()),
        spotify_uri: Some(track.uri.clone()).filter(|uri| !uri.is_empty()),
        spotify_url: track.external_url.clone(),
        artist_spotify_url: track.artist_url(),
        album_art: track.largest_image().map(|image| image.url.clone()),
        embed_url,
        preview_url: track.preview_url.clone(),
        popularity: track.popularity.map(|p| p.min(100)),
        release_date,
    }
}
