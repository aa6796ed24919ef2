//! Spotify Web API catalog search.
//!
//! Uses the client-credentials flow: an app token is fetched from the accounts
//! service, cached, and refreshed shortly before it expires.

use super::models::{CatalogAlbum, CatalogArtist, CatalogImage, CatalogTrack};
use super::trait_def::{CatalogSearch, CatalogSearchError};
use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
/// Refresh the token this long before Spotify says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct AccessToken {
    value: String,
    expires_at: Instant,
}

pub struct SpotifyCatalogSearch {
    client: Client,
    client_id: String,
    client_secret: String,
    market: Option<String>,
    token: Mutex<Option<AccessToken>>,
}

impl SpotifyCatalogSearch {
    pub fn new(
        client_id: String,
        client_secret: String,
        market: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            client_id,
            client_secret,
            market,
            token: Mutex::new(None),
        })
    }

    fn basic_auth_header(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        )
    }

    /// Return a valid app token, fetching a new one if the cached one is stale.
    async fn access_token(&self) -> Result<String, CatalogSearchError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting Spotify access token");
        let response = self
            .client
            .post(SPOTIFY_ACCOUNTS_URL)
            .header("Authorization", self.basic_auth_header())
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogSearchError::Auth(format!(
                "token request failed with status {}: {}",
                status, body
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogSearchError::InvalidResponse(e.to_string()))?;

        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(AccessToken {
            value: body.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(body.access_token)
    }

    fn search_url(&self, query: &str, limit: usize) -> String {
        let mut url = format!(
            "{}/search?q={}&type=track&limit={}",
            SPOTIFY_API_BASE,
            urlencoding::encode(query),
            limit
        );
        if let Some(market) = &self.market {
            url.push_str("&market=");
            url.push_str(&urlencoding::encode(market));
        }
        url
    }
}

#[async_trait]
impl CatalogSearch for SpotifyCatalogSearch {
    fn name(&self) -> &'static str {
        "spotify"
    }

    async fn search_tracks(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogSearchError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(self.search_url(query, limit))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 {
            // Token revoked early; drop it so the next call fetches a fresh one.
            *self.token.lock().await = None;
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogSearchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogSearchError::InvalidResponse(e.to_string()))?;

        let tracks = body
            .tracks
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(CatalogTrack::from)
            .collect();

        Ok(tracks)
    }
}

// Spotify API types

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<Option<SpotifyTrack>>,
}

#[derive(Deserialize, Default)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Deserialize)]
struct SpotifyTrack {
    id: String,
    uri: String,
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
    album: Option<SpotifyAlbum>,
    #[serde(default)]
    external_urls: ExternalUrls,
    preview_url: Option<String>,
    popularity: Option<u8>,
}

#[derive(Deserialize)]
struct SpotifyArtist {
    name: String,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Deserialize)]
struct SpotifyAlbum {
    name: String,
    #[serde(default)]
    images: Vec<SpotifyImage>,
    release_date: Option<String>,
}

#[derive(Deserialize)]
struct SpotifyImage {
    url: String,
    width: Option<u32>,
    height: Option<u32>,
}

impl From<SpotifyTrack> for CatalogTrack {
    fn from(track: SpotifyTrack) -> Self {
        CatalogTrack {
            id: track.id,
            uri: track.uri,
            name: track.name,
            artists: track
                .artists
                .into_iter()
                .map(|a| CatalogArtist {
                    name: a.name,
                    external_url: a.external_urls.spotify,
                })
                .collect(),
            album: track.album.map(|album| CatalogAlbum {
                name: album.name,
                images: album
                    .images
                    .into_iter()
                    .map(|img| CatalogImage {
                        url: img.url,
                        width: img.width,
                        height: img.height,
                    })
                    .collect(),
                release_date: album.release_date,
            }),
            external_url: track.external_urls.spotify,
            preview_url: track.preview_url,
            popularity: track.popularity,
        }
    }
}
