//! HTTP client for the streaming provider's catalog API
//!
//! Implements [`CatalogApi`] over reqwest. One instance is built per
//! request with the session's access token; the underlying reqwest client
//! (connection pool, timeout) is shared through the application state.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use tunebridge_core::catalog::{
    CatalogApi, CatalogError, PlayedItem, PlaylistCandidate, PlaylistOwner, PlaylistPayload, Track,
    UserProfile,
};

/// Catalog API client authenticated as one user.
pub struct HttpCatalog {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl HttpCatalog {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "catalog request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }
}

// Wire shapes private to this client; the pipeline only sees core types.

/// A search/category playlist entry. The API returns nulls and partial
/// records in these lists; anything without an id is unusable.
#[derive(Debug, Deserialize)]
struct WirePlaylist {
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    owner: Option<PlaylistOwner>,
    #[serde(default)]
    tracks: Option<WireTracksTotal>,
}

#[derive(Debug, Deserialize)]
struct WireTracksTotal {
    #[serde(default)]
    total: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct WirePlaylistPage {
    #[serde(default)]
    items: Vec<Option<WirePlaylist>>,
}

#[derive(Debug, Deserialize)]
struct WirePlaylistEnvelope {
    #[serde(default)]
    playlists: WirePlaylistPage,
}

#[derive(Debug, Deserialize)]
struct WireTracksEnvelope {
    #[serde(default)]
    tracks: Vec<Option<Track>>,
}

#[derive(Debug, Deserialize)]
struct WirePlayedEnvelope {
    #[serde(default)]
    items: Vec<PlayedItem>,
}

fn candidates(page: WirePlaylistPage) -> Vec<PlaylistCandidate> {
    page.items
        .into_iter()
        .flatten()
        .filter_map(|playlist| {
            let id = playlist.id.filter(|id| !id.is_empty())?;
            let owner = playlist
                .owner
                .and_then(|o| o.display_name.or(o.id))
                .unwrap_or_default();
            Some(PlaylistCandidate {
                id,
                name: playlist.name.unwrap_or_default(),
                owner,
                tracks_total: playlist.tracks.and_then(|t| t.total),
            })
        })
        .collect()
}

#[async_trait]
impl CatalogApi for HttpCatalog {
    async fn current_user(&self) -> Result<UserProfile, CatalogError> {
        self.get("/me", &[]).await
    }

    async fn playlist(
        &self,
        id: &str,
        market: Option<&str>,
    ) -> Result<PlaylistPayload, CatalogError> {
        let path = format!("/playlists/{id}");
        match market {
            Some(market) => self.get(&path, &[("market", market)]).await,
            None => self.get(&path, &[]).await,
        }
    }

    async fn search_playlists(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<PlaylistCandidate>, CatalogError> {
        let limit = limit.to_string();
        let envelope: WirePlaylistEnvelope = self
            .get(
                "/search",
                &[("q", query), ("type", "playlist"), ("limit", &limit)],
            )
            .await?;
        Ok(candidates(envelope.playlists))
    }

    async fn category_playlists(
        &self,
        category: &str,
        country: &str,
        limit: u32,
    ) -> Result<Vec<PlaylistCandidate>, CatalogError> {
        let limit = limit.to_string();
        let envelope: WirePlaylistEnvelope = self
            .get(
                &format!("/browse/categories/{category}/playlists"),
                &[("country", country), ("limit", &limit)],
            )
            .await?;
        Ok(candidates(envelope.playlists))
    }

    /// Track details lookup. Callers chunk id lists to the catalog's
    /// 50-id-per-call limit before getting here.
    async fn tracks(&self, ids: &[String]) -> Result<Vec<Track>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids.join(",");
        let envelope: WireTracksEnvelope = self.get("/tracks", &[("ids", &joined)]).await?;
        Ok(envelope.tracks.into_iter().flatten().collect())
    }

    async fn recently_played(&self, limit: u32) -> Result<Vec<PlayedItem>, CatalogError> {
        let limit = limit.to_string();
        let envelope: WirePlayedEnvelope = self
            .get("/me/player/recently-played", &[("limit", &limit)])
            .await?;
        Ok(envelope.items)
    }
}
