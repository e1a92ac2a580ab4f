//! Catalog data model and the collaborator interface to the streaming
//! provider's API.
//!
//! The concrete HTTP client lives in the server crate; everything here is
//! transport-agnostic so the pipeline can be exercised against an in-memory
//! fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Catalog Service errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Connection, TLS or timeout failure before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status from the catalog API
    #[error("Catalog API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A catalog track.
///
/// Only `id` and `is_local` are interpreted by the pipeline; every other
/// field is carried through untouched for the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Catalog-unique identifier; absent for local-only tracks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// True for tracks not resolvable in the catalog (user uploads)
    #[serde(default)]
    pub is_local: bool,

    /// Passthrough fields (name, artists, album, ...)
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Track {
    /// Catalog id when present and non-empty.
    pub fn catalog_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// One entry of a playlist's item list; the wrapped track may be missing
/// for deleted or region-blocked tracks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub track: Option<Track>,
}

/// Track collection of a playlist payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistTracks {
    /// Item wrappers; the API is known to return nulls here
    #[serde(default)]
    pub items: Vec<Option<PlaylistItem>>,
}

/// Playlist owner as returned by the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistOwner {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Full playlist payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: Option<PlaylistOwner>,
    #[serde(default)]
    pub tracks: PlaylistTracks,
}

/// A playlist surfaced by search or category listing, reduced to the
/// fields source resolution needs. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistCandidate {
    pub id: String,
    pub name: String,
    /// Owner display name or identifier
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks_total: Option<u32>,
}

/// The authenticated user's profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Two-letter market code when the account exposes one
    #[serde(default)]
    pub country: Option<String>,
    /// Passthrough fields (product, images, external_urls, ...)
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// One listening-history entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayedItem {
    #[serde(default)]
    pub track: Option<Track>,
}

/// Operations the pipeline needs from the streaming provider's API.
///
/// All operations are fallible with [`CatalogError`]; callers decide per
/// call site whether a failure is fatal or absorbed.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Profile of the user the access credential belongs to
    async fn current_user(&self) -> Result<UserProfile, CatalogError>;

    /// Playlist by id, with an optional market/region hint
    async fn playlist(
        &self,
        id: &str,
        market: Option<&str>,
    ) -> Result<PlaylistPayload, CatalogError>;

    /// Playlist search; result lists may be shorter than `limit`
    async fn search_playlists(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<PlaylistCandidate>, CatalogError>;

    /// Playlists of a browse category for a market
    async fn category_playlists(
        &self,
        category: &str,
        country: &str,
        limit: u32,
    ) -> Result<Vec<PlaylistCandidate>, CatalogError>;

    /// Track details by id; the catalog accepts at most 50 ids per call
    async fn tracks(&self, ids: &[String]) -> Result<Vec<Track>, CatalogError>;

    /// Most recently played tracks for the user
    async fn recently_played(&self, limit: u32) -> Result<Vec<PlayedItem>, CatalogError>;
}
