//! Exploratory playlist probing

use tracing::debug;

use crate::catalog::{CatalogApi, Track};
use crate::extract::extract_tracks;

/// Fetch a playlist and extract its usable tracks.
///
/// Probing is exploratory: most candidate playlists are expected to be
/// missing, region-locked or empty, so any catalog failure yields an empty
/// list instead of an error. The swallow happens here, and only here, so
/// the policy stays auditable at a single boundary.
pub async fn probe(catalog: &dyn CatalogApi, playlist_id: &str, market: Option<&str>) -> Vec<Track> {
    match catalog.playlist(playlist_id, market).await {
        Ok(payload) => extract_tracks(payload.tracks.items),
        Err(err) => {
            debug!(playlist_id, %err, "playlist probe failed, treating as empty");
            Vec::new()
        }
    }
}
