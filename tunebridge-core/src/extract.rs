//! Track extraction from raw playlist payloads

use crate::catalog::{PlaylistItem, Track};

/// Filter a playlist item list down to usable catalog tracks.
///
/// Keeps a wrapped track when the wrapper and the track are both present,
/// the track has a non-empty id, and it is not a local file. Order is
/// preserved; malformed entries are skipped without error.
pub fn extract_tracks(items: Vec<Option<PlaylistItem>>) -> Vec<Track> {
    items
        .into_iter()
        .flatten()
        .filter_map(|item| item.track)
        .filter(|track| track.catalog_id().is_some() && !track.is_local)
        .collect()
}
