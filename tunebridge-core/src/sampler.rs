//! Output-size bounding via random sampling

use rand::seq::index;
use tracing::warn;

use crate::catalog::Track;

/// Number of tracks the recommendation endpoint returns.
pub const SAMPLE_SIZE: usize = 10;

/// Bound `tracks` to at most `n` elements.
///
/// Lists at or under the limit pass through unchanged, order preserved.
/// Larger lists are reduced by uniform sampling without replacement; when
/// the random branch cannot produce a sample, the deterministic prefix is
/// used instead. The two branches are separate functions so the fallback
/// path is testable on its own.
pub fn sample_tracks(tracks: Vec<Track>, n: usize) -> Vec<Track> {
    if tracks.len() <= n {
        return tracks;
    }

    match random_sample(&tracks, n) {
        Some(sampled) => sampled,
        None => {
            warn!(n, len = tracks.len(), "random sampling unavailable, truncating");
            truncate_prefix(tracks, n)
        }
    }
}

/// Uniform random sample of `n` distinct elements.
fn random_sample(tracks: &[Track], n: usize) -> Option<Vec<Track>> {
    if n > tracks.len() {
        return None;
    }
    let mut rng = rand::thread_rng();
    let picked = index::sample(&mut rng, tracks.len(), n);
    Some(picked.into_iter().map(|i| tracks[i].clone()).collect())
}

/// Deterministic fallback: the first `n` elements.
fn truncate_prefix(mut tracks: Vec<Track>, n: usize) -> Vec<Track> {
    tracks.truncate(n);
    tracks
}
