//! Recommendation orchestration
//!
//! Composes the source resolver, the sampler and the recency log into the
//! two operations the endpoints need: producing a bounded recommendation
//! set, and annotating logged snapshots with resolved track details.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::catalog::{CatalogApi, Track};
use crate::recent::RecentLog;
use crate::resolver::{ResolverConfig, SourceResolver};
use crate::sampler::{sample_tracks, SAMPLE_SIZE};

/// Per-call lookup limit of the catalog's batched track endpoint.
pub const TRACK_LOOKUP_BATCH: usize = 50;

/// Produce a bounded recommendation set and record it in the session's
/// recency log.
///
/// Resolution failures have already been absorbed below this level, so the
/// only possible degraded outcome is an empty list, which is a safe state
/// for the frontend. The log write is best-effort bookkeeping and cannot
/// fail the call.
pub async fn recommend(
    catalog: &dyn CatalogApi,
    config: &ResolverConfig,
    log: &mut RecentLog,
    now: i64,
) -> Vec<Track> {
    let resolved = SourceResolver::new(catalog, config).resolve().await;
    let tracks = sample_tracks(resolved, SAMPLE_SIZE);

    let ids = tracks
        .iter()
        .filter_map(|track| track.catalog_id().map(str::to_owned));
    log.record(ids, now);

    tracks
}

/// A recency entry annotated with resolved track objects.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedEntry {
    pub ts: i64,
    pub track_ids: Vec<String>,
    /// Resolved details for every id the catalog still knows; ids it does
    /// not resolve stay in `track_ids` but are omitted here
    pub tracks: Vec<Track>,
}

/// Annotate the log's snapshots with track details fetched in batches of
/// [`TRACK_LOOKUP_BATCH`]. A failed batch leaves its ids unresolved rather
/// than failing the listing.
pub async fn recent_with_tracks(catalog: &dyn CatalogApi, log: &RecentLog) -> Vec<AnnotatedEntry> {
    let mut wanted: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for entry in log.entries() {
        for id in &entry.track_ids {
            if seen.insert(id.clone()) {
                wanted.push(id.clone());
            }
        }
    }

    let mut lookup: HashMap<String, Track> = HashMap::new();
    for chunk in wanted.chunks(TRACK_LOOKUP_BATCH) {
        match catalog.tracks(chunk).await {
            Ok(tracks) => {
                for track in tracks {
                    if let Some(id) = track.catalog_id().map(str::to_owned) {
                        lookup.insert(id, track);
                    }
                }
            }
            Err(err) => {
                debug!(batch = chunk.len(), %err, "track lookup batch failed, entries will be sparse");
            }
        }
    }

    log.entries()
        .iter()
        .map(|entry| AnnotatedEntry {
            ts: entry.ts,
            track_ids: entry.track_ids.clone(),
            tracks: entry
                .track_ids
                .iter()
                .filter_map(|id| lookup.get(id).cloned())
                .collect(),
        })
        .collect()
}
