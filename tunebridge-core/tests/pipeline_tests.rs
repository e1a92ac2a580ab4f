//! Integration tests for source resolution and orchestration
//!
//! Runs the pipeline against an in-memory catalog fake so fallback order,
//! ranking and bookkeeping can be asserted without any network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use tunebridge_core::catalog::{
    CatalogApi, CatalogError, PlayedItem, PlaylistCandidate, PlaylistPayload, Track, UserProfile,
};
use tunebridge_core::pipeline;
use tunebridge_core::probe::probe;
use tunebridge_core::recent::RecentLog;
use tunebridge_core::resolver::{ResolverConfig, SourceResolver};

fn track(id: &str) -> Track {
    serde_json::from_value(json!({ "id": id })).unwrap()
}

fn payload(ids: &[&str]) -> PlaylistPayload {
    let items: Vec<_> = ids.iter().map(|id| json!({"track": {"id": id}})).collect();
    serde_json::from_value(json!({ "tracks": { "items": items } })).unwrap()
}

fn candidate(id: &str, name: &str, owner: &str) -> PlaylistCandidate {
    PlaylistCandidate {
        id: id.to_string(),
        name: name.to_string(),
        owner: owner.to_string(),
        tracks_total: None,
    }
}

fn config() -> ResolverConfig {
    ResolverConfig {
        default_playlist: "default-pl".to_string(),
        default_market: "JP".to_string(),
        official_curator: "Spotify".to_string(),
    }
}

/// In-memory catalog double. Lookups hit fixed maps; every call is
/// recorded so tests can assert ordering and short-circuiting.
#[derive(Default)]
struct FakeCatalog {
    profile: Option<UserProfile>,
    playlists: HashMap<String, PlaylistPayload>,
    search: HashMap<String, Vec<PlaylistCandidate>>,
    category: Vec<PlaylistCandidate>,
    track_details: Vec<Track>,

    probed: Mutex<Vec<String>>,
    category_calls: Mutex<u32>,
    category_country: Mutex<Option<String>>,
    track_batches: Mutex<Vec<usize>>,
}

impl FakeCatalog {
    fn with_playlist(mut self, id: &str, ids: &[&str]) -> Self {
        self.playlists.insert(id.to_string(), payload(ids));
        self
    }

    fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn current_user(&self) -> Result<UserProfile, CatalogError> {
        self.profile.clone().ok_or(CatalogError::Api {
            status: 500,
            message: "profile unavailable".to_string(),
        })
    }

    async fn playlist(
        &self,
        id: &str,
        _market: Option<&str>,
    ) -> Result<PlaylistPayload, CatalogError> {
        self.probed.lock().unwrap().push(id.to_string());
        self.playlists.get(id).cloned().ok_or(CatalogError::Api {
            status: 404,
            message: "playlist not found".to_string(),
        })
    }

    async fn search_playlists(
        &self,
        query: &str,
        _limit: u32,
    ) -> Result<Vec<PlaylistCandidate>, CatalogError> {
        Ok(self.search.get(query).cloned().unwrap_or_default())
    }

    async fn category_playlists(
        &self,
        _category: &str,
        country: &str,
        _limit: u32,
    ) -> Result<Vec<PlaylistCandidate>, CatalogError> {
        *self.category_calls.lock().unwrap() += 1;
        *self.category_country.lock().unwrap() = Some(country.to_string());
        Ok(self.category.clone())
    }

    async fn tracks(&self, ids: &[String]) -> Result<Vec<Track>, CatalogError> {
        self.track_batches.lock().unwrap().push(ids.len());
        Ok(self
            .track_details
            .iter()
            .filter(|t| t.catalog_id().map(|id| ids.contains(&id.to_string())) == Some(true))
            .cloned()
            .collect())
    }

    async fn recently_played(&self, _limit: u32) -> Result<Vec<PlayedItem>, CatalogError> {
        Ok(Vec::new())
    }
}

fn ids(tracks: &[Track]) -> Vec<String> {
    tracks
        .iter()
        .filter_map(|t| t.catalog_id().map(str::to_owned))
        .collect()
}

#[tokio::test]
async fn probe_swallows_catalog_failures() {
    let catalog = FakeCatalog::default();
    let tracks = probe(&catalog, "nope", None).await;
    assert!(tracks.is_empty());
}

#[tokio::test]
async fn default_playlist_short_circuits_everything_else() {
    let catalog = FakeCatalog::default().with_playlist("default-pl", &["a", "b"]);
    let cfg = config();

    let tracks = SourceResolver::new(&catalog, &cfg).resolve().await;

    assert_eq!(ids(&tracks), vec!["a", "b"]);
    assert_eq!(*catalog.category_calls.lock().unwrap(), 0);
    assert_eq!(catalog.probed(), vec!["default-pl"]);
}

#[tokio::test]
async fn search_success_skips_category_lookup() {
    let mut catalog = FakeCatalog::default().with_playlist("chart-pl", &["x", "y", "z"]);
    catalog.search.insert(
        "Top 50 - Global".to_string(),
        vec![candidate("chart-pl", "Top 50 - Global", "Spotify")],
    );
    catalog.category = vec![candidate("cat-pl", "Top Hits", "Spotify")];
    let cfg = config();

    let tracks = SourceResolver::new(&catalog, &cfg).resolve().await;

    assert_eq!(ids(&tracks), vec!["x", "y", "z"]);
    assert_eq!(
        *catalog.category_calls.lock().unwrap(),
        0,
        "category source must not be consulted after a search hit"
    );
}

#[tokio::test]
async fn curator_owned_candidates_are_probed_first() {
    let mut catalog = FakeCatalog::default()
        .with_playlist("fan-pl", &["f1"])
        .with_playlist("official-pl", &["o1"]);
    catalog.search.insert(
        "Top 50 - Global".to_string(),
        vec![
            candidate("fan-pl", "Top 50 - Global (fan copy)", "somebody"),
            candidate("official-pl", "Top 50 - Global", "Spotify"),
        ],
    );
    let cfg = config();

    let tracks = SourceResolver::new(&catalog, &cfg).resolve().await;

    assert_eq!(ids(&tracks), vec!["o1"]);
}

#[tokio::test]
async fn category_candidates_probed_in_score_order() {
    let mut catalog = FakeCatalog::default();
    catalog.category = vec![
        candidate("c-chill", "Chill Mix", "Spotify"),
        candidate("c-fan", "Top Hits Japan", "somebody"),
        candidate("c-official", "Top Hits", "Spotify"),
    ];
    let cfg = config();

    // Nothing yields tracks; the probe order is what we are after.
    SourceResolver::new(&catalog, &cfg).resolve().await;

    let probed = catalog.probed();
    // Default playlist twice (no market, then market), then category by
    // descending score: "Top Hits"/Spotify = 3, fan chart = 2, chill = 1.
    assert_eq!(
        probed,
        vec!["default-pl", "default-pl", "c-official", "c-fan", "c-chill"]
    );
}

#[tokio::test]
async fn market_comes_from_profile_country() {
    let mut catalog = FakeCatalog::default();
    catalog.profile = Some(UserProfile {
        country: Some("SE".to_string()),
        ..UserProfile::default()
    });
    catalog.category = vec![candidate("c1", "Top Hits", "Spotify")];
    let cfg = config();

    SourceResolver::new(&catalog, &cfg).resolve().await;

    assert_eq!(
        catalog.category_country.lock().unwrap().as_deref(),
        Some("SE")
    );
}

#[tokio::test]
async fn market_falls_back_to_configured_default() {
    let mut catalog = FakeCatalog::default();
    catalog.category = vec![candidate("c1", "Top Hits", "Spotify")];
    let cfg = config();

    SourceResolver::new(&catalog, &cfg).resolve().await;

    // Profile lookup fails in this fake, so the configured market is used.
    assert_eq!(
        catalog.category_country.lock().unwrap().as_deref(),
        Some("JP")
    );
}

#[tokio::test]
async fn empty_resolution_is_a_valid_outcome() {
    let catalog = FakeCatalog::default();
    let cfg = config();
    let tracks = SourceResolver::new(&catalog, &cfg).resolve().await;
    assert!(tracks.is_empty());
}

#[tokio::test]
async fn list_sources_returns_candidates_and_market() {
    let mut catalog = FakeCatalog::default();
    catalog.search.insert(
        "Top 50 - Global".to_string(),
        vec![candidate("s1", "Top 50 - Global", "Spotify")],
    );
    catalog.category = vec![
        candidate("s1", "Top 50 - Global", "Spotify"),
        candidate("c1", "Top Hits", "Spotify"),
    ];
    let cfg = config();

    let (entries, market) = SourceResolver::new(&catalog, &cfg).list_sources().await;

    assert_eq!(market.as_deref(), Some("JP"));
    // The category duplicate of s1 is dropped.
    let entry_ids: Vec<_> = entries.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(entry_ids, vec!["s1", "c1"]);
}

#[tokio::test]
async fn recommend_bounds_output_and_records_snapshot() {
    let all_ids: Vec<String> = (0..12).map(|i| format!("t{i}")).collect();
    let id_refs: Vec<&str> = all_ids.iter().map(String::as_str).collect();
    let catalog = FakeCatalog::default().with_playlist("default-pl", &id_refs);
    let cfg = config();
    let mut log = RecentLog::default();

    let tracks = pipeline::recommend(&catalog, &cfg, &mut log, 1_700_000_000).await;

    assert_eq!(tracks.len(), 10);
    assert_eq!(log.len(), 1);
    assert_eq!(log.entries()[0].ts, 1_700_000_000);
    assert_eq!(log.entries()[0].track_ids, ids(&tracks));
}

#[tokio::test]
async fn recommend_with_no_sources_leaves_log_untouched() {
    let catalog = FakeCatalog::default();
    let cfg = config();
    let mut log = RecentLog::default();

    let tracks = pipeline::recommend(&catalog, &cfg, &mut log, 1_700_000_000).await;

    assert!(tracks.is_empty());
    assert!(log.is_empty());
}

#[tokio::test]
async fn recent_with_tracks_annotates_resolvable_ids() {
    let mut catalog = FakeCatalog::default();
    catalog.track_details = vec![track("a"), track("b")];

    let mut log = RecentLog::default();
    log.record(
        vec!["a".to_string(), "gone".to_string(), "b".to_string()],
        100,
    );

    let entries = pipeline::recent_with_tracks(&catalog, &log).await;

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].ts, 100);
    // Unresolvable ids stay listed but get no track object.
    assert_eq!(entries[0].track_ids, vec!["a", "gone", "b"]);
    assert_eq!(ids(&entries[0].tracks), vec!["a", "b"]);
}

#[tokio::test]
async fn recent_with_tracks_batches_lookups() {
    let mut catalog = FakeCatalog::default();
    catalog.track_details = Vec::new();

    let mut log = RecentLog::default();
    // Two snapshots sharing some ids; 60 distinct ids in total.
    log.record((0..40).map(|i| format!("t{i}")), 100);
    log.record((20..60).map(|i| format!("t{i}")), 200);

    pipeline::recent_with_tracks(&catalog, &log).await;

    let batches = catalog.track_batches.lock().unwrap().clone();
    assert_eq!(batches, vec![50, 10], "union of ids split at the 50-id limit");
}
