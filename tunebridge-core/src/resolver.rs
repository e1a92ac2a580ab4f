//! Source resolution with ordered fallbacks
//!
//! Recommendation tracks come from the first source that yields anything:
//! a configured default playlist, then editorial playlist search, then the
//! market's top-lists browse category. Every external call along the way is
//! individually fault-tolerant so one bad query never aborts the rest.

use std::collections::HashSet;

use tracing::debug;

use crate::catalog::{CatalogApi, PlaylistCandidate, Track};
use crate::probe::probe;

/// Editorial playlist names probed via search, in priority order.
/// Several language variants of the same charts so at least one matches
/// regardless of the account's market.
const SEARCH_QUERIES: &[&str] = &[
    "Top 50 - Global",
    "Today's Top Hits",
    "Top Hits",
    "Viral 50 - Global",
    "トップ50（日本）",
    "Los 50 más escuchados",
];

/// Search results requested per query
const SEARCH_RESULTS_PER_QUERY: u32 = 5;

/// Browse category holding chart playlists
const TOPLISTS_CATEGORY: &str = "toplists";

/// Category playlists requested per market
const CATEGORY_PLAYLIST_LIMIT: u32 = 10;

/// Tunables for source resolution.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Playlist probed before any search or category lookup
    pub default_playlist: String,
    /// Market assumed when the profile has no usable country; empty means
    /// "no market known", which skips market-dependent steps
    pub default_market: String,
    /// Owner name recognized as the platform's editorial account
    pub official_curator: String,
}

/// Fallback machine producing raw recommendation candidates.
pub struct SourceResolver<'a> {
    catalog: &'a dyn CatalogApi,
    config: &'a ResolverConfig,
}

impl<'a> SourceResolver<'a> {
    pub fn new(catalog: &'a dyn CatalogApi, config: &'a ResolverConfig) -> Self {
        Self { catalog, config }
    }

    /// Resolve tracks by trying each source in order, stopping at the
    /// first non-empty result. An empty return is a valid outcome, not an
    /// error.
    pub async fn resolve(&self) -> Vec<Track> {
        // Default playlist, first without a market filter.
        let tracks = probe(self.catalog, &self.config.default_playlist, None).await;
        if !tracks.is_empty() {
            return tracks;
        }

        let market = self.market().await;
        if let Some(market) = market.as_deref() {
            let tracks = probe(self.catalog, &self.config.default_playlist, Some(market)).await;
            if !tracks.is_empty() {
                return tracks;
            }
        }

        // Editorial search, curator-owned candidates first.
        for candidate in self.search_candidates().await {
            let tracks = probe(self.catalog, &candidate.id, market.as_deref()).await;
            if !tracks.is_empty() {
                debug!(playlist = %candidate.name, "resolved tracks via search candidate");
                return tracks;
            }
        }

        // The market's top-lists category, best-scored first.
        if let Some(market) = market.as_deref() {
            for candidate in self.category_candidates(market).await {
                let tracks = probe(self.catalog, &candidate.id, Some(market)).await;
                if !tracks.is_empty() {
                    debug!(playlist = %candidate.name, "resolved tracks via category candidate");
                    return tracks;
                }
            }
        }

        Vec::new()
    }

    /// Candidate sources the resolver would consider, without probing
    /// them, plus the resolved market. Feeds the sources listing endpoint.
    pub async fn list_sources(&self) -> (Vec<PlaylistCandidate>, Option<String>) {
        let market = self.market().await;
        let mut entries = self.search_candidates().await;

        if let Some(market) = market.as_deref() {
            let seen: HashSet<String> = entries.iter().map(|c| c.id.clone()).collect();
            entries.extend(
                self.category_candidates(market)
                    .await
                    .into_iter()
                    .filter(|c| !seen.contains(&c.id)),
            );
        }

        (entries, market)
    }

    /// The user's market from the profile country, falling back to the
    /// configured default. `None` when neither is available.
    async fn market(&self) -> Option<String> {
        let country = match self.catalog.current_user().await {
            Ok(profile) => profile.country.filter(|c| !c.is_empty()),
            Err(err) => {
                debug!(%err, "profile lookup failed, using default market");
                None
            }
        };

        country.or_else(|| {
            let fallback = self.config.default_market.trim();
            (!fallback.is_empty()).then(|| fallback.to_string())
        })
    }

    /// Search candidates across all queries, merged and de-duplicated,
    /// with curator-owned playlists ranked ahead of everything else.
    /// Per-query order is preserved within each rank; a failed query is
    /// skipped, not fatal.
    async fn search_candidates(&self) -> Vec<PlaylistCandidate> {
        let mut curated = Vec::new();
        let mut others = Vec::new();
        let mut seen = HashSet::new();

        for &query in SEARCH_QUERIES {
            let found = match self
                .catalog
                .search_playlists(query, SEARCH_RESULTS_PER_QUERY)
                .await
            {
                Ok(found) => found,
                Err(err) => {
                    debug!(query, %err, "playlist search failed, skipping query");
                    continue;
                }
            };

            for candidate in found {
                if !seen.insert(candidate.id.clone()) {
                    continue;
                }
                if self.is_official(&candidate.owner) {
                    curated.push(candidate);
                } else {
                    others.push(candidate);
                }
            }
        }

        curated.extend(others);
        curated
    }

    /// Top-lists category playlists for a market, ordered by descending
    /// chart-likeness score with listing order breaking ties.
    async fn category_candidates(&self, market: &str) -> Vec<PlaylistCandidate> {
        let found = match self
            .catalog
            .category_playlists(TOPLISTS_CATEGORY, market, CATEGORY_PLAYLIST_LIMIT)
            .await
        {
            Ok(found) => found,
            Err(err) => {
                debug!(market, %err, "category lookup failed, skipping source");
                return Vec::new();
            }
        };

        let mut scored: Vec<(i32, PlaylistCandidate)> = found
            .into_iter()
            .map(|candidate| (self.score(&candidate), candidate))
            .collect();
        // Stable sort keeps the original listing order for equal scores.
        scored.sort_by_key(|(score, _)| std::cmp::Reverse(*score));
        scored.into_iter().map(|(_, candidate)| candidate).collect()
    }

    /// Chart-likeness: +2 when the name reads like a hits chart, +1 when
    /// the platform's own editorial account owns it.
    fn score(&self, candidate: &PlaylistCandidate) -> i32 {
        let name = candidate.name.to_lowercase();
        let mut score = 0;
        if name.contains("top") && name.contains("hit") {
            score += 2;
        }
        if self.is_official(&candidate.owner) {
            score += 1;
        }
        score
    }

    fn is_official(&self, owner: &str) -> bool {
        owner.eq_ignore_ascii_case(&self.config.official_curator)
    }
}
