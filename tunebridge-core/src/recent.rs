//! Per-session recency log for recommendation snapshots
//!
//! The log is a plain value owned by the surrounding session object; it
//! holds no process-wide state, which keeps it directly constructible in
//! tests.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Maximum snapshots retained per session.
pub const RECENT_MAX: usize = 5;

/// Recency log errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecentLogError {
    /// Deletion index outside the current log bounds
    #[error("index {index} out of range for log of length {len}")]
    IndexOutOfRange { index: i64, len: usize },
}

/// One recorded outcome of a recommendation resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    /// Seconds since epoch at record (or last refresh) time
    pub ts: i64,
    /// De-duplicated track ids, insertion order preserved
    pub track_ids: Vec<String>,
}

/// Bounded, ordered log of recommendation snapshots, newest first.
///
/// Ordered by insertion, not by timestamp value: a refresh-in-place keeps
/// the entry's position while bumping its timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentLog {
    entries: Vec<RecentEntry>,
}

impl RecentLog {
    /// Record a snapshot of recommended track ids.
    ///
    /// Empty ids are dropped and duplicates collapse to their first
    /// occurrence. An empty snapshot is a no-op. When the newest entry
    /// already holds exactly the same ids, only its timestamp is bumped so
    /// repeated identical recommendations do not flood the log. Otherwise
    /// the snapshot is prepended and the log truncated to [`RECENT_MAX`].
    pub fn record<I>(&mut self, ids: I, now: i64)
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let ids: Vec<String> = ids
            .into_iter()
            .filter(|id| !id.is_empty())
            .filter(|id| seen.insert(id.clone()))
            .collect();

        if ids.is_empty() {
            return;
        }

        if let Some(newest) = self.entries.first_mut() {
            if newest.track_ids == ids {
                newest.ts = now;
                return;
            }
        }

        self.entries.insert(0, RecentEntry { ts: now, track_ids: ids });
        self.entries.truncate(RECENT_MAX);
    }

    /// All snapshots, newest first.
    pub fn entries(&self) -> &[RecentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove the entry at `index` (0 = newest).
    ///
    /// Returns the removed entry's timestamp and the new length. Fails
    /// with [`RecentLogError::IndexOutOfRange`] for negative or
    /// past-the-end indices so the client can reconcile with the reported
    /// length.
    pub fn delete_at(&mut self, index: i64) -> Result<(i64, usize), RecentLogError> {
        let len = self.entries.len();
        if index < 0 || index as usize >= len {
            return Err(RecentLogError::IndexOutOfRange { index, len });
        }
        let entry = self.entries.remove(index as usize);
        Ok((entry.ts, self.entries.len()))
    }

    /// Remove every entry with the given timestamp (normally 0 or 1
    /// match). Returns the number removed and the new length; zero matches
    /// is not an error.
    pub fn delete_by_ts(&mut self, ts: i64) -> (usize, usize) {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.ts != ts);
        (before - self.entries.len(), self.entries.len())
    }

    /// Empty the log. Idempotent.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
