//! In-memory LRU cache for read-path query results.
//!
//! Entries are keyed by the query and its parameters. Any committed write
//! clears the whole cache and bumps its generation; a result is only stored
//! if no clear happened since its query started, so a cached answer is never
//! older than the last write made through this process.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::models::{TeamHistory, TeamSnapshot, TeamStanding};

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    LatestForTeam {
        table: String,
        team: String,
    },
    TeamHistory {
        table: String,
        team: String,
        start: String,
        end: String,
    },
    LatestByStatistic {
        table: String,
        statistic: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedResult {
    Snapshot(Option<TeamSnapshot>),
    History(TeamHistory),
    Standings(Vec<TeamStanding>),
}

pub struct QueryCache {
    entries: Mutex<LruCache<QueryKey, CachedResult>>,
    generation: AtomicU64,
    capacity: usize,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(size)),
            generation: AtomicU64::new(0),
            capacity,
        }
    }

    pub fn get(&self, key: &QueryKey) -> Option<CachedResult> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    /// Take before running a query; pass to [`QueryCache::put`] afterwards.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store `value` unless the cache was cleared after `generation` was read.
    pub fn put(&self, key: QueryKey, value: CachedResult, generation: u64) {
        if let Ok(mut entries) = self.entries.lock() {
            if self.generation.load(Ordering::SeqCst) == generation {
                entries.put(key, value);
            }
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            self.generation.fetch_add(1, Ordering::SeqCst);
            entries.clear();
        }
    }

    /// (entries, capacity)
    pub fn stats(&self) -> (usize, usize) {
        let len = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        (len, self.capacity)
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
