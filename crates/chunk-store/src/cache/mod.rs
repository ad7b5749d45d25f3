//! Caches held by a store session.

mod request_cache;

pub use request_cache::{Fetched, Lookup, RequestCache};

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of store cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub metadata_hits: u64,
    pub metadata_misses: u64,
    pub coalesced_reads: u64,
    pub axis_cache_hits: u64,
    pub purged_failures: u64,
}

impl StoreStats {
    /// Metadata hit rate (0.0 - 1.0).
    pub fn metadata_hit_rate(&self) -> f64 {
        let total = self.metadata_hits + self.metadata_misses;
        if total == 0 {
            0.0
        } else {
            self.metadata_hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    metadata_hits: AtomicU64,
    metadata_misses: AtomicU64,
    coalesced_reads: AtomicU64,
    axis_cache_hits: AtomicU64,
    purged_failures: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_metadata<T>(&self, fetched: &Fetched<T>) {
        match fetched.lookup {
            Lookup::Hit => self.metadata_hits.fetch_add(1, Ordering::Relaxed),
            Lookup::Joined => self.coalesced_reads.fetch_add(1, Ordering::Relaxed),
            Lookup::Started => self.metadata_misses.fetch_add(1, Ordering::Relaxed),
        };
        self.record_purge(fetched);
    }

    pub(crate) fn record_read<T>(&self, fetched: &Fetched<T>) {
        match fetched.lookup {
            Lookup::Hit => {
                self.axis_cache_hits.fetch_add(1, Ordering::Relaxed);
            }
            Lookup::Joined => {
                self.coalesced_reads.fetch_add(1, Ordering::Relaxed);
            }
            Lookup::Started => {}
        }
        self.record_purge(fetched);
    }

    fn record_purge<T>(&self, fetched: &Fetched<T>) {
        if fetched.purged {
            self.purged_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> StoreStats {
        StoreStats {
            metadata_hits: self.metadata_hits.load(Ordering::Relaxed),
            metadata_misses: self.metadata_misses.load(Ordering::Relaxed),
            coalesced_reads: self.coalesced_reads.load(Ordering::Relaxed),
            axis_cache_hits: self.axis_cache_hits.load(Ordering::Relaxed),
            purged_failures: self.purged_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let mut stats = StoreStats::default();
        assert_eq!(stats.metadata_hit_rate(), 0.0);

        stats.metadata_hits = 3;
        stats.metadata_misses = 1;
        assert!((stats.metadata_hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
