//! Per-shard and per-pool allocation statistics.
//!
//! Counters are plain integers guarded by each shard's mutex; snapshots are
//! taken shard by shard, so a [`PoolStats`] read under live traffic is
//! consistent per shard but not across shards. The whole module exists only
//! with the `counters` feature (on by default).

use std::fmt;

/// Counter snapshot for a single shard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShardStats {
    /// Buffer requests served by this shard (hits and creations alike)
    pub allocations: u64,
    /// Buffers released back to this shard
    pub deallocations: u64,
    /// Requests satisfied from the free list
    pub recycle_hits: u64,
    /// Requests that needed a fresh backing allocation
    pub creations: u64,
    /// Backing-allocator failures that triggered a global sweep
    pub bad_allocs: u64,
    /// Releases whose hint named a shard that did not hold the buffer
    pub wrong_hints: u64,
}

impl ShardStats {
    /// Add another shard's counters into this snapshot.
    pub fn accumulate(&mut self, other: &ShardStats) {
        self.allocations += other.allocations;
        self.deallocations += other.deallocations;
        self.recycle_hits += other.recycle_hits;
        self.creations += other.creations;
        self.bad_allocs += other.bad_allocs;
        self.wrong_hints += other.wrong_hints;
    }
}

/// Counter snapshot for a whole typed pool.
#[derive(Clone, Debug, Default)]
pub struct PoolStats {
    shards: Vec<ShardStats>,
}

impl PoolStats {
    pub(crate) fn new(shards: Vec<ShardStats>) -> Self {
        Self { shards }
    }

    /// Number of shards in the snapshot.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Counters of one shard.
    ///
    /// # Panics
    ///
    /// Panics if `location` is out of range.
    pub fn shard(&self, location: usize) -> ShardStats {
        self.shards[location]
    }

    /// Counters summed over every shard.
    pub fn totals(&self) -> ShardStats {
        let mut totals = ShardStats::default();
        for shard in &self.shards {
            totals.accumulate(shard);
        }
        totals
    }

    /// Fraction of requests served from the free lists, in percent.
    pub fn recycle_rate(&self) -> f64 {
        let totals = self.totals();
        if totals.allocations == 0 {
            return 0.0;
        }
        totals.recycle_hits as f64 / totals.allocations as f64 * 100.0
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let totals = self.totals();
        writeln!(f, "buffer pool report ({} shards):", self.shards.len())?;
        writeln!(f, "  buffer requests served:        {}", totals.allocations)?;
        writeln!(f, "  buffers newly created:         {}", totals.creations)?;
        writeln!(f, "  requests served by recycling:  {}", totals.recycle_hits)?;
        writeln!(f, "  buffers released for reuse:    {}", totals.deallocations)?;
        writeln!(f, "  bad allocs that forced sweeps: {}", totals.bad_allocs)?;
        writeln!(f, "  wrong release hints:           {}", totals.wrong_hints)?;
        write!(f, "  recycle rate:                  {:.1}%", self.recycle_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_sums_fields() {
        let mut left = ShardStats {
            allocations: 3,
            deallocations: 2,
            recycle_hits: 1,
            creations: 2,
            bad_allocs: 0,
            wrong_hints: 1,
        };
        let right = ShardStats {
            allocations: 1,
            deallocations: 1,
            recycle_hits: 1,
            creations: 0,
            bad_allocs: 1,
            wrong_hints: 0,
        };
        left.accumulate(&right);
        assert_eq!(left.allocations, 4);
        assert_eq!(left.deallocations, 3);
        assert_eq!(left.recycle_hits, 2);
        assert_eq!(left.creations, 2);
        assert_eq!(left.bad_allocs, 1);
        assert_eq!(left.wrong_hints, 1);
    }

    #[test]
    fn recycle_rate_handles_idle_pool() {
        let stats = PoolStats::new(vec![ShardStats::default(); 4]);
        assert_eq!(stats.recycle_rate(), 0.0);
    }

    #[test]
    fn recycle_rate_percentage() {
        let mut shard = ShardStats::default();
        shard.allocations = 4;
        shard.recycle_hits = 3;
        let stats = PoolStats::new(vec![shard]);
        assert!((stats.recycle_rate() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn report_is_printable() {
        let stats = PoolStats::new(vec![ShardStats::default(); 2]);
        let report = stats.to_string();
        assert!(report.contains("buffer pool report"));
        assert!(report.contains("recycle rate"));
    }
}
