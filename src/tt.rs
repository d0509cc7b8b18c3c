//! Shared transposition table.
//!
//! A fixed array of buckets, each a small vector of entries guarded by its
//! own mutex, so workers never observe a torn entry. The table lives for
//! one search and is shared by all of its workers.

use parking_lot::Mutex;

use crate::board::Move;

/// How a stored value bounds the true score.
///
/// `Alpha` is an upper bound (the node failed low), `Beta` a lower bound
/// (the node failed high).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Alpha,
    Beta,
}

/// One transposition-table entry.
#[derive(Clone, Copy, Debug)]
pub struct TtEntry {
    pub hash: u64,
    pub best_move: Move,
    pub bound: Bound,
    pub depth: i32,
    pub value: i32,
    /// Entries written by quiescence must not cut off the main search
    pub from_quiescence: bool,
}

impl TtEntry {
    /// Try to use this entry at a node searching `depth` with the window
    /// `[alpha, beta]`. Returns the kind of hit and tightens the window for
    /// bound entries; `None` when the entry is too shallow or out of range.
    pub fn apply(&self, depth: i32, alpha: &mut i32, beta: &mut i32) -> Option<Bound> {
        if self.depth < depth {
            return None;
        }

        match self.bound {
            Bound::Exact => Some(Bound::Exact),
            Bound::Alpha => {
                if self.value <= *alpha {
                    *alpha = self.value;
                    Some(Bound::Alpha)
                } else {
                    None
                }
            }
            Bound::Beta => {
                if self.value >= *beta {
                    *beta = self.value;
                    Some(Bound::Beta)
                } else {
                    None
                }
            }
        }
    }
}

/// Bucketed concurrent transposition table keyed by Zobrist hash.
pub struct TranspositionTable {
    buckets: Vec<Mutex<Vec<TtEntry>>>,
    bucket_size: usize,
}

impl TranspositionTable {
    /// Create a table with `bucket_count` buckets of `bucket_size` entries.
    #[must_use]
    pub fn new(bucket_count: usize, bucket_size: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        let bucket_size = bucket_size.max(1);
        let mut buckets = Vec::with_capacity(bucket_count);
        // Bucket storage is allocated lazily as entries arrive
        for _ in 0..bucket_count {
            buckets.push(Mutex::new(Vec::new()));
        }
        TranspositionTable {
            buckets,
            bucket_size,
        }
    }

    /// Drop all entries and change the geometry.
    pub fn reset(&mut self, bucket_count: usize, bucket_size: usize) {
        *self = TranspositionTable::new(bucket_count, bucket_size);
    }

    #[inline]
    fn bucket(&self, hash: u64) -> &Mutex<Vec<TtEntry>> {
        &self.buckets[(hash % self.buckets.len() as u64) as usize]
    }

    /// Find the entry for `hash`, if present.
    #[must_use]
    pub fn probe(&self, hash: u64) -> Option<TtEntry> {
        let bucket = self.bucket(hash).lock();
        bucket.iter().find(|entry| entry.hash == hash).copied()
    }

    /// Insert an entry. A full bucket replaces its first strictly-shallower
    /// entry; when every resident entry is at least as deep, the new entry
    /// is dropped.
    pub fn insert(&self, entry: TtEntry) {
        let mut bucket = self.bucket(entry.hash).lock();

        if bucket.len() < self.bucket_size {
            bucket.push(entry);
            return;
        }

        for resident in bucket.iter_mut() {
            if resident.depth < entry.depth {
                *resident = entry;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;

    fn entry(hash: u64, depth: i32, value: i32) -> TtEntry {
        TtEntry {
            hash,
            best_move: Move::quiet(Square::new(0, 0), Square::new(0, 1)),
            bound: Bound::Exact,
            depth,
            value,
            from_quiescence: false,
        }
    }

    #[test]
    fn test_insert_then_probe_round_trip() {
        let tt = TranspositionTable::new(1024, 4);
        let stored = entry(0xDEAD_BEEF, 5, 42);
        tt.insert(stored);

        let found = tt.probe(0xDEAD_BEEF).unwrap();
        assert_eq!(found.hash, stored.hash);
        assert_eq!(found.depth, 5);
        assert_eq!(found.value, 42);
        assert_eq!(found.bound, Bound::Exact);
        assert!(tt.probe(0xBEEF).is_none());
    }

    #[test]
    fn test_full_bucket_replaces_shallower_entry() {
        let tt = TranspositionTable::new(1, 2);
        tt.insert(entry(1, 3, 10));
        tt.insert(entry(2, 7, 20));
        // Bucket is full; a deeper entry replaces the depth-3 resident
        tt.insert(entry(3, 5, 30));
        assert!(tt.probe(1).is_none());
        assert!(tt.probe(2).is_some());
        assert_eq!(tt.probe(3).unwrap().value, 30);

        // A shallower entry than every resident is dropped
        tt.insert(entry(4, 1, 40));
        assert!(tt.probe(4).is_none());
    }

    #[test]
    fn test_apply_exact_hit() {
        let mut e = entry(1, 6, 50);
        e.bound = Bound::Exact;
        let (mut alpha, mut beta) = (-100, 100);
        assert_eq!(e.apply(6, &mut alpha, &mut beta), Some(Bound::Exact));
        // Too shallow for a deeper request
        assert_eq!(e.apply(7, &mut alpha, &mut beta), None);
    }

    #[test]
    fn test_apply_bounds_tighten_window() {
        let mut e = entry(1, 6, 150);
        e.bound = Bound::Beta;
        let (mut alpha, mut beta) = (-100, 100);
        assert_eq!(e.apply(4, &mut alpha, &mut beta), Some(Bound::Beta));
        assert_eq!(beta, 150);

        let mut e = entry(1, 6, -150);
        e.bound = Bound::Alpha;
        let (mut alpha, mut beta) = (-100, 100);
        assert_eq!(e.apply(4, &mut alpha, &mut beta), Some(Bound::Alpha));
        assert_eq!(alpha, -150);

        // Values inside the window produce no hit
        let mut e = entry(1, 6, 0);
        e.bound = Bound::Beta;
        let (mut alpha, mut beta) = (-100, 100);
        assert_eq!(e.apply(4, &mut alpha, &mut beta), None);
    }
}
