//! Transposition table: direct-mapped, Zobrist-hash-indexed search cache.
//!
//! Capacity comes from a plain `size_mb * 1024 * 1024 / size_of::<Entry>()`
//! division rather than a power-of-two table with a bitmask index; the
//! spec's resolved Open Question favors the simpler division/modulo scheme.
//! A single slot per hash bucket means a new entry always overwrites
//! whatever was there; depth-preferred replacement is left to the caller
//! (the searcher skips overwriting a deeper stored entry with a shallower
//! one, see [`crate::searcher`]).

use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::moves::Move;

/// Scores at or beyond this magnitude are mate scores, not material scores
/// (no realistic material evaluation approaches it).
pub const MATE_SCORE: i32 = 10_000;
const MATE_THRESHOLD: i32 = MATE_SCORE - 1_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundType {
    Exact,
    Lower,
    Upper,
}

#[derive(Clone, Copy, Debug)]
pub struct Entry {
    pub hash: u64,
    pub depth: u32,
    pub score: i32,
    pub bound: BoundType,
    pub best_move: Option<Move>,
}

/// Lookup/insert counters, tracked independently of slot occupancy so
/// hit-rate diagnostics survive table resizes.
#[derive(Default)]
pub struct Stats {
    lookups: AtomicU64,
    hits: AtomicU64,
    inserts: AtomicU64,
}

impl Stats {
    #[must_use]
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }
}

pub struct TranspositionTable {
    slots: Vec<Option<Entry>>,
    stats: Stats,
}

impl TranspositionTable {
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let entry_size = mem::size_of::<Option<Entry>>();
        let capacity = ((size_mb * 1024 * 1024) / entry_size).max(1);
        TranspositionTable {
            slots: vec![None; capacity],
            stats: Stats::default(),
        }
    }

    pub fn resize(&mut self, size_mb: usize) {
        *self = TranspositionTable::new(size_mb);
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    fn index(&self, hash: u64) -> usize {
        (hash % self.slots.len() as u64) as usize
    }

    /// `ply` is the distance from the search root to the node being probed;
    /// it undoes the mate-distance adjustment applied on [`Self::store`].
    pub fn probe(&self, hash: u64, ply: u32) -> Option<Entry> {
        self.stats.lookups.fetch_add(1, Ordering::Relaxed);
        let slot = self.slots[self.index(hash)]?;
        if slot.hash != hash {
            return None;
        }
        self.stats.hits.fetch_add(1, Ordering::Relaxed);
        Some(Entry {
            score: relative_to_root(slot.score, ply),
            ..slot
        })
    }

    pub fn store(
        &mut self,
        hash: u64,
        depth: u32,
        score: i32,
        bound: BoundType,
        best_move: Option<Move>,
        ply: u32,
    ) {
        self.stats.inserts.fetch_add(1, Ordering::Relaxed);
        let idx = self.index(hash);
        self.slots[idx] = Some(Entry {
            hash,
            depth,
            score: relative_to_node(score, ply),
            bound,
            best_move,
        });
    }

    #[must_use]
    pub fn hashfull_per_mille(&self) -> u32 {
        if self.slots.is_empty() {
            return 0;
        }
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        ((occupied as u64 * 1000) / self.slots.len() as u64) as u32
    }
}

/// Converts a mate score expressed as "plies from this node" into "plies
/// from the search root", for scores read back out of the table.
fn relative_to_root(score: i32, ply: u32) -> i32 {
    if score > MATE_THRESHOLD {
        score - ply as i32
    } else if score < -MATE_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

/// The inverse of [`relative_to_root`], applied before a mate score is
/// written into the table so it remains meaningful regardless of how deep
/// into the tree it is eventually read back from.
fn relative_to_node(score: i32, ply: u32) -> i32 {
    if score > MATE_THRESHOLD {
        score + ply as i32
    } else if score < -MATE_THRESHOLD {
        score - ply as i32
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_an_exact_score() {
        let mut tt = TranspositionTable::new(1);
        tt.store(0xabc, 4, 37, BoundType::Exact, None, 2);
        let entry = tt.probe(0xabc, 2).unwrap();
        assert_eq!(entry.score, 37);
        assert_eq!(entry.depth, 4);
    }

    #[test]
    fn mate_score_distance_corrects_across_different_plies() {
        let mut tt = TranspositionTable::new(1);
        // A mate found 3 plies deep in the node where it was stored.
        tt.store(0x1, 10, MATE_SCORE - 3, BoundType::Exact, None, 5);
        // Read back from 2 plies shallower: mate distance grows accordingly.
        let entry = tt.probe(0x1, 3).unwrap();
        assert_eq!(entry.score, MATE_SCORE - 1);
    }

    #[test]
    fn probe_misses_on_hash_collision_in_the_same_slot() {
        let mut tt = TranspositionTable::new(1);
        tt.store(0x1, 1, 10, BoundType::Exact, None, 0);
        let other_hash = 0x1u64.wrapping_add(tt.capacity() as u64);
        assert!(tt.probe(other_hash, 0).is_none());
    }

    #[test]
    fn capacity_is_division_based_not_power_of_two() {
        let tt = TranspositionTable::new(1);
        let entry_size = mem::size_of::<Option<Entry>>();
        assert_eq!(tt.capacity(), (1024 * 1024) / entry_size);
    }
}
