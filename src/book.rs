//! A tiny, hand-curated opening book adapter.
//!
//! Real opening books are megabytes of Polyglot-format data; this crate
//! ships a small in-memory table instead; swapping in a file-backed book
//! means implementing [`OpeningBook`] and nothing else.

use std::collections::HashMap;

use rand::Rng;

use crate::error::EngineError;
use crate::moves::Move;
use crate::position::Board;

const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEntry {
    pub mv: &'static str,
    pub weight: u32,
}

/// A source of known-good replies for a position, keyed by Zobrist hash.
pub trait OpeningBook: Send + Sync {
    fn candidates(&self, hash: u64) -> &[BookEntry];
}

/// Weighted-random pick among a position's book candidates. Returns `None`
/// if the slice is empty or every weight is zero.
pub fn select_weighted<'a>(entries: &'a [BookEntry], rng: &mut impl Rng) -> Option<&'a BookEntry> {
    let total: u32 = entries.iter().map(|e| e.weight).sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.gen_range(0..total);
    for entry in entries {
        if roll < entry.weight {
            return Some(entry);
        }
        roll -= entry.weight;
    }
    None
}

/// Resolves a book entry's long-algebraic text against the live board,
/// turning it into a concrete legal [`Move`]. A book that names a move the
/// board doesn't recognize as legal is an authoring bug in the book, not a
/// recoverable runtime condition, surfaced as [`EngineError::BookInconsistent`]
/// so the caller can decide whether to panic or fall back to search.
pub fn resolve(board: &mut Board, entry: &BookEntry) -> Result<Move, EngineError> {
    let (from, to, promotion) = Move::parse_long_algebraic(entry.mv)?;
    board
        .moves_for(from)
        .iter()
        .find(|m| m.to == to && m.promotion == promotion)
        .copied()
        .ok_or(EngineError::BookInconsistent {
            hash: board.hash(),
            from,
            to,
        })
}

pub struct StaticBook {
    table: HashMap<u64, Vec<BookEntry>>,
}

impl StaticBook {
    /// A handful of well-known main-line replies, three plies deep. Enough
    /// to demonstrate the adapter; not a real book.
    #[must_use]
    pub fn standard() -> StaticBook {
        let mut table = HashMap::new();

        insert(
            &mut table,
            STARTPOS_FEN,
            &[("e2e4", 10), ("d2d4", 8), ("g1f3", 5), ("c2c4", 3)],
        );
        insert(
            &mut table,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            &[("c7c5", 8), ("e7e5", 10), ("e7e6", 4), ("c7c6", 3)],
        );
        insert(
            &mut table,
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2",
            &[("g1f3", 10), ("f1c4", 4), ("b1c3", 3)],
        );
        insert(
            &mut table,
            "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq d3 0 1",
            &[("g8f6", 9), ("d7d5", 8), ("e7e6", 3)],
        );

        StaticBook { table }
    }
}

impl OpeningBook for StaticBook {
    fn candidates(&self, hash: u64) -> &[BookEntry] {
        self.table.get(&hash).map_or(&[], Vec::as_slice)
    }
}

fn insert(table: &mut HashMap<u64, Vec<BookEntry>>, fen: &str, moves: &[(&'static str, u32)]) {
    let hash = Board::from_fen(fen)
        .expect("book FEN literals are well-formed")
        .hash();
    table.insert(
        hash,
        moves
            .iter()
            .map(|&(mv, weight)| BookEntry { mv, weight })
            .collect(),
    );
}
