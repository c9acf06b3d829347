//! Zobrist hashing: incrementally maintainable 64-bit position hashes.
//!
//! Keys are generated once from a fixed seed so the same position hashes
//! identically across runs and across processes, which the transposition
//! table and the repetition/threefold tests both depend on.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geom::Coord;
use crate::piece::{Color, Piece};

const ZOBRIST_SEED: u64 = 1_234_567_890;

pub struct ZobristKeys {
    /// `piece_keys[hash_idx][square]`, `hash_idx` per [`Piece::hash_idx`].
    piece_keys: [[u64; 64]; 12],
    black_to_move_key: u64,
    /// `castling_keys[color][side]`: side 0 = kingside, 1 = queenside.
    castling_keys: [[u64; 2]; 2],
    en_passant_keys: [u64; 8],
}

impl ZobristKeys {
    fn generate() -> ZobristKeys {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

        let mut piece_keys = [[0u64; 64]; 12];
        for row in &mut piece_keys {
            for key in row.iter_mut() {
                *key = rng.gen();
            }
        }

        let black_to_move_key = rng.gen();

        let mut castling_keys = [[0u64; 2]; 2];
        for color in &mut castling_keys {
            for key in color.iter_mut() {
                *key = rng.gen();
            }
        }

        let mut en_passant_keys = [0u64; 8];
        for key in &mut en_passant_keys {
            *key = rng.gen();
        }

        ZobristKeys {
            piece_keys,
            black_to_move_key,
            castling_keys,
            en_passant_keys,
        }
    }

    #[must_use]
    pub fn piece_square(&self, piece: Piece, sq: Coord) -> u64 {
        self.piece_keys[piece.hash_idx()][sq.index() as usize]
    }

    #[must_use]
    pub fn side_to_move(&self) -> u64 {
        self.black_to_move_key
    }

    /// `side` 0 = kingside, 1 = queenside.
    #[must_use]
    pub fn castling(&self, color: Color, side: usize) -> u64 {
        self.castling_keys[color.index()][side]
    }

    #[must_use]
    pub fn en_passant_file(&self, file: i32) -> u64 {
        self.en_passant_keys[file as usize]
    }
}

pub static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::generate);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Kind;

    #[test]
    fn keys_are_deterministic_across_accesses() {
        let a = ZOBRIST.piece_square(Piece::new(Kind::Pawn, Color::White), Coord::new(4, 1));
        let b = ZOBRIST.piece_square(Piece::new(Kind::Pawn, Color::White), Coord::new(4, 1));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_pieces_get_distinct_keys() {
        let p = ZOBRIST.piece_square(Piece::new(Kind::Pawn, Color::White), Coord::new(4, 1));
        let n = ZOBRIST.piece_square(Piece::new(Kind::Knight, Color::White), Coord::new(4, 1));
        assert_ne!(p, n);
    }
}
