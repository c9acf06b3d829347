//! Packed piece encoding: colorless kind in the low bits, color in bit 3.
//!
//! `Black = 8` so that `piece.0 & COLOR_BIT` tests color and
//! `piece.0 & !COLOR_BIT` strips it, the same bit layout the chess engine
//! this core was distilled from uses, chosen so XOR with the color mask
//! yields the opposite color for free.

use std::fmt;

const COLOR_BIT: u8 = 0b1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    #[must_use]
    pub const fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Kind {
    Empty = 0,
    Pawn = 1,
    Knight = 2,
    Bishop = 3,
    Rook = 4,
    Queen = 5,
    King = 6,
}

impl Kind {
    const fn from_bits(bits: u8) -> Kind {
        match bits {
            0 => Kind::Empty,
            1 => Kind::Pawn,
            2 => Kind::Knight,
            3 => Kind::Bishop,
            4 => Kind::Rook,
            5 => Kind::Queen,
            6 => Kind::King,
            _ => Kind::Empty,
        }
    }
}

/// Material values. The king is never scored: capturing a king is forbidden
/// by construction (the legality filter never generates such a move), so
/// `Kind::King` never reaches material accumulation in practice; `0` is
/// supplied purely so the table is total.
const MATERIAL: [i32; 7] = [0, 100, 300, 300, 500, 900, 0];

/// A piece: colorless kind packed with a color bit, or [`Piece::EMPTY`]
/// which has no color.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Piece(u8);

impl Piece {
    pub const EMPTY: Piece = Piece(0);

    #[must_use]
    pub const fn new(kind: Kind, color: Color) -> Piece {
        if matches!(kind, Kind::Empty) {
            return Piece::EMPTY;
        }
        let color_bits = match color {
            Color::White => 0,
            Color::Black => COLOR_BIT,
        };
        Piece(kind as u8 | color_bits)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn kind(self) -> Kind {
        Kind::from_bits(self.0 & !COLOR_BIT)
    }

    #[must_use]
    pub const fn color(self) -> Option<Color> {
        if self.is_empty() {
            None
        } else if self.0 & COLOR_BIT == 0 {
            Some(Color::White)
        } else {
            Some(Color::Black)
        }
    }

    #[must_use]
    pub const fn is_white(self) -> bool {
        !self.is_empty() && self.0 & COLOR_BIT == 0
    }

    #[must_use]
    pub const fn is_black(self) -> bool {
        self.0 & COLOR_BIT != 0 && !self.is_empty()
    }

    /// The color that would move this piece's opponent; meaningless (but
    /// harmless) on an empty piece.
    #[must_use]
    pub const fn opposite_color(self) -> Option<Color> {
        match self.color() {
            Some(c) => Some(c.opposite()),
            None => None,
        }
    }

    #[must_use]
    pub const fn is_slider(self) -> bool {
        matches!(self.kind(), Kind::Bishop | Kind::Rook | Kind::Queen)
    }

    #[must_use]
    pub const fn is_pawn(self) -> bool {
        matches!(self.kind(), Kind::Pawn)
    }

    #[must_use]
    pub const fn is_king(self) -> bool {
        matches!(self.kind(), Kind::King)
    }

    /// Signed material value: positive for White, negative for Black, zero
    /// for [`Piece::EMPTY`].
    #[must_use]
    pub const fn value(self) -> i32 {
        let base = MATERIAL[self.kind() as usize];
        match self.color() {
            Some(Color::White) | None => base,
            Some(Color::Black) => -base,
        }
    }

    /// Index in `[0, 12)` used for Zobrist piece-square keys: kind-1 plus
    /// 6 for Black. Panics on [`Piece::EMPTY`]; callers must check
    /// [`Piece::is_empty`] first, matching the source's `HashIdx` panic.
    #[must_use]
    pub const fn hash_idx(self) -> usize {
        debug_assert!(!self.is_empty());
        let base = (self.kind() as usize) - 1;
        match self.color() {
            Some(Color::Black) => base + 6,
            _ => base,
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Piece> {
        let (kind, color) = match c {
            'P' => (Kind::Pawn, Color::White),
            'N' => (Kind::Knight, Color::White),
            'B' => (Kind::Bishop, Color::White),
            'R' => (Kind::Rook, Color::White),
            'Q' => (Kind::Queen, Color::White),
            'K' => (Kind::King, Color::White),
            'p' => (Kind::Pawn, Color::Black),
            'n' => (Kind::Knight, Color::Black),
            'b' => (Kind::Bishop, Color::Black),
            'r' => (Kind::Rook, Color::Black),
            'q' => (Kind::Queen, Color::Black),
            'k' => (Kind::King, Color::Black),
            _ => return None,
        };
        Some(Piece::new(kind, color))
    }

    #[must_use]
    pub const fn to_char(self) -> char {
        let lower = match self.kind() {
            Kind::Empty => return ' ',
            Kind::Pawn => 'p',
            Kind::Knight => 'n',
            Kind::Bishop => 'b',
            Kind::Rook => 'r',
            Kind::Queen => 'q',
            Kind::King => 'k',
        };
        if self.is_white() {
            lower.to_ascii_uppercase()
        } else {
            lower
        }
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Piece({})", self.to_char())
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_bit_layout_matches_opposite_via_xor() {
        let wp = Piece::new(Kind::Pawn, Color::White);
        let bp = Piece::new(Kind::Pawn, Color::Black);
        assert_eq!(wp.opposite_color(), Some(Color::Black));
        assert_eq!(bp.opposite_color(), Some(Color::White));
    }

    #[test]
    fn material_signed_by_color() {
        assert_eq!(Piece::new(Kind::Queen, Color::White).value(), 900);
        assert_eq!(Piece::new(Kind::Queen, Color::Black).value(), -900);
        assert_eq!(Piece::new(Kind::Knight, Color::White).value(), 300);
        assert_eq!(Piece::new(Kind::Bishop, Color::White).value(), 300);
    }

    #[test]
    fn char_round_trip() {
        for c in "PNBRQKpnbrqk".chars() {
            let p = Piece::from_char(c).unwrap();
            assert_eq!(p.to_char(), c);
        }
    }

    #[test]
    fn hash_idx_ranges() {
        let all_white: Vec<usize> = [
            Kind::Pawn,
            Kind::Knight,
            Kind::Bishop,
            Kind::Rook,
            Kind::Queen,
            Kind::King,
        ]
        .into_iter()
        .map(|k| Piece::new(k, Color::White).hash_idx())
        .collect();
        assert_eq!(all_white, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(
            Piece::new(Kind::Pawn, Color::Black).hash_idx(),
            6
        );
        assert_eq!(
            Piece::new(Kind::King, Color::Black).hash_idx(),
            11
        );
    }

    #[test]
    fn empty_has_no_color() {
        assert!(Piece::EMPTY.color().is_none());
        assert!(Piece::EMPTY.is_empty());
    }
}
