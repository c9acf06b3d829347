//! Board state, make/unmake, move generation, FEN notation, and perft.
//!
//! Undo is snapshot-based: [`Board`] keeps a stack of whole prior
//! [`BoardState`] values rather than reversible deltas, per the spec's
//! explicit mandate (simplicity and correctness over the shallow
//! performance win an incremental-undo scheme buys).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::attacks;
use crate::bits::Bitboard;
use crate::error::EngineError;
use crate::geom::{Coord, Direction};
use crate::moves::{Move, MoveList};
use crate::piece::{Color, Kind, Piece};
use crate::zobrist::ZOBRIST;

const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

/// Four independent booleans packed into a byte: white/black x kingside/queenside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastlingRights(u8);

impl CastlingRights {
    const fn bit(color: Color, side: CastleSide) -> u8 {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => 0b0001,
            (Color::White, CastleSide::Queenside) => 0b0010,
            (Color::Black, CastleSide::Kingside) => 0b0100,
            (Color::Black, CastleSide::Queenside) => 0b1000,
        }
    }

    #[must_use]
    pub const fn has(self, color: Color, side: CastleSide) -> bool {
        self.0 & Self::bit(color, side) != 0
    }

    pub fn grant(&mut self, color: Color, side: CastleSide) {
        self.0 |= Self::bit(color, side);
    }

    pub fn revoke(&mut self, color: Color, side: CastleSide) {
        self.0 &= !Self::bit(color, side);
    }

    pub fn revoke_color(&mut self, color: Color) {
        self.revoke(color, CastleSide::Kingside);
        self.revoke(color, CastleSide::Queenside);
    }
}

/// The value copied wholesale onto the undo stack on every `make_move`.
#[derive(Clone, Copy)]
struct BoardState {
    mailbox: [Piece; 64],
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Coord,
    halfmove_clock: u32,
    fullmove_number: u32,
    hash: u64,
    material: i32,
    king_square: [Coord; 2],
    in_check: bool,
    /// Occupancy per color.
    occupied: [Bitboard; 2],
    /// Slider-only occupancy per color, a subset of `occupied`.
    sliders: [Bitboard; 2],
}

/// Owns the current position, the undo stack, the chronological move list,
/// and a repetition counter keyed by Zobrist hash.
#[derive(Clone)]
pub struct Board {
    state: BoardState,
    history: Vec<BoardState>,
    move_history: Vec<Move>,
    repetitions: HashMap<u64, u32>,
}

impl Board {
    #[must_use]
    pub fn empty() -> Board {
        let state = BoardState {
            mailbox: [Piece::EMPTY; 64],
            side_to_move: Color::White,
            castling: CastlingRights::default(),
            en_passant: Coord::INVALID,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            material: 0,
            king_square: [Coord::INVALID; 2],
            in_check: false,
            occupied: [Bitboard::EMPTY; 2],
            sliders: [Bitboard::EMPTY; 2],
        };
        let mut repetitions = HashMap::new();
        repetitions.insert(0, 1);
        Board {
            state,
            history: Vec::new(),
            move_history: Vec::new(),
            repetitions,
        }
    }

    #[must_use]
    pub fn new() -> Board {
        Board::from_fen(STARTPOS_FEN).expect("startpos FEN is always valid")
    }

    // ---- accessors -----------------------------------------------------

    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.state.side_to_move
    }

    #[must_use]
    pub fn hash(&self) -> u64 {
        self.state.hash
    }

    #[must_use]
    pub fn material(&self) -> i32 {
        self.state.material
    }

    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.state.halfmove_clock
    }

    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.state.fullmove_number
    }

    #[must_use]
    pub fn in_check(&self) -> bool {
        self.state.in_check
    }

    #[must_use]
    pub fn king_square(&self, color: Color) -> Coord {
        self.state.king_square[color.index()]
    }

    #[must_use]
    pub fn en_passant_target(&self) -> Coord {
        self.state.en_passant
    }

    #[must_use]
    pub fn castling_rights(&self) -> CastlingRights {
        self.state.castling
    }

    #[must_use]
    pub fn piece_at(&self, sq: Coord) -> Piece {
        self.state.mailbox[sq.index() as usize]
    }

    #[must_use]
    pub fn total_occupied(&self) -> Bitboard {
        self.state.occupied[0] | self.state.occupied[1]
    }

    #[must_use]
    pub fn color_occupied(&self, color: Color) -> Bitboard {
        self.state.occupied[color.index()]
    }

    /// True once the halfmove clock hits 100 plies or the current position
    /// has repeated three times; material insufficiency is not modelled
    /// (not required by the board's documented invariants).
    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.state.halfmove_clock >= 100 || self.repetition_count() >= 3
    }

    #[must_use]
    pub fn repetition_count(&self) -> u32 {
        self.repetitions.get(&self.state.hash).copied().unwrap_or(0)
    }

    // ---- the single mutator (spec 4.E) ---------------------------------

    fn set(&mut self, piece: Piece, sq: Coord) {
        let idx = sq.index() as usize;
        let displaced = self.state.mailbox[idx];

        self.state.material -= displaced.value();
        self.state.material += piece.value();

        if !displaced.is_empty() {
            self.state.hash ^= ZOBRIST.piece_square(displaced, sq);
            let c = displaced.color().expect("non-empty piece has a color").index();
            self.state.occupied[c] = self.state.occupied[c].clear(sq);
            if displaced.is_slider() {
                self.state.sliders[c] = self.state.sliders[c].clear(sq);
            }
        }

        if !piece.is_empty() {
            self.state.hash ^= ZOBRIST.piece_square(piece, sq);
            let c = piece.color().expect("non-empty piece has a color");
            self.state.occupied[c.index()] = self.state.occupied[c.index()].set(sq);
            if piece.is_slider() {
                self.state.sliders[c.index()] = self.state.sliders[c.index()].set(sq);
            }
            if piece.is_king() {
                self.state.king_square[c.index()] = sq;
            }
        }

        self.state.mailbox[idx] = piece;
    }

    fn castling_hash(&self) -> u64 {
        let mut h = 0u64;
        for &(color, idx, side) in &[
            (Color::White, 0usize, CastleSide::Kingside),
            (Color::White, 1usize, CastleSide::Queenside),
            (Color::Black, 0usize, CastleSide::Kingside),
            (Color::Black, 1usize, CastleSide::Queenside),
        ] {
            if self.state.castling.has(color, side) {
                h ^= ZOBRIST.castling(color, idx);
            }
        }
        h
    }

    fn en_passant_hash(&self) -> u64 {
        if self.state.en_passant.is_valid() {
            ZOBRIST.en_passant_file(self.state.en_passant.file())
        } else {
            0
        }
    }

    fn recompute_in_check(&mut self) {
        let side = self.state.side_to_move;
        let king = self.state.king_square[side.index()];
        self.state.in_check = self.is_square_attacked(king, side.opposite());
    }

    // ---- make / unmake (spec 4.E) ---------------------------------------

    pub fn make_move(&mut self, m: &Move) {
        self.history.push(self.state);
        self.move_history.push(*m);

        self.state.hash ^= ZOBRIST.side_to_move();
        let mover = self.state.side_to_move;
        self.state.side_to_move = mover.opposite();
        if mover == Color::Black {
            self.state.fullmove_number += 1;
        }

        if m.piece.is_pawn() || m.is_capture {
            self.state.halfmove_clock = 0;
        } else {
            self.state.halfmove_clock += 1;
        }

        self.state.in_check = m.is_check;

        self.state.hash ^= self.castling_hash();
        self.update_castling_rights(m, mover);
        self.state.hash ^= self.castling_hash();

        self.state.hash ^= self.en_passant_hash();
        self.state.en_passant = new_en_passant_target(m);
        self.state.hash ^= self.en_passant_hash();

        if m.is_en_passant {
            let captured_rank = match mover {
                Color::White => m.to.rank() - 1,
                Color::Black => m.to.rank() + 1,
            };
            let captured_sq = Coord::new(m.to.file(), captured_rank);
            self.set(Piece::EMPTY, captured_sq);
        }
        self.set(Piece::EMPTY, m.from);
        let placed = match m.promotion {
            Some(kind) => Piece::new(kind, mover),
            None => m.piece,
        };
        self.set(placed, m.to);

        if m.is_castling() {
            let rank = m.from.rank();
            let (rook_from_file, rook_to_file) = if m.to.file() == 6 { (7, 5) } else { (0, 3) };
            let rook_from = Coord::new(rook_from_file, rank);
            let rook_to = Coord::new(rook_to_file, rank);
            let rook = self.piece_at(rook_from);
            self.set(Piece::EMPTY, rook_from);
            self.set(rook, rook_to);
        }

        *self.repetitions.entry(self.state.hash).or_insert(0) += 1;
    }

    pub fn unmake_move(&mut self) {
        let hash = self.state.hash;
        match self.repetitions.get_mut(&hash) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.repetitions.remove(&hash);
            }
            None => unreachable!("unmake: repetition count missing for current hash"),
        }
        self.move_history.pop();
        self.state = self
            .history
            .pop()
            .expect("unmake called with an empty undo stack");
    }

    fn update_castling_rights(&mut self, m: &Move, mover: Color) {
        if m.piece.is_king() {
            self.state.castling.revoke_color(mover);
        }
        if m.piece.kind() == Kind::Rook {
            let home_rank = home_rank(mover);
            if m.from.rank() == home_rank {
                if m.from.file() == 0 {
                    self.state.castling.revoke(mover, CastleSide::Queenside);
                } else if m.from.file() == 7 {
                    self.state.castling.revoke(mover, CastleSide::Kingside);
                }
            }
        }
        if m.is_capture && !m.is_en_passant {
            let opponent = mover.opposite();
            let home_rank = home_rank(opponent);
            if m.to.rank() == home_rank {
                if m.to.file() == 0 {
                    self.state.castling.revoke(opponent, CastleSide::Queenside);
                } else if m.to.file() == 7 {
                    self.state.castling.revoke(opponent, CastleSide::Kingside);
                }
            }
        }
    }

    // ---- attacker detection (spec 4.F) ---------------------------------

    #[must_use]
    pub fn is_square_attacked(&self, sq: Coord, by_color: Color) -> bool {
        let occ = self.total_occupied();
        let mut attackers = self.state.occupied[by_color.index()];
        while let Some((from, rest)) = attackers.pop_lsb() {
            attackers = rest;
            let piece = self.piece_at(from);
            if attacks_from(piece, from, occ).contains(sq) {
                return true;
            }
        }
        false
    }

    // ---- move generation (spec 4.F) ------------------------------------

    #[must_use]
    pub fn moves_for(&mut self, sq: Coord) -> MoveList {
        let mut list = MoveList::new();
        let piece = self.piece_at(sq);
        if piece.is_empty() || piece.color() != Some(self.state.side_to_move) {
            return list;
        }
        match piece.kind() {
            Kind::Pawn => self.generate_pawn_moves(sq, piece, &mut list),
            Kind::Knight => {
                self.generate_destination_moves(sq, piece, attacks::knight_attacks(sq), &mut list)
            }
            Kind::King => {
                self.generate_destination_moves(sq, piece, attacks::king_attacks(sq), &mut list);
                self.generate_castling_moves(sq, piece, &mut list);
            }
            Kind::Bishop => {
                let occ = self.total_occupied();
                self.generate_destination_moves(
                    sq,
                    piece,
                    attacks::bishop_attacks(sq, occ),
                    &mut list,
                );
            }
            Kind::Rook => {
                let occ = self.total_occupied();
                self.generate_destination_moves(sq, piece, attacks::rook_attacks(sq, occ), &mut list);
            }
            Kind::Queen => {
                let occ = self.total_occupied();
                self.generate_destination_moves(
                    sq,
                    piece,
                    attacks::queen_attacks(sq, occ),
                    &mut list,
                );
            }
            Kind::Empty => {}
        }
        list
    }

    #[must_use]
    pub fn all_moves(&mut self) -> MoveList {
        let mut out = MoveList::new();
        let mut squares = self.state.occupied[self.state.side_to_move.index()];
        while let Some((sq, rest)) = squares.pop_lsb() {
            squares = rest;
            for m in self.moves_for(sq).iter() {
                out.push(*m);
            }
        }
        out
    }

    #[must_use]
    pub fn is_checkmate(&mut self) -> bool {
        self.in_check() && self.all_moves().is_empty()
    }

    #[must_use]
    pub fn is_stalemate(&mut self) -> bool {
        !self.in_check() && self.all_moves().is_empty()
    }

    fn generate_destination_moves(
        &mut self,
        from: Coord,
        piece: Piece,
        destinations: Bitboard,
        list: &mut MoveList,
    ) {
        let own = self.state.occupied[piece.color().expect("mover has a color").index()];
        let mut candidates = destinations & !own;
        while let Some((to, rest)) = candidates.pop_lsb() {
            candidates = rest;
            let is_capture = !self.piece_at(to).is_empty();
            let m = Move {
                from,
                to,
                piece,
                promotion: None,
                is_capture,
                is_en_passant: false,
                is_check: false,
            };
            if let Some(legal) = self.try_legalize(m) {
                list.push(legal);
            }
        }
    }

    fn generate_pawn_moves(&mut self, from: Coord, piece: Piece, list: &mut MoveList) {
        let color = piece.color().expect("pawn has a color");
        let (forward, double, start_rank, promo_rank, diag) = match color {
            Color::White => (
                Direction::N,
                Direction::NN,
                1,
                7,
                [Direction::NE, Direction::NW],
            ),
            Color::Black => (
                Direction::S,
                Direction::SS,
                6,
                0,
                [Direction::SE, Direction::SW],
            ),
        };

        let one = from.apply(forward);
        if one.is_valid() && self.piece_at(one).is_empty() {
            self.emit_pawn_move(from, one, piece, false, false, promo_rank, list);
            if from.rank() == start_rank {
                let two = from.apply(double);
                if two.is_valid() && self.piece_at(two).is_empty() {
                    self.emit_pawn_move(from, two, piece, false, false, promo_rank, list);
                }
            }
        }

        for dir in diag {
            let to = from.apply(dir);
            if !to.is_valid() {
                continue;
            }
            if self.state.en_passant.is_valid() && to == self.state.en_passant {
                self.emit_pawn_move(from, to, piece, true, true, promo_rank, list);
            } else if let Some(target_color) = self.piece_at(to).color() {
                if target_color != color {
                    self.emit_pawn_move(from, to, piece, true, false, promo_rank, list);
                }
            }
        }
    }

    fn emit_pawn_move(
        &mut self,
        from: Coord,
        to: Coord,
        piece: Piece,
        is_capture: bool,
        is_en_passant: bool,
        promo_rank: i32,
        list: &mut MoveList,
    ) {
        if to.rank() == promo_rank {
            for &kind in &[Kind::Queen, Kind::Rook, Kind::Bishop, Kind::Knight] {
                let m = Move {
                    from,
                    to,
                    piece,
                    promotion: Some(kind),
                    is_capture,
                    is_en_passant,
                    is_check: false,
                };
                if let Some(legal) = self.try_legalize(m) {
                    list.push(legal);
                }
            }
        } else {
            let m = Move {
                from,
                to,
                piece,
                promotion: None,
                is_capture,
                is_en_passant,
                is_check: false,
            };
            if let Some(legal) = self.try_legalize(m) {
                list.push(legal);
            }
        }
    }

    fn generate_castling_moves(&mut self, from: Coord, piece: Piece, list: &mut MoveList) {
        if self.in_check() {
            return;
        }
        let color = piece.color().expect("king has a color");
        let opponent = color.opposite();
        let rank = from.rank();

        if self.state.castling.has(color, CastleSide::Kingside) {
            let cross = Coord::new(5, rank);
            let dest = Coord::new(6, rank);
            if self.piece_at(cross).is_empty()
                && self.piece_at(dest).is_empty()
                && !self.is_square_attacked(cross, opponent)
                && !self.is_square_attacked(dest, opponent)
            {
                let m = Move::quiet(from, dest, piece);
                if let Some(legal) = self.try_legalize(m) {
                    list.push(legal);
                }
            }
        }

        if self.state.castling.has(color, CastleSide::Queenside) {
            let cross = Coord::new(3, rank);
            let dest = Coord::new(2, rank);
            let knight_sq = Coord::new(1, rank);
            if self.piece_at(cross).is_empty()
                && self.piece_at(dest).is_empty()
                && self.piece_at(knight_sq).is_empty()
                && !self.is_square_attacked(cross, opponent)
                && !self.is_square_attacked(dest, opponent)
            {
                let m = Move::quiet(from, dest, piece);
                if let Some(legal) = self.try_legalize(m) {
                    list.push(legal);
                }
            }
        }
    }

    /// Makes the move, checks king safety for both sides (producing the
    /// `is_check` flag), then unmakes: exactly the make/test/unmake
    /// legality scheme the spec mandates in place of pin analysis.
    fn try_legalize(&mut self, mut m: Move) -> Option<Move> {
        let mover = m.piece.color().expect("mover has a color");
        self.make_move(&m);
        let own_king = self.state.king_square[mover.index()];
        let illegal = self.is_square_attacked(own_king, mover.opposite());
        let gives_check = {
            let opp_king = self.state.king_square[mover.opposite().index()];
            self.is_square_attacked(opp_king, mover)
        };
        self.unmake_move();
        if illegal {
            return None;
        }
        m.is_check = gives_check;
        Some(m)
    }

    // ---- perft ------------------------------------------------------------

    #[must_use]
    pub fn perft(&mut self, depth: u32) -> u64 {
        let mut cache = HashMap::new();
        self.perft_inner(depth, &mut cache)
    }

    fn perft_inner(&mut self, depth: u32, cache: &mut HashMap<(u64, u32), u64>) -> u64 {
        if depth == 0 {
            return 1;
        }
        let key = (self.state.hash, depth);
        if let Some(&count) = cache.get(&key) {
            return count;
        }
        let moves = self.all_moves();
        let mut total = 0u64;
        for m in moves.iter() {
            self.make_move(m);
            total += self.perft_inner(depth - 1, cache);
            self.unmake_move();
        }
        cache.insert(key, total);
        total
    }

    // ---- notation (spec 6) ------------------------------------------------

    pub fn from_fen(fen: &str) -> Result<Board, EngineError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(EngineError::notation(format!(
                "FEN must have at least 4 fields, found {}",
                fields.len()
            )));
        }

        let mut board = Board::empty();

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(EngineError::notation(format!(
                "FEN placement must have 8 ranks, found {}",
                ranks.len()
            )));
        }
        for (row, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - row as i32;
            let mut file = 0i32;
            for c in rank_str.chars() {
                if let Some(run) = c.to_digit(10) {
                    if !(1..=8).contains(&run) {
                        return Err(EngineError::notation(format!(
                            "invalid empty-square run '{c}' in rank {rank}"
                        )));
                    }
                    file += run as i32;
                } else {
                    let piece = Piece::from_char(c).ok_or_else(|| {
                        EngineError::notation(format!("invalid piece character '{c}' in FEN"))
                    })?;
                    if file > 7 {
                        return Err(EngineError::notation(format!(
                            "too many files in rank {rank}"
                        )));
                    }
                    board.set(piece, Coord::new(file, rank));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(EngineError::notation(format!(
                    "rank {rank} does not sum to 8 files"
                )));
            }
        }

        board.state.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(EngineError::notation(format!(
                    "invalid side to move '{other}', expected 'w' or 'b'"
                )))
            }
        };

        if fields[2] != "-" {
            for c in fields[2].chars() {
                match c {
                    'K' => board.state.castling.grant(Color::White, CastleSide::Kingside),
                    'Q' => board.state.castling.grant(Color::White, CastleSide::Queenside),
                    'k' => board.state.castling.grant(Color::Black, CastleSide::Kingside),
                    'q' => board.state.castling.grant(Color::Black, CastleSide::Queenside),
                    other => {
                        return Err(EngineError::notation(format!(
                            "invalid castling character '{other}'"
                        )))
                    }
                }
            }
        }

        board.state.en_passant = fields[3].parse()?;

        board.state.halfmove_clock = match fields.get(4) {
            Some(text) => text
                .parse()
                .map_err(|_| EngineError::notation(format!("invalid halfmove clock '{text}'")))?,
            None => 0,
        };
        board.state.fullmove_number = match fields.get(5) {
            Some(text) => {
                let n: u32 = text
                    .parse()
                    .map_err(|_| EngineError::notation(format!("invalid fullmove number '{text}'")))?;
                if n < 1 {
                    return Err(EngineError::notation("fullmove number must be >= 1".into()));
                }
                n
            }
            None => 1,
        };

        if !board.state.king_square[Color::White.index()].is_valid()
            || !board.state.king_square[Color::Black.index()].is_valid()
        {
            return Err(EngineError::notation(
                "position is missing a king for one or both colors".into(),
            ));
        }

        board.state.hash = 0;
        for sq_idx in 0u8..64 {
            let sq = Coord::from_index(sq_idx);
            let p = board.piece_at(sq);
            if !p.is_empty() {
                board.state.hash ^= ZOBRIST.piece_square(p, sq);
            }
        }
        if board.state.side_to_move == Color::Black {
            board.state.hash ^= ZOBRIST.side_to_move();
        }
        board.state.hash ^= board.castling_hash();
        board.state.hash ^= board.en_passant_hash();

        board.repetitions.clear();
        board.repetitions.insert(board.state.hash, 1);

        board.recompute_in_check();

        Ok(board)
    }

    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for row in 0..8 {
            let rank = 7 - row;
            let mut empty_run = 0u32;
            for file in 0..8 {
                let piece = self.piece_at(Coord::new(file, rank));
                if piece.is_empty() {
                    empty_run += 1;
                } else {
                    if empty_run > 0 {
                        placement.push_str(&empty_run.to_string());
                        empty_run = 0;
                    }
                    placement.push(piece.to_char());
                }
            }
            if empty_run > 0 {
                placement.push_str(&empty_run.to_string());
            }
            if row != 7 {
                placement.push('/');
            }
        }

        let side = match self.state.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut castling = String::new();
        if self.state.castling.has(Color::White, CastleSide::Kingside) {
            castling.push('K');
        }
        if self.state.castling.has(Color::White, CastleSide::Queenside) {
            castling.push('Q');
        }
        if self.state.castling.has(Color::Black, CastleSide::Kingside) {
            castling.push('k');
        }
        if self.state.castling.has(Color::Black, CastleSide::Queenside) {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        format!(
            "{placement} {side} {castling} {} {} {}",
            self.state.en_passant, self.state.halfmove_clock, self.state.fullmove_number
        )
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl FromStr for Board {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Board::from_fen(s)
    }
}

fn home_rank(color: Color) -> i32 {
    match color {
        Color::White => 0,
        Color::Black => 7,
    }
}

fn new_en_passant_target(m: &Move) -> Coord {
    if m.piece.is_pawn() && (m.to.rank() - m.from.rank()).abs() == 2 {
        Coord::new(m.from.file(), (m.from.rank() + m.to.rank()) / 2)
    } else {
        Coord::INVALID
    }
}

fn attacks_from(piece: Piece, from: Coord, occupied: Bitboard) -> Bitboard {
    match piece.kind() {
        Kind::Pawn => attacks::pawn_attacks(piece.color().expect("pawn has a color"), from),
        Kind::Knight => attacks::knight_attacks(from),
        Kind::Bishop => attacks::bishop_attacks(from, occupied),
        Kind::Rook => attacks::rook_attacks(from, occupied),
        Kind::Queen => attacks::queen_attacks(from, occupied),
        Kind::King => attacks::king_attacks(from),
        Kind::Empty => Bitboard::EMPTY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_perft_matches_known_values() {
        let mut board = Board::new();
        assert_eq!(board.perft(1), 20);
        assert_eq!(board.perft(2), 400);
        assert_eq!(board.perft(3), 8_902);
        assert_eq!(board.perft(4), 197_281);
    }

    #[test]
    fn kiwipete_perft_depth_one() {
        let mut board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        assert_eq!(board.perft(1), 48);
    }

    #[test]
    fn position_five_perft_depth_one() {
        let mut board =
            Board::from_fen("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8").unwrap();
        assert_eq!(board.perft(1), 44);
    }

    #[test]
    fn make_unmake_round_trips_hash_and_material() {
        let mut board = Board::new();
        let original_hash = board.hash();
        let original_material = board.material();
        let moves = board.all_moves();
        for m in moves.iter() {
            board.make_move(m);
            board.unmake_move();
            assert_eq!(board.hash(), original_hash);
            assert_eq!(board.material(), original_material);
        }
    }

    #[test]
    fn en_passant_capture_is_legal_and_clears_captured_pawn() {
        let mut board = Board::from_fen("k7/8/8/pP6/8/8/8/K7 w - a6 0 1").unwrap();
        let moves = board.all_moves();
        let ep_move = moves
            .iter()
            .find(|m| m.from.to_string() == "b5" && m.to.to_string() == "a6")
            .expect("en passant capture should be generated");
        assert!(ep_move.is_capture);
        assert!(ep_move.is_en_passant);
        board.make_move(ep_move);
        assert_eq!(board.to_fen(), "k7/8/P7/8/8/8/8/K7 b - - 0 1");
    }

    #[test]
    fn threefold_repetition_is_detected() {
        let mut board = Board::new();
        let sequence = [
            "b1c3", "b8c6", "c3b1", "c6b8", "b1c3", "b8c6", "c3b1", "c6b8",
        ];
        for text in sequence {
            let (from, to, promo) = Move::parse_long_algebraic(text).unwrap();
            let mv = *board
                .moves_for(from)
                .iter()
                .find(|m| m.to == to && m.promotion == promo)
                .expect("sequence move should be legal");
            board.make_move(&mv);
        }
        assert!(board.is_draw());
    }

    #[test]
    fn fen_round_trips_through_display() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(board.to_fen(), fen);
    }

    #[test]
    fn castling_requires_empty_and_unattacked_path() {
        let mut board =
            Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let king_moves = board.moves_for(Coord::new(4, 0));
        let castles: Vec<_> = king_moves
            .iter()
            .filter(|m| m.is_castling())
            .collect();
        assert_eq!(castles.len(), 2);
    }

    #[test]
    fn promotion_generates_four_moves() {
        let mut board = Board::from_fen("8/P6k/8/8/8/8/7p/7K w - - 0 1").unwrap();
        let promos: Vec<_> = board
            .moves_for(Coord::new(0, 6))
            .iter()
            .filter(|m| m.is_promotion())
            .cloned()
            .collect();
        assert_eq!(promos.len(), 4);
    }
}
