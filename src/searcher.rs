//! Negamax search with alpha-beta pruning, iterative deepening, and a
//! transposition-table-backed move-ordering and cutoff scheme.
//!
//! Evaluation is material-only, signed from the side-to-move's perspective.
//! Positional heuristics are explicitly out of scope (see the crate's design
//! notes). Depth and wall-clock limits are both supported; a shared
//! `AtomicBool` lets a caller on another thread request cooperative
//! cancellation mid-search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::moves::Move;
use crate::piece::Color;
use crate::position::Board;
use crate::tt::{BoundType, TranspositionTable, MATE_SCORE};

#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub max_depth: u32,
    pub max_duration: Option<Duration>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits {
            max_depth: 6,
            max_duration: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth_reached: u32,
    pub nodes: u64,
}

pub struct Searcher<'a> {
    board: &'a mut Board,
    tt: Arc<RwLock<TranspositionTable>>,
    stop: Arc<AtomicBool>,
    deadline: Option<Instant>,
    nodes: u64,
}

impl<'a> Searcher<'a> {
    pub fn new(board: &'a mut Board, tt: Arc<RwLock<TranspositionTable>>, stop: Arc<AtomicBool>) -> Self {
        Searcher {
            board,
            tt,
            stop,
            deadline: None,
            nodes: 0,
        }
    }

    pub fn iterative_deepening(&mut self, limits: SearchLimits) -> SearchResult {
        self.deadline = limits.max_duration.map(|d| Instant::now() + d);
        self.nodes = 0;

        let mut result = SearchResult {
            best_move: None,
            score: 0,
            depth_reached: 0,
            nodes: 0,
        };

        for depth in 1..=limits.max_depth.max(1) {
            if self.should_stop() {
                break;
            }
            let score = self.negamax(depth, 0, -(MATE_SCORE + 1), MATE_SCORE + 1);
            if self.should_stop() && depth > 1 {
                // Partial result from an interrupted iteration is unreliable;
                // the previous completed iteration's result stands.
                break;
            }
            result.score = score;
            result.depth_reached = depth;
            result.best_move = self
                .tt
                .read()
                .probe(self.board.hash(), 0)
                .and_then(|e| e.best_move);

            log::debug!(
                "depth {depth}: score {score} nodes {} best {:?}",
                self.nodes,
                result.best_move
            );

            if score.abs() > MATE_SCORE - 1_000 {
                break;
            }
        }

        result.nodes = self.nodes;
        result
    }

    fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn negamax(&mut self, depth: u32, ply: u32, mut alpha: i32, beta: i32) -> i32 {
        self.nodes += 1;

        #[cfg(feature = "logging")]
        log::trace!(
            "ply {ply} depth {depth} alpha {alpha} beta {beta} hash {:#018x}",
            self.board.hash()
        );

        if ply > 0 && self.board.is_draw() {
            return 0;
        }

        let hash = self.board.hash();
        if let Some(entry) = self.tt.read().probe(hash, ply) {
            if entry.depth >= depth {
                match entry.bound {
                    BoundType::Exact => return entry.score,
                    BoundType::Lower if entry.score >= beta => return entry.score,
                    BoundType::Upper if entry.score <= alpha => return entry.score,
                    _ => {}
                }
            }
        }

        if depth == 0 {
            return self.evaluate();
        }

        let mut moves = self.board.all_moves();
        if moves.is_empty() {
            return if self.board.in_check() {
                -(MATE_SCORE - ply as i32)
            } else {
                0
            };
        }
        moves.order_for_search();

        let mut best_score = -(MATE_SCORE + 1);
        let mut best_move = None;
        let mut bound = BoundType::Upper;

        for m in moves.iter() {
            self.board.make_move(m);
            let score = -self.negamax(depth - 1, ply + 1, -beta, -alpha);
            self.board.unmake_move();

            if self.should_stop() {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(*m);
            }
            if best_score > alpha {
                alpha = best_score;
                bound = BoundType::Exact;
            }
            if alpha >= beta {
                bound = BoundType::Lower;
                break;
            }
        }

        self.tt
            .write()
            .store(hash, depth, best_score, bound, best_move, ply);

        best_score
    }

    fn evaluate(&self) -> i32 {
        let material = self.board.material();
        match self.board.side_to_move() {
            Color::White => material,
            Color::Black => -material,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Board;

    fn fresh_tt() -> Arc<RwLock<TranspositionTable>> {
        Arc::new(RwLock::new(TranspositionTable::new(1)))
    }

    #[test]
    fn finds_mate_in_one() {
        let mut board = Board::from_fen("6k1/5ppp/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let mut searcher = Searcher::new(&mut board, fresh_tt(), Arc::new(AtomicBool::new(false)));
        let result = searcher.iterative_deepening(SearchLimits {
            max_depth: 3,
            max_duration: None,
        });
        assert_eq!(result.best_move.unwrap().to.to_string(), "a8");
        assert!(result.score > MATE_SCORE - 1_000);
    }

    #[test]
    fn prefers_capturing_a_hanging_queen() {
        let mut board =
            Board::from_fen("4k3/8/8/4q3/4R3/8/8/4K3 w - - 0 1").unwrap();
        let mut searcher = Searcher::new(&mut board, fresh_tt(), Arc::new(AtomicBool::new(false)));
        let result = searcher.iterative_deepening(SearchLimits {
            max_depth: 2,
            max_duration: None,
        });
        let best = result.best_move.unwrap();
        assert_eq!(best.from.to_string(), "e4");
        assert_eq!(best.to.to_string(), "e5");
    }

    #[test]
    fn stop_flag_halts_the_search() {
        let mut board = Board::new();
        let stop = Arc::new(AtomicBool::new(true));
        let mut searcher = Searcher::new(&mut board, fresh_tt(), stop);
        let result = searcher.iterative_deepening(SearchLimits {
            max_depth: 10,
            max_duration: None,
        });
        assert_eq!(result.depth_reached, 0);
    }
}
