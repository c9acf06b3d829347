//! The boundary a front-end (UCI, XBoard, a GUI, a test harness) would
//! drive: configuration, position management, and search dispatch, with
//! the opening book and transposition table wired in behind it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::RwLock;

use crate::book::{resolve, select_weighted, OpeningBook, StaticBook};
use crate::error::EngineError;
use crate::moves::Move;
use crate::position::Board;
use crate::searcher::{SearchLimits, SearchResult, Searcher};
use crate::tt::TranspositionTable;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Reserved for a future multithreaded search; the table is lock-ready
    /// (see [`crate::tt::TranspositionTable`]) but the search itself is
    /// single-threaded regardless of this value.
    pub threads: u32,
    pub transposition_table_mb: usize,
    pub use_book: bool,
    pub search_depth: u32,
    pub search_duration: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            threads: 1,
            transposition_table_mb: 64,
            use_book: true,
            search_depth: 8,
            search_duration: None,
        }
    }
}

/// Owns one position plus the shared search infrastructure (transposition
/// table, opening book, cancellation flag) that a search over it needs.
/// [`Board`] itself is cheap to clone, which [`Self::go_in_background`]
/// relies on to hand a worker thread its own copy to mutate.
pub struct EngineController {
    board: Board,
    config: EngineConfig,
    tt: Arc<RwLock<TranspositionTable>>,
    book: Arc<dyn OpeningBook>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    last_result: Arc<RwLock<Option<SearchResult>>>,
}

impl EngineController {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let tt = Arc::new(RwLock::new(TranspositionTable::new(
            config.transposition_table_mb,
        )));
        EngineController {
            board: Board::new(),
            config,
            tt,
            book: Arc::new(StaticBook::standard()),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
            last_result: Arc::new(RwLock::new(None)),
        }
    }

    pub fn configure(&mut self, config: EngineConfig) {
        if config.transposition_table_mb != self.config.transposition_table_mb {
            self.tt.write().resize(config.transposition_table_mb);
        }
        if config.threads > 1 {
            log::warn!(
                "threads={} requested but search is single-threaded; ignoring",
                config.threads
            );
        }
        self.config = config;
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn set_position(&mut self, fen: &str) -> Result<(), EngineError> {
        self.board = Board::from_fen(fen)?;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.board = Board::new();
    }

    /// Parses and applies a long-algebraic move against the current
    /// position, rejecting it if the board doesn't consider it legal.
    pub fn apply_move(&mut self, long_algebraic: &str) -> Result<(), EngineError> {
        let (from, to, promotion) = Move::parse_long_algebraic(long_algebraic)?;
        let mv = self
            .board
            .moves_for(from)
            .iter()
            .find(|m| m.to == to && m.promotion == promotion)
            .copied()
            .ok_or_else(|| EngineError::illegal_move(long_algebraic.to_string()))?;
        self.board.make_move(&mv);
        Ok(())
    }

    /// Blocks until a move is chosen: a weighted book pick if the position
    /// is in the book and `use_book` is set, otherwise a depth/time-limited
    /// search. Does not apply the move to the board; callers drive
    /// [`Self::apply_move`] explicitly once they've decided to play it.
    pub fn go(&mut self) -> Result<Move, EngineError> {
        self.stop.store(false, Ordering::Relaxed);

        if self.config.use_book {
            let candidates = self.book.candidates(self.board.hash());
            if !candidates.is_empty() {
                let mut rng = rand::thread_rng();
                if let Some(entry) = select_weighted(candidates, &mut rng) {
                    let mv = resolve(&mut self.board, entry)?;
                    log::info!("book move: {mv}");
                    return Ok(mv);
                }
            }
        }

        let limits = SearchLimits {
            max_depth: self.config.search_depth,
            max_duration: self.config.search_duration,
        };
        let result = {
            let mut searcher = Searcher::new(&mut self.board, Arc::clone(&self.tt), Arc::clone(&self.stop));
            searcher.iterative_deepening(limits)
        };
        log::info!(
            "search complete: depth {} nodes {} score {}",
            result.depth_reached,
            result.nodes,
            result.score
        );
        let best_move = result.best_move.ok_or_else(|| {
            EngineError::invariant("search returned no move in a non-terminal position")
        });
        *self.last_result.write() = Some(result);
        best_move
    }

    /// Same as [`Self::go`], but runs on a background thread against a
    /// cloned board so the caller's own position is untouched until it
    /// chooses to apply the returned move. [`Self::stop`] cancels it.
    pub fn go_in_background(&mut self) {
        self.stop.store(false, Ordering::Relaxed);
        let mut board_copy = self.board.clone();
        let tt = Arc::clone(&self.tt);
        let stop = Arc::clone(&self.stop);
        let last_result = Arc::clone(&self.last_result);
        let limits = SearchLimits {
            max_depth: self.config.search_depth,
            max_duration: self.config.search_duration,
        };
        self.worker = Some(std::thread::spawn(move || {
            let mut searcher = Searcher::new(&mut board_copy, tt, stop);
            let result = searcher.iterative_deepening(limits);
            *last_result.write() = Some(result);
        }));
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Blocks until a background search started by [`Self::go_in_background`]
    /// finishes, returning its result.
    pub fn wait(&mut self) -> Option<SearchResult> {
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        self.last_result.read().clone()
    }

    #[must_use]
    pub fn last_result(&self) -> Option<SearchResult> {
        self.last_result.read().clone()
    }
}
