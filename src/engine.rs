//! Host-facing engine state.
//!
//! Owns the game board, the optional opening book, and the search
//! lifecycle. Board mutation and search are serialized through one lock,
//! matching the host contract: `search` blocks, `stop_search` may be
//! called from another thread, and `wait_for_search_end` parks until the
//! running search releases the state.

use parking_lot::Mutex;

use crate::board::{Board, Color, FenError, Move, MoveParseError};
use crate::book::BookSelector;
use crate::search::{Search, SearchHook, SearchParams};

/// Coerce a closure reference to `&SearchHook`, inferring the reference's
/// actual (non-`'static`) lifetime instead of the `'static` default a bare
/// `&SearchHook` type annotation would pick.
fn as_search_hook<'a>(
    f: &'a (impl Fn(&crate::search::SearchReport) + Send + Sync + 'a),
) -> &'a (dyn Fn(&crate::search::SearchReport) + Send + Sync + 'a) {
    f
}

/// Game-over classification for the current position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardStatus {
    Playing = 1,
    Checkmate = 2,
    NoMovesStalemate = 3,
    HalfMovesStalemate = 4,
    RepetitionStalemate = 5,
}

struct Inner {
    board: Board,
    book: Option<BookSelector>,
}

/// Engine facade for a host driving one game.
pub struct EngineState {
    inner: Mutex<Inner>,
    search: Search,
}

impl EngineState {
    /// A fresh engine at the starting position with no book attached.
    #[must_use]
    pub fn new() -> Self {
        EngineState {
            inner: Mutex::new(Inner {
                board: Board::new(),
                book: None,
            }),
            search: Search::new(),
        }
    }

    /// Attach a Polyglot book. An unreadable file attaches an empty book.
    pub fn load_book(&self, path: &str) {
        let book = BookSelector::load(path);
        self.inner.lock().book = Some(book);
    }

    /// Replace the position from a FEN string and return the color to
    /// play. On a malformed FEN the position is cleared and the error
    /// returned.
    pub fn set_fen(&self, fen: &str) -> Result<Color, FenError> {
        let mut inner = self.inner.lock();
        match Board::from_fen(fen) {
            Ok(board) => {
                let color = board.side_to_move();
                inner.board = board;
                log::info!("position set: {fen}");
                Ok(color)
            }
            Err(err) => {
                inner.board.clear();
                log::warn!("rejected FEN '{fen}': {err}");
                Err(err)
            }
        }
    }

    /// FEN of the current position.
    #[must_use]
    pub fn fen(&self) -> String {
        self.inner.lock().board.to_fen()
    }

    /// Play a move on the game board.
    pub fn make_move(&self, mv: Move) {
        self.inner.lock().board.make_move(mv);
    }

    /// Parse a long-algebraic move, play it, and return it.
    pub fn make_move_text(&self, text: &str) -> Result<Move, MoveParseError> {
        let mut inner = self.inner.lock();
        let mv = inner.board.parse_move(text)?;
        inner.board.make_move(mv);
        Ok(mv)
    }

    /// Take back the most recent move.
    pub fn undo_move(&self) {
        self.inner.lock().board.undo_move();
    }

    /// Classify the current position.
    #[must_use]
    pub fn board_state(&self) -> BoardStatus {
        let inner = self.inner.lock();
        let board = &inner.board;

        if board.halfmove_clock() >= 50 {
            return BoardStatus::HalfMovesStalemate;
        }
        if board.max_repetitions() >= 3 {
            return BoardStatus::RepetitionStalemate;
        }

        if board.generate_moves().is_empty() {
            return if board.checkers().any() {
                BoardStatus::Checkmate
            } else {
                BoardStatus::NoMovesStalemate
            };
        }

        BoardStatus::Playing
    }

    /// Search the current position and return the best move found, or
    /// `None` when the position is terminal. Blocks until the search ends;
    /// the game board is left untouched.
    #[must_use]
    pub fn search(&self, params: &SearchParams, verbose: bool) -> Option<Move> {
        self.search_with_hook(params, verbose, None)
    }

    /// Like [`EngineState::search`], additionally reporting each completed
    /// depth through `hook`.
    pub fn search_with_hook(
        &self,
        params: &SearchParams,
        verbose: bool,
        hook: Option<&SearchHook>,
    ) -> Option<Move> {
        let inner = self.inner.lock();

        let best: Mutex<Option<Move>> = Mutex::new(None);
        let capture_hook = |report: &crate::search::SearchReport| {
            if let Some(&mv) = report.pv.first() {
                *best.lock() = Some(mv);
            }
            if let Some(hook) = hook {
                hook(report);
            }
        };

        self.search.start_search(
            &inner.board,
            params,
            inner.book.as_ref(),
            verbose,
            Some(as_search_hook(&capture_hook)),
        );

        let chosen = *best.lock();
        chosen
    }

    /// Cancel a search running on another thread.
    pub fn stop_search(&self) {
        self.search.stop();
    }

    /// Block until no search is running.
    pub fn wait_for_search_end(&self) {
        drop(self.inner.lock());
    }

    /// Run the perft self-test suite; logs each result and returns whether
    /// every count matched.
    #[must_use]
    pub fn health_check(&self) -> bool {
        const CHECKS: &[(&str, usize, u64)] = &[
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 1, 20),
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 2, 400),
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 3, 8_902),
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 4, 197_281),
            ("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -", 1, 48),
            ("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -", 2, 2_039),
            ("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -", 3, 97_862),
            ("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -", 4, 4_085_603),
            ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -", 1, 14),
            ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -", 2, 191),
            ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -", 3, 2_812),
            ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -", 4, 43_238),
            ("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1", 1, 6),
            ("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1", 2, 264),
            ("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1", 3, 9_467),
            ("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1", 4, 422_333),
        ];

        let mut all_ok = true;
        for &(fen, depth, expected) in CHECKS {
            let Ok(mut board) = Board::from_fen(fen) else {
                log::warn!("health check could not parse {fen}");
                all_ok = false;
                continue;
            };
            let nodes = board.perft(depth);
            if nodes == expected {
                log::info!("perft {fen} depth {depth}: {nodes} ok");
            } else {
                log::warn!("perft {fen} depth {depth}: expected {expected}, got {nodes}");
                all_ok = false;
            }
        }
        all_ok
    }
}

impl Default for EngineState {
    fn default() -> Self {
        EngineState::new()
    }
}
