//! Gambit: a bitboard chess engine.
//!
//! Magic-bitboard move generation, a lazy-SMP principal-variation search
//! with quiescence extension and a shared transposition table, incremental
//! evaluation, and Polyglot opening-book support.
//!
//! The typical entry point is [`engine::EngineState`]; the underlying
//! pieces ([`board::Board`], [`search::Search`], [`book::BookSelector`],
//! [`tt::TranspositionTable`]) are usable on their own.

pub mod board;
pub mod book;
pub mod engine;
pub mod search;
pub mod tt;

pub(crate) mod ordering;
pub(crate) mod zobrist;

pub use board::{Board, Color, Move, MoveKind, MoveList, Piece, Square};
pub use engine::{BoardStatus, EngineState};
pub use search::{Search, SearchParams, SearchReport};
