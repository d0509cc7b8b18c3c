//! Zobrist hashing for chess positions.
//!
//! Provides incrementally-updatable 64-bit position hashes for the
//! transposition table and repetition detection.

use once_cell::sync::Lazy;
use rand::prelude::*;

use crate::board::{CastlingRights, Color, Piece, Square};

pub(crate) struct ZobristKeys {
    // piece_keys[piece_type][color][square_index]
    pub(crate) piece_keys: [[[u64; 64]; 2]; 6],
    pub(crate) black_to_move_key: u64,
    // One key per castling-right bit (WK, WQ, BK, BQ)
    pub(crate) castling_keys: [u64; 4],
    // en_passant_keys[file_index] (only the file matters for EP)
    pub(crate) en_passant_keys: [u64; 8],
}

impl ZobristKeys {
    fn new() -> Self {
        // Fixed seed so hashes are stable across runs
        let mut rng = StdRng::seed_from_u64(0x00C0_FFEE_D00D_2A2A);
        let mut piece_keys = [[[0; 64]; 2]; 6];
        let mut castling_keys = [0; 4];
        let mut en_passant_keys = [0; 8];

        for piece in &mut piece_keys {
            for color in piece.iter_mut() {
                for key in color.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let black_to_move_key = rng.gen();

        for key in &mut castling_keys {
            *key = rng.gen();
        }

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

    #[inline]
    pub(crate) fn piece_key(&self, color: Color, piece: Piece, sq: Square) -> u64 {
        self.piece_keys[piece.index()][color.index()][sq.as_index()]
    }

    /// XOR delta between two castling-rights masks.
    #[inline]
    pub(crate) fn castling_delta(&self, old: CastlingRights, new: CastlingRights) -> u64 {
        let mut delta = 0;
        let changed = old.as_u8() ^ new.as_u8();
        for (bit, key) in self.castling_keys.iter().enumerate() {
            if changed & (1 << bit) != 0 {
                delta ^= key;
            }
        }
        delta
    }

    #[inline]
    pub(crate) fn en_passant_key(&self, file: u8) -> u64 {
        self.en_passant_keys[file as usize]
    }
}

pub(crate) static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);
