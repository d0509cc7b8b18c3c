//! Piece-square tables and the incremental piece-square score.
//!
//! Tables are written in visual board order (top row = rank 8). A White
//! piece indexes its square mirrored vertically; a Black piece additionally
//! mirrors the file, so both colors read the same tables from their own
//! perspective. The king has separate early-game and end-game tables; every
//! other piece shares one table across phases.

use super::types::{Color, Piece, Square};

#[rustfmt::skip]
const PAWN_VALUES: [i32; 64] = [
     0,  0,   0,   0,   0,   0,  0,  0,
    50, 50,  50,  50,  50,  50, 50, 50,
    10, 10,  20,  30,  30,  20, 10, 10,
     5,  5,  10,  27,  27,  10,  5,  5,
     0,  0,   0,  25,  25,   0,  0,  0,
     5, -5, -10,   0,   0, -10, -5,  5,
     5, 10,  10, -25, -25,  10, 10,  5,
     0,  0,   0,   0,   0,   0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_VALUES: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -50, -40, -20, -30, -30, -20, -40, -50,
];

#[rustfmt::skip]
const BISHOP_VALUES: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -20, -10, -40, -10, -10, -40, -10, -20,
];

#[rustfmt::skip]
const ROOK_VALUES: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_VALUES: [i32; 64] = [
    -20, -10, -10, -5, -5, -10, -10, -20,
    -10,   0,   5,  0,  0,   0,   0, -10,
    -10,   0,   0,  0,  0,   0,   0, -10,
    -10,   0,   5,  5,  5,   5,   0, -10,
    -10,   5,   5,  5,  5,   5,   0, -10,
      0,   0,   5,  5,  5,   5,   0,  -5,
     -5,   0,   5,  5,  5,   5,   0,  -5,
    -20, -10, -10, -5, -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_VALUES_EARLY: [i32; 64] = [
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -10, -20, -20, -20, -20, -20, -20, -10,
     20,  20,   0,   0,   0,   0,  20,  20,
     20,  30,  10,   0,   0,  10,  30,  20,
];

#[rustfmt::skip]
const KING_VALUES_END: [i32; 64] = [
    -50, -40, -30, -20, -20, -30, -40, -50,
    -30, -20, -10,   0,   0, -10, -20, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -30,   0,   0,   0,   0, -30, -30,
    -50, -30, -30, -30, -30, -30, -30, -50,
];

/// Table index for a piece of `color` on `sq`.
#[inline]
const fn pst_index(color: Color, sq: Square) -> usize {
    match color {
        Color::White => sq.as_index() ^ 56,
        Color::Black => sq.as_index() ^ 7,
    }
}

/// Incrementally-maintained piece-square score, per color and game phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct PsqScore {
    early: [i32; 2],
    end: [i32; 2],
}

impl PsqScore {
    pub(crate) fn feed_set(&mut self, sq: Square, color: Color, piece: Piece) {
        self.feed(sq, color, piece, 1);
    }

    pub(crate) fn feed_remove(&mut self, sq: Square, color: Color, piece: Piece) {
        self.feed(sq, color, piece, -1);
    }

    fn feed(&mut self, sq: Square, color: Color, piece: Piece, sign: i32) {
        let index = pst_index(color, sq);
        let (early, end) = match piece {
            Piece::Pawn => (PAWN_VALUES[index], PAWN_VALUES[index]),
            Piece::Knight => (KNIGHT_VALUES[index], KNIGHT_VALUES[index]),
            Piece::Bishop => (BISHOP_VALUES[index], BISHOP_VALUES[index]),
            Piece::Rook => (ROOK_VALUES[index], ROOK_VALUES[index]),
            Piece::Queen => (QUEEN_VALUES[index], QUEEN_VALUES[index]),
            Piece::King => (KING_VALUES_EARLY[index], KING_VALUES_END[index]),
        };
        self.early[color.index()] += early * sign;
        self.end[color.index()] += end * sign;
    }

    /// The accumulated score for one color, selected by game phase.
    #[inline]
    pub(crate) fn score(&self, color: Color, end_game: bool) -> i32 {
        if end_game {
            self.end[color.index()]
        } else {
            self.early[color.index()]
        }
    }
}
