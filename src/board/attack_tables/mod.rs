//! Precomputed attack tables.
//!
//! Leaper moves (pawn, knight, king), pawn pushes, in-between rays, and the
//! magic-bitboard slider tables are built once at startup and shared
//! process-wide through an immutable singleton.

mod magic;

use once_cell::sync::Lazy;

use super::types::{Bitboard, Color, Square};
use magic::SliderTables;

pub(crate) struct AttackTables {
    pawn_pushes: [[Bitboard; 64]; 2],
    pawn_attacks: [[Bitboard; 64]; 2],
    knight_moves: [Bitboard; 64],
    king_moves: [Bitboard; 64],
    in_between: Box<[[Bitboard; 64]; 64]>,
    sliders: SliderTables,
}

static TABLES: Lazy<AttackTables> = Lazy::new(AttackTables::build);

/// The process-wide attack tables.
#[inline]
pub(crate) fn tables() -> &'static AttackTables {
    &TABLES
}

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (2, -1),
    (2, 1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

const ALL_DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

impl AttackTables {
    fn build() -> Self {
        let mut pawn_pushes = [[Bitboard::EMPTY; 64]; 2];
        let mut pawn_attacks = [[Bitboard::EMPTY; 64]; 2];
        let mut knight_moves = [Bitboard::EMPTY; 64];
        let mut king_moves = [Bitboard::EMPTY; 64];
        let mut in_between = Box::new([[Bitboard::EMPTY; 64]; 64]);

        for idx in 0..64 {
            let sq = Square::from_index(idx);

            for color in [Color::White, Color::Black] {
                let dr = if color.is_white() { 1 } else { -1 };
                let home_rank = if color.is_white() { 1 } else { 6 };

                if let Some(push) = sq.offset_by(0, dr) {
                    pawn_pushes[color.index()][idx].set(push);
                    if sq.rank() == home_rank {
                        if let Some(double) = push.offset_by(0, dr) {
                            pawn_pushes[color.index()][idx].set(double);
                        }
                    }
                }
                for df in [-1, 1] {
                    if let Some(target) = sq.offset_by(df, dr) {
                        pawn_attacks[color.index()][idx].set(target);
                    }
                }
            }

            for (df, dr) in KNIGHT_OFFSETS {
                if let Some(target) = sq.offset_by(df, dr) {
                    knight_moves[idx].set(target);
                }
            }

            for (df, dr) in ALL_DIRECTIONS {
                if let Some(target) = sq.offset_by(df, dr) {
                    king_moves[idx].set(target);
                }
            }
        }

        // in_between[a][b]: squares strictly between a and b when they share
        // a rank, file, or diagonal; empty otherwise
        for from in 0..64 {
            let from_sq = Square::from_index(from);
            for (df, dr) in ALL_DIRECTIONS {
                let mut ray = Bitboard::EMPTY;
                let mut current = from_sq;
                while let Some(next) = current.offset_by(df, dr) {
                    in_between[from][next.as_index()] = ray;
                    ray.set(next);
                    current = next;
                }
            }
        }

        AttackTables {
            pawn_pushes,
            pawn_attacks,
            knight_moves,
            king_moves,
            in_between,
            sliders: SliderTables::build(),
        }
    }

    /// Single and double push targets for a pawn of `color` on `sq`
    #[inline]
    pub(crate) fn pawn_pushes(&self, color: Color, sq: Square) -> Bitboard {
        self.pawn_pushes[color.index()][sq.as_index()]
    }

    /// Capture targets for a pawn of `color` on `sq`
    #[inline]
    pub(crate) fn pawn_attacks(&self, color: Color, sq: Square) -> Bitboard {
        self.pawn_attacks[color.index()][sq.as_index()]
    }

    #[inline]
    pub(crate) fn knight_moves(&self, sq: Square) -> Bitboard {
        self.knight_moves[sq.as_index()]
    }

    #[inline]
    pub(crate) fn king_moves(&self, sq: Square) -> Bitboard {
        self.king_moves[sq.as_index()]
    }

    /// Squares strictly between two aligned squares; empty when not aligned
    #[inline]
    pub(crate) fn between(&self, from: Square, to: Square) -> Bitboard {
        self.in_between[from.as_index()][to.as_index()]
    }

    #[inline]
    pub(crate) fn bishop_attacks(&self, sq: Square, occupancy: Bitboard) -> Bitboard {
        Bitboard(self.sliders.bishop_attacks(sq, occupancy.0))
    }

    #[inline]
    pub(crate) fn rook_attacks(&self, sq: Square, occupancy: Bitboard) -> Bitboard {
        Bitboard(self.sliders.rook_attacks(sq, occupancy.0))
    }

    #[inline]
    pub(crate) fn queen_attacks(&self, sq: Square, occupancy: Bitboard) -> Bitboard {
        self.bishop_attacks(sq, occupancy) | self.rook_attacks(sq, occupancy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_pawn_tables() {
        let t = tables();
        // e2 pushes to e3 and e4, attacks d3 and f3
        let pushes = t.pawn_pushes(Color::White, sq("e2"));
        assert!(pushes.contains(sq("e3")) && pushes.contains(sq("e4")));
        assert_eq!(pushes.popcount(), 2);
        let attacks = t.pawn_attacks(Color::White, sq("e2"));
        assert!(attacks.contains(sq("d3")) && attacks.contains(sq("f3")));

        // Black pawn on e7 pushes down the board
        let pushes = t.pawn_pushes(Color::Black, sq("e7"));
        assert!(pushes.contains(sq("e6")) && pushes.contains(sq("e5")));

        // Edge pawn attacks a single file
        assert_eq!(t.pawn_attacks(Color::White, sq("a2")).popcount(), 1);
        // Non-home-rank pawn has a single push
        assert_eq!(t.pawn_pushes(Color::White, sq("e3")).popcount(), 1);
    }

    #[test]
    fn test_knight_and_king_tables() {
        let t = tables();
        assert_eq!(t.knight_moves(sq("d4")).popcount(), 8);
        assert_eq!(t.knight_moves(sq("a1")).popcount(), 2);
        assert_eq!(t.king_moves(sq("e4")).popcount(), 8);
        assert_eq!(t.king_moves(sq("a1")).popcount(), 3);
    }

    #[test]
    fn test_in_between() {
        let t = tables();
        let between = t.between(sq("a1"), sq("h8"));
        assert_eq!(between.popcount(), 6);
        assert!(between.contains(sq("d4")));
        assert!(!between.contains(sq("a1")) && !between.contains(sq("h8")));

        assert_eq!(t.between(sq("e1"), sq("e8")).popcount(), 6);
        assert_eq!(t.between(sq("e4"), sq("e5")), Bitboard::EMPTY);
        // Unaligned squares have no in-between ray
        assert_eq!(t.between(sq("a1"), sq("b3")), Bitboard::EMPTY);
    }

    #[test]
    fn test_slider_attacks_with_blockers() {
        let t = tables();
        let blockers = Bitboard::from_square(sq("e6")) | Bitboard::from_square(sq("c4"));
        let attacks = t.rook_attacks(sq("e4"), blockers);
        assert!(attacks.contains(sq("e6"))); // can capture the blocker
        assert!(!attacks.contains(sq("e7"))); // cannot pass it
        assert!(attacks.contains(sq("c4")));
        assert!(!attacks.contains(sq("b4")));
        assert!(attacks.contains(sq("h4")));

        let blockers = Bitboard::from_square(sq("g6"));
        let attacks = t.bishop_attacks(sq("e4"), blockers);
        assert!(attacks.contains(sq("g6")));
        assert!(!attacks.contains(sq("h7")));
        assert!(attacks.contains(sq("a8")));
    }
}
