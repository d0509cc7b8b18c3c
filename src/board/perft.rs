//! Perft: exact move-tree leaf counts, the correctness oracle for the
//! generator and make/undo.

use super::types::Move;
use super::Board;

impl Board {
    /// Count the leaves of the legal move tree at `depth`.
    #[must_use]
    pub fn perft(&mut self, depth: usize) -> u64 {
        if depth == 0 {
            return 1;
        }

        let moves = self.generate_moves();
        if depth == 1 {
            return moves.len() as u64;
        }

        let mut nodes = 0;
        for &mv in &moves {
            self.make_move(mv);
            nodes += self.perft(depth - 1);
            self.undo_move();
        }
        nodes
    }

    /// Per-root-move subtree counts, for narrowing down generator bugs.
    #[must_use]
    pub fn perft_divide(&mut self, depth: usize) -> Vec<(Move, u64)> {
        let moves = self.generate_moves();
        let mut divide = Vec::with_capacity(moves.len());
        for &mv in &moves {
            if depth <= 1 {
                divide.push((mv, 1));
                continue;
            }
            self.make_move(mv);
            divide.push((mv, self.perft(depth - 1)));
            self.undo_move();
        }
        divide
    }
}
