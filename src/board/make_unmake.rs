//! Piece placement and move make/undo.

use super::state::UndoFrame;
use super::types::{
    castle_king_end, castle_rook_end, castle_rook_start, CastleSide, CastlingRights, Color, Move,
    MoveKind, Piece, Square,
};
use super::Board;
use crate::zobrist::ZOBRIST;

/// The square of the pawn captured by an en passant move.
#[inline]
pub(crate) fn ep_captured_square(mv: Move) -> Square {
    // The captured pawn sits one rank behind the landing square, on the
    // mover's side
    let dr = mv.to().rank() as i32 - mv.from().rank() as i32;
    Square::new((mv.to().rank() as i32 - dr) as usize, mv.to().file())
}

impl Board {
    /// Remove and return the piece on `sq`, updating bitboards, counts,
    /// hash, and the incremental piece-square score.
    pub(crate) fn take_piece(&mut self, sq: Square) -> Option<(Color, Piece)> {
        let (color, piece) = self.mailbox[sq.as_index()]?;

        self.psq.feed_remove(sq, color, piece);
        self.hash ^= ZOBRIST.piece_key(color, piece, sq);

        self.mailbox[sq.as_index()] = None;
        self.piece_counts[color.index()][piece.index()] -= 1;

        self.pieces[color.index()][piece.index()].reset(sq);
        self.occupied[color.index()].reset(sq);
        self.all_occupied.reset(sq);

        Some((color, piece))
    }

    /// Place a piece on an empty square, updating bitboards, counts, hash,
    /// and the incremental piece-square score.
    pub(crate) fn put_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        debug_assert!(self.mailbox[sq.as_index()].is_none(), "square occupied");

        self.pieces[color.index()][piece.index()].set(sq);
        self.occupied[color.index()].set(sq);
        self.all_occupied.set(sq);

        self.mailbox[sq.as_index()] = Some((color, piece));
        self.piece_counts[color.index()][piece.index()] += 1;

        self.psq.feed_set(sq, color, piece);
        self.hash ^= ZOBRIST.piece_key(color, piece, sq);
    }

    /// Place a piece, first removing whatever occupies the square.
    pub(crate) fn set_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        self.take_piece(sq);
        self.put_piece(sq, color, piece);
    }

    #[inline]
    fn flip_side(&mut self) {
        self.hash ^= ZOBRIST.black_to_move_key;
        self.side_to_move = self.side_to_move.opponent();
    }

    pub(crate) fn set_castling_rights(&mut self, rights: CastlingRights) {
        self.hash ^= ZOBRIST.castling_delta(self.castling_rights, rights);
        self.castling_rights = rights;
    }

    pub(crate) fn set_ep_file(&mut self, file: Option<u8>) {
        if let Some(old) = self.ep_file {
            self.hash ^= ZOBRIST.en_passant_key(old);
        }
        self.ep_file = file;
        if let Some(new) = self.ep_file {
            self.hash ^= ZOBRIST.en_passant_key(new);
        }
    }

    fn update_castling_rights(
        &mut self,
        mv: Move,
        mover: (Color, Piece),
        captured: Option<(Color, Piece)>,
    ) {
        let mut rights = self.castling_rights;

        if let Some((cap_color, _)) = captured {
            if mv.to() == castle_rook_start(cap_color, CastleSide::Short) {
                rights.disallow(cap_color, CastleSide::Short);
            } else if mv.to() == castle_rook_start(cap_color, CastleSide::Long) {
                rights.disallow(cap_color, CastleSide::Long);
            }
        }

        let (color, piece) = mover;
        match piece {
            Piece::King => {
                rights.disallow(color, CastleSide::Short);
                rights.disallow(color, CastleSide::Long);
            }
            Piece::Rook => {
                if mv.from() == castle_rook_start(color, CastleSide::Short) {
                    rights.disallow(color, CastleSide::Short);
                } else if mv.from() == castle_rook_start(color, CastleSide::Long) {
                    rights.disallow(color, CastleSide::Long);
                }
            }
            _ => {}
        }

        self.set_castling_rights(rights);
    }

    /// Play a move. The move must be legal in the current position.
    pub fn make_move(&mut self, mv: Move) {
        let taken = self.take_piece(mv.from());
        debug_assert!(taken.is_some(), "no piece on {}", mv.from());
        let Some((us, mut piece)) = taken else {
            return;
        };

        self.flip_side();

        let undo_castling = self.castling_rights;
        let undo_halfmove = self.halfmove_clock;
        let undo_ep = self.ep_file;
        let undo_checkers = self.checkers;
        self.halfmove_clock += 1;

        if piece == Piece::Pawn {
            self.halfmove_clock = 0;
        }

        let mut captured: Option<(Color, Piece)> = None;
        let mut new_ep_file: Option<u8> = None;
        let kind = mv.kind();

        match kind {
            MoveKind::Quiet | MoveKind::Capture => {}
            MoveKind::DoublePawn => {
                // Record the EP file only when an enemy pawn could actually
                // capture en passant
                let file = mv.to().file();
                let rank = mv.to().rank();
                let enemy_pawn = Some((us.opponent(), Piece::Pawn));
                let adjacent = (file > 0 && self.piece_at(Square::new(rank, file - 1)) == enemy_pawn)
                    || (file < 7 && self.piece_at(Square::new(rank, file + 1)) == enemy_pawn);
                if adjacent {
                    new_ep_file = Some(file as u8);
                }
            }
            MoveKind::CastleShort | MoveKind::CastleLong => {
                let side = if kind == MoveKind::CastleShort {
                    CastleSide::Short
                } else {
                    CastleSide::Long
                };
                if let Some((rook_color, rook)) = self.take_piece(castle_rook_start(us, side)) {
                    self.put_piece(castle_rook_end(us, side), rook_color, rook);
                }
                self.put_piece(castle_king_end(us, side), us, piece);
            }
            MoveKind::PromoBishop | MoveKind::CapturePromoBishop => piece = Piece::Bishop,
            MoveKind::PromoRook | MoveKind::CapturePromoRook => piece = Piece::Rook,
            MoveKind::PromoKnight | MoveKind::CapturePromoKnight => piece = Piece::Knight,
            MoveKind::PromoQueen | MoveKind::CapturePromoQueen => piece = Piece::Queen,
            MoveKind::EnPassant => {
                captured = self.take_piece(ep_captured_square(mv));
            }
        }

        if kind == MoveKind::Capture || (mv.is_capture() && mv.is_promotion()) {
            captured = self.take_piece(mv.to());
            self.halfmove_clock = 0;
        }

        if !mv.is_castle() {
            self.put_piece(mv.to(), us, piece);
        }

        if mv.is_capture() || mv.is_promotion() {
            self.recalculate_end_game_weight();
        }

        self.update_castling_rights(mv, (us, piece), captured);

        if us == Color::Black {
            self.fullmove_number += 1;
        }

        debug_assert!(!matches!(captured, Some((_, Piece::King))), "king captured");

        self.set_ep_file(new_ep_file);
        self.update_checkers();

        let count = self.repetitions.increment(self.hash);
        let undo_max = self.max_repetitions;
        self.max_repetitions = self.max_repetitions.max(count);

        self.history.push(UndoFrame {
            mv,
            captured,
            ep_file: undo_ep,
            halfmove_clock: undo_halfmove,
            castling_rights: undo_castling,
            checkers: undo_checkers,
            max_repetitions: undo_max,
        });
    }

    /// Reverse the most recent move. Does nothing when no history exists.
    pub fn undo_move(&mut self) {
        let Some(frame) = self.history.pop() else {
            debug_assert!(false, "undo_move with empty history");
            return;
        };

        self.repetitions.decrement(self.hash);
        self.max_repetitions = frame.max_repetitions;

        self.flip_side();
        self.set_ep_file(frame.ep_file);
        self.set_castling_rights(frame.castling_rights);
        self.checkers = frame.checkers;
        self.halfmove_clock = frame.halfmove_clock;

        let mv = frame.mv;
        let kind = mv.kind();
        let us = self.side_to_move;

        let moved = match kind {
            MoveKind::CastleShort => self.take_piece(castle_king_end(us, CastleSide::Short)),
            MoveKind::CastleLong => self.take_piece(castle_king_end(us, CastleSide::Long)),
            _ => self.take_piece(mv.to()),
        };
        debug_assert!(moved.is_some(), "undo with no piece to restore");
        let Some((color, mut piece)) = moved else {
            return;
        };

        if color == Color::Black {
            self.fullmove_number -= 1;
        }

        match kind {
            MoveKind::CastleShort | MoveKind::CastleLong => {
                let side = if kind == MoveKind::CastleShort {
                    CastleSide::Short
                } else {
                    CastleSide::Long
                };
                if let Some((rook_color, rook)) = self.take_piece(castle_rook_end(us, side)) {
                    self.put_piece(castle_rook_start(us, side), rook_color, rook);
                }
            }
            MoveKind::EnPassant => {
                if let Some((cap_color, cap_piece)) = frame.captured {
                    self.put_piece(ep_captured_square(mv), cap_color, cap_piece);
                }
            }
            _ if mv.is_promotion() => piece = Piece::Pawn,
            _ => {}
        }

        if kind == MoveKind::Capture || (mv.is_capture() && mv.is_promotion()) {
            if let Some((cap_color, cap_piece)) = frame.captured {
                self.put_piece(mv.to(), cap_color, cap_piece);
            }
        }

        if mv.is_capture() || mv.is_promotion() {
            self.recalculate_end_game_weight();
        }

        self.put_piece(mv.from(), color, piece);
    }

    /// Does this pseudo-legal move leave the mover's king safe?
    ///
    /// Makes the move on the raw piece level, tests the king, and restores.
    /// Castling moves are generated fully legal and accepted as-is. Also
    /// rejects moves that are structurally impossible in this position
    /// (wrong mover, missing piece), which re-verifies transposition-table
    /// moves against hash collisions.
    #[must_use]
    pub fn is_legal(&mut self, mv: Move) -> bool {
        if mv.is_empty() {
            return false;
        }
        if mv.is_castle() {
            return true;
        }

        let us = self.side_to_move;
        match self.piece_at(mv.from()) {
            Some((color, _)) if color == us => {}
            _ => return false,
        }
        if matches!(self.piece_at(mv.to()), Some((color, _)) if color == us) {
            return false;
        }

        let capture_sq = if mv.kind() == MoveKind::EnPassant {
            ep_captured_square(mv)
        } else {
            mv.to()
        };

        let mover = self.take_piece(mv.from());
        let captured = self.take_piece(capture_sq);
        let Some((color, piece)) = mover else {
            return false;
        };
        self.put_piece(mv.to(), color, piece);

        let legal = !self.is_attacked(self.king_square(us));

        self.take_piece(mv.to());
        self.put_piece(mv.from(), color, piece);
        if let Some((cap_color, cap_piece)) = captured {
            self.put_piece(capture_sq, cap_color, cap_piece);
        }

        legal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Bitboard;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn snapshot(board: &Board) -> (u64, Bitboard, u32, u32, CastlingRights, Option<u8>) {
        (
            board.hash(),
            board.checkers(),
            board.halfmove_clock(),
            board.fullmove_number(),
            board.castling_rights(),
            board.ep_file,
        )
    }

    #[test]
    fn test_make_undo_restores_quiet_move() {
        let mut board = Board::new();
        let before = snapshot(&board);
        let mailbox_before = board.mailbox;

        board.make_move(Move::quiet(sq("g1"), sq("f3")));
        assert_eq!(board.side_to_move(), Color::Black);
        board.undo_move();

        assert_eq!(snapshot(&board), before);
        assert_eq!(board.mailbox, mailbox_before);
        assert_eq!(board.hash(), board.calculate_hash());
    }

    #[test]
    fn test_double_pawn_sets_ep_only_with_adjacent_enemy_pawn() {
        let mut board = Board::new();
        board.make_move(Move::double_pawn(sq("e2"), sq("e4")));
        // No black pawn adjacent to e4
        assert_eq!(board.ep_file, None);
        board.make_move(Move::double_pawn(sq("d7"), sq("d5")));
        board.make_move(Move::double_pawn(sq("f2"), sq("f4")));
        board.make_move(Move::quiet(sq("d5"), sq("d4")));
        // c2-c4 passes the black pawn on d4
        board.make_move(Move::double_pawn(sq("c2"), sq("c4")));
        assert_eq!(board.ep_file, Some(2));
        assert_eq!(board.ep_square(), Some(sq("c3")));
    }

    #[test]
    fn test_en_passant_capture_and_undo() {
        let mut board = Board::new();
        board.make_move(Move::double_pawn(sq("e2"), sq("e4")));
        board.make_move(Move::quiet(sq("a7"), sq("a6")));
        board.make_move(Move::quiet(sq("e4"), sq("e5")));
        board.make_move(Move::double_pawn(sq("d7"), sq("d5")));
        assert_eq!(board.ep_square(), Some(sq("d6")));

        let hash_before = board.hash();
        board.make_move(Move::en_passant(sq("e5"), sq("d6")));
        assert_eq!(board.piece_at(sq("d5")), None);
        assert_eq!(board.piece_at(sq("d6")), Some((Color::White, Piece::Pawn)));
        board.undo_move();
        assert_eq!(board.hash(), hash_before);
        assert_eq!(board.piece_at(sq("d5")), Some((Color::Black, Piece::Pawn)));
        assert_eq!(board.piece_at(sq("e5")), Some((Color::White, Piece::Pawn)));
    }

    #[test]
    fn test_castling_moves_rook_and_king() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        board.make_move(Move::castle_short(sq("e1"), sq("h1")));
        assert_eq!(board.piece_at(sq("g1")), Some((Color::White, Piece::King)));
        assert_eq!(board.piece_at(sq("f1")), Some((Color::White, Piece::Rook)));
        assert_eq!(board.piece_at(sq("e1")), None);
        assert_eq!(board.piece_at(sq("h1")), None);
        assert!(!board
            .castling_rights()
            .can_castle(Color::White, CastleSide::Short));
        assert!(!board
            .castling_rights()
            .can_castle(Color::White, CastleSide::Long));

        board.undo_move();
        assert_eq!(board.piece_at(sq("e1")), Some((Color::White, Piece::King)));
        assert_eq!(board.piece_at(sq("h1")), Some((Color::White, Piece::Rook)));
        assert!(board
            .castling_rights()
            .can_castle(Color::White, CastleSide::Short));
        assert_eq!(board.hash(), board.calculate_hash());
    }

    #[test]
    fn test_promotion_replaces_pawn_and_undo_demotes() {
        let mut board = Board::from_fen("8/P6k/8/8/8/8/7K/8 w - - 0 1").unwrap();
        let weight_before = board.end_game_weight();
        board.make_move(Move::promotion(sq("a7"), sq("a8"), Piece::Queen, false));
        assert_eq!(board.piece_at(sq("a8")), Some((Color::White, Piece::Queen)));
        assert_eq!(board.piece_count(Color::White, Piece::Pawn), 0);
        assert!(board.end_game_weight() < weight_before);

        board.undo_move();
        assert_eq!(board.piece_at(sq("a7")), Some((Color::White, Piece::Pawn)));
        assert_eq!(board.piece_count(Color::White, Piece::Queen), 0);
        assert_eq!(board.end_game_weight(), weight_before);
        assert_eq!(board.hash(), board.calculate_hash());
    }

    #[test]
    fn test_rook_capture_revokes_enemy_castling() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        board.make_move(Move::capture(sq("a1"), sq("a8")));
        assert!(!board
            .castling_rights()
            .can_castle(Color::Black, CastleSide::Long));
        assert!(board
            .castling_rights()
            .can_castle(Color::Black, CastleSide::Short));
        // Moving the a1 rook also revoked White's long castle
        assert!(!board
            .castling_rights()
            .can_castle(Color::White, CastleSide::Long));
    }

    #[test]
    fn test_is_legal_rejects_pinned_piece_move() {
        // The d7 knight is pinned against the king by the d1 rook
        let mut board = Board::from_fen("3k4/3n4/8/8/8/8/8/3RK3 b - - 0 1").unwrap();
        assert!(!board.is_legal(Move::quiet(sq("d7"), sq("f6"))));
        assert!(board.is_legal(Move::quiet(sq("d8"), sq("c8"))));
        let hash = board.hash();
        let _ = board.is_legal(Move::quiet(sq("d7"), sq("f6")));
        assert_eq!(board.hash(), hash);
    }

    #[test]
    fn test_is_legal_rejects_structurally_bad_moves() {
        let mut board = Board::new();
        // Empty start square
        assert!(!board.is_legal(Move::quiet(sq("e4"), sq("e5"))));
        // Enemy piece on the start square
        assert!(!board.is_legal(Move::quiet(sq("e7"), sq("e5"))));
        // Own piece on the destination
        assert!(!board.is_legal(Move::quiet(sq("d1"), sq("d2"))));
        assert!(!board.is_legal(Move::EMPTY));
    }

    #[test]
    fn test_repetition_tracking_across_make_undo() {
        let mut board = Board::new();
        assert_eq!(board.max_repetitions(), 1);

        for _ in 0..2 {
            board.make_move(Move::quiet(sq("g1"), sq("f3")));
            board.make_move(Move::quiet(sq("g8"), sq("f6")));
            board.make_move(Move::quiet(sq("f3"), sq("g1")));
            board.make_move(Move::quiet(sq("f6"), sq("g8")));
        }
        assert_eq!(board.max_repetitions(), 3);

        for _ in 0..8 {
            board.undo_move();
        }
        assert_eq!(board.max_repetitions(), 1);
        assert_eq!(board.hash(), board.calculate_hash());
    }
}
