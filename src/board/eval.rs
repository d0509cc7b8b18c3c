//! Static evaluation.
//!
//! Material plus per-piece positional tweaks, pinned-piece penalties, the
//! incremental piece-square score, and a bishop-pair bonus. The score is
//! built from White's point of view, flipped to the side to move, and a
//! check bonus is added after the flip.

use super::types::{Bitboard, Color, Piece, Square};
use super::Board;

/// Base piece values in centipawns, Pawn..King.
const PIECE_SCORES: [i32; 6] = [100, 290, 310, 515, 900, 2000];

/// Passed-pawn bonus indexed by ranks advanced from the home rank.
const PAWN_PASSED_SCORES: [i32; 8] = [0, 5, 10, 20, 40, 80, 160, 0];

/// Penalty per pinned piece, Pawn..King (kings cannot be pinned).
const PIECE_PINNED_SCORES: [i32; 6] = [10, 25, 25, 35, 100, 0];

const PAWN_ISOLATED_SCORE: i32 = -20;
const ROOK_ON_OPEN_FILE_SCORE: i32 = 30;
const ROOK_ON_SEMI_OPEN_FILE_SCORE: i32 = 13;
const CHECK_SCORE: i32 = 10;
const DOUBLE_CHECK_SCORE: i32 = 50;
const BISHOP_PAIR_SCORE: i32 = 20;
const BISHOP_PAIR_END_GAME_SCORE: i32 = 70;

/// Evaluate the position in centipawns, relative to the side to move.
#[must_use]
pub fn evaluate(board: &Board) -> i32 {
    let pawn_count = board.pieces_by_type(Piece::Pawn).popcount() as i32;

    let mut score = 0;
    for sq in board.occupancy() {
        let Some((color, piece)) = board.piece_at(sq) else {
            continue;
        };
        let piece_score = PIECE_SCORES[piece.index()] + piece_tweak(board, sq, color, piece, pawn_count);
        score += if color.is_white() {
            piece_score
        } else {
            -piece_score
        };
    }

    score += pinned_pieces(board);
    score += piece_squares(board);
    score += bishop_pairs(board);

    if board.side_to_move() == Color::Black {
        score = -score;
    }

    // Post-flip, so checks always count for the side that delivered them
    score + check_bonus(board)
}

/// Positional adjustment for one piece on top of its material value.
fn piece_tweak(board: &Board, sq: Square, color: Color, piece: Piece, pawn_count: i32) -> i32 {
    match piece {
        Piece::Pawn => pawn_tweak(board, sq, color),
        // Knights gain with pawns on the board, bishops with open positions
        Piece::Knight => (pawn_count - 10) * 6,
        Piece::Bishop => (10 - pawn_count) * 6,
        Piece::Rook => rook_tweak(board, sq, color),
        _ => 0,
    }
}

fn pawn_tweak(board: &Board, sq: Square, color: Color) -> i32 {
    let mut tweak = 0;

    let ally_pawns = board.colored_pieces(color, Piece::Pawn);
    let enemy_pawns = board.colored_pieces(color.opponent(), Piece::Pawn);

    let file = sq.file();
    let pawn_file = Bitboard::file_mask(file);
    let left_file = if file > 0 {
        Bitboard::file_mask(file - 1)
    } else {
        Bitboard::EMPTY
    };
    let right_file = if file < 7 {
        Bitboard::file_mask(file + 1)
    } else {
        Bitboard::EMPTY
    };

    if !(left_file | right_file).intersects(ally_pawns) {
        tweak += PAWN_ISOLATED_SCORE;
    }

    // Passed: no enemy pawn ahead on this or an adjacent file
    let ahead = if color.is_white() {
        Bitboard(u64::MAX.checked_shl(8 * (sq.rank() as u32 + 1)).unwrap_or(0))
    } else {
        Bitboard(u64::MAX.checked_shr(8 * (8 - sq.rank() as u32)).unwrap_or(0))
    };
    let adjacent_files = pawn_file | left_file | right_file;
    if !(ahead & adjacent_files).intersects(enemy_pawns) {
        let advanced = if color.is_white() {
            sq.rank()
        } else {
            7 - sq.rank()
        };
        let passed = PAWN_PASSED_SCORES[advanced];
        tweak += if board.is_end_game() { passed * 2 } else { passed };
    }

    tweak
}

fn rook_tweak(board: &Board, sq: Square, color: Color) -> i32 {
    let file_bb = Bitboard::file_mask(sq.file());
    let pawns_on_file = board.pieces_by_type(Piece::Pawn) & file_bb;
    if pawns_on_file.is_empty() {
        return ROOK_ON_OPEN_FILE_SCORE;
    }
    if !pawns_on_file.intersects(board.pieces_of(color)) {
        return ROOK_ON_SEMI_OPEN_FILE_SCORE;
    }
    0
}

/// Penalty for each pinned piece, charged to its owner.
fn pinned_pieces(board: &Board) -> i32 {
    let mut score = 0;

    let white_pins = board.pins(Color::White).all() & board.pieces_of(Color::White);
    let black_pins = board.pins(Color::Black).all() & board.pieces_of(Color::Black);

    for sq in white_pins {
        if let Some((_, piece)) = board.piece_at(sq) {
            score -= PIECE_PINNED_SCORES[piece.index()];
        }
    }
    for sq in black_pins {
        if let Some((_, piece)) = board.piece_at(sq) {
            score += PIECE_PINNED_SCORES[piece.index()];
        }
    }

    score
}

fn piece_squares(board: &Board) -> i32 {
    let end_game = board.is_end_game();
    board.psq.score(Color::White, end_game) - board.psq.score(Color::Black, end_game)
}

fn bishop_pairs(board: &Board) -> i32 {
    let bonus = if board.is_end_game() {
        BISHOP_PAIR_END_GAME_SCORE
    } else {
        BISHOP_PAIR_SCORE
    };

    let mut score = 0;
    if board.piece_count(Color::White, Piece::Bishop) >= 2 {
        score += bonus;
    }
    if board.piece_count(Color::Black, Piece::Bishop) >= 2 {
        score -= bonus;
    }
    score
}

fn check_bonus(board: &Board) -> i32 {
    match board.checkers().popcount() {
        0 => 0,
        1 => CHECK_SCORE,
        _ => DOUBLE_CHECK_SCORE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos_is_balanced() {
        let board = Board::new();
        assert_eq!(evaluate(&board), 0);
    }

    #[test]
    fn test_extra_material_flips_with_side_to_move() {
        // White is a rook up
        let white_view = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let black_view = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 1").unwrap();
        let w = evaluate(&white_view);
        let b = evaluate(&black_view);
        assert!(w > 0);
        assert_eq!(w, -b);
    }

    #[test]
    fn test_mirrored_position_evaluates_symmetrically() {
        // The same structure with colors swapped and the board flipped
        let original =
            Board::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 0 1")
                .unwrap();
        let mirrored =
            Board::from_fen("rnbqkb1r/pppp1ppp/5n2/4p3/4P3/2N5/PPPP1PPP/R1BQKBNR b KQkq - 0 1")
                .unwrap();
        assert_eq!(evaluate(&original), evaluate(&mirrored));
    }

    #[test]
    fn test_isolated_pawn_penalty() {
        // The d4 pawn is isolated; with a c2 companion it is not
        let isolated = Board::from_fen("4k3/8/8/8/3P4/8/8/4K3 w - - 0 1").unwrap();
        let supported = Board::from_fen("4k3/8/8/8/3P4/8/2P5/4K3 w - - 0 1").unwrap();
        let single = evaluate(&isolated);
        let double = evaluate(&supported);
        // Two connected pawns beat one isolated pawn by more than the bare
        // material difference
        assert!(double > single + 100);
    }

    #[test]
    fn test_rook_open_file_bonus() {
        // Same material, rook on an open file vs. behind its own pawn
        let open = Board::from_fen("4k3/8/8/8/8/8/4P3/R4K2 w - - 0 1").unwrap();
        let closed = Board::from_fen("4k3/8/8/8/8/8/4P3/4RK2 w - - 0 1").unwrap();
        assert!(evaluate(&open) > evaluate(&closed));
    }

    #[test]
    fn test_check_bonus_is_added_after_perspective_flip() {
        // Black is in check from the rook on e1; shifting the rook to d1
        // lifts the check and changes nothing else (d1 and e1 share the
        // same table value, both files are open)
        let checked = Board::from_fen("4k3/8/8/8/8/8/8/4RK2 b - - 0 1").unwrap();
        assert_eq!(checked.checkers().popcount(), 1);
        let base = Board::from_fen("4k3/8/8/8/8/8/8/3R1K2 b - - 0 1").unwrap();
        assert!(base.checkers().is_empty());
        assert_eq!(evaluate(&checked) - evaluate(&base), CHECK_SCORE);
    }

    #[test]
    fn test_bishop_pair_bonus() {
        let pair = Board::from_fen("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1").unwrap();
        let single = Board::from_fen("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        let with_pair = evaluate(&pair);
        let with_single = evaluate(&single);
        // More than one extra bishop's worth of difference
        assert!(with_pair - with_single > 310);
    }
}
