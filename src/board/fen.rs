//! FEN parsing and serialization.

use std::fmt::Write as _;

use super::error::FenError;
use super::types::{CastleSide, CastlingRights, Color, Piece, Square};
use super::Board;

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Board {
    /// Parse a FEN string into a new board.
    ///
    /// The halfmove and fullmove fields are optional. A malformed FEN
    /// returns an error without producing a partial position.
    pub fn from_fen(fen: &str) -> Result<Board, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(FenError::WrongFieldCount {
                found: fields.len(),
            });
        }

        let mut board = Board::empty();

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidBoard);
        }
        // The first FEN rank is rank 8
        for (row, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - row;
            let mut file = 0usize;
            for ch in rank_str.chars() {
                if let Some(run) = ch.to_digit(10) {
                    if run == 0 || run == 9 {
                        return Err(FenError::InvalidBoard);
                    }
                    file += run as usize;
                } else {
                    let piece =
                        Piece::from_char(ch).ok_or(FenError::InvalidPiece { char: ch })?;
                    let color = if ch.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    if file >= 8 {
                        return Err(FenError::InvalidBoard);
                    }
                    board.set_piece(Square::new(rank, file), color, piece);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::InvalidBoard);
            }
        }

        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        };

        let mut rights = CastlingRights::none();
        if fields[2] != "-" {
            for ch in fields[2].chars() {
                match ch {
                    'K' => rights.allow(Color::White, CastleSide::Short),
                    'Q' => rights.allow(Color::White, CastleSide::Long),
                    'k' => rights.allow(Color::Black, CastleSide::Short),
                    'q' => rights.allow(Color::Black, CastleSide::Long),
                    _ => return Err(FenError::InvalidCastling { char: ch }),
                }
            }
        }
        board.castling_rights = rights;

        if fields[3] != "-" {
            let ep: Square = fields[3].parse().map_err(|_| FenError::InvalidEnPassant {
                found: fields[3].to_string(),
            })?;
            // Recorded as given; only the file matters afterwards
            board.ep_file = Some(ep.file() as u8);
        }

        board.halfmove_clock = match fields.get(4) {
            Some(text) => text.parse().map_err(|_| FenError::InvalidClock {
                found: (*text).to_string(),
            })?,
            None => 0,
        };
        board.fullmove_number = match fields.get(5) {
            Some(text) => text.parse().map_err(|_| FenError::InvalidClock {
                found: (*text).to_string(),
            })?,
            None => 1,
        };

        board.hash = board.calculate_hash();
        board.update_checkers();
        board.recalculate_end_game_weight();
        board.repetitions.set(board.hash, 1);
        board.max_repetitions = 1;

        Ok(board)
    }

    /// Serialize the position as a six-field FEN string.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        for rank in (0..8).rev() {
            let mut empty_run = 0;
            for file in 0..8 {
                match self.piece_at(Square::new(rank, file)) {
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            let _ = write!(fen, "{empty_run}");
                            empty_run = 0;
                        }
                        fen.push(piece.to_fen_char(color));
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                let _ = write!(fen, "{empty_run}");
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.side_to_move.is_white() { 'w' } else { 'b' });
        fen.push(' ');

        let rights = self.castling_rights;
        if rights == CastlingRights::none() {
            fen.push('-');
        } else {
            if rights.can_castle(Color::White, CastleSide::Short) {
                fen.push('K');
            }
            if rights.can_castle(Color::White, CastleSide::Long) {
                fen.push('Q');
            }
            if rights.can_castle(Color::Black, CastleSide::Short) {
                fen.push('k');
            }
            if rights.can_castle(Color::Black, CastleSide::Long) {
                fen.push('q');
            }
        }

        fen.push(' ');
        match self.ep_square() {
            Some(sq) => {
                let _ = write!(fen, "{sq}");
            }
            None => fen.push('-'),
        }

        let _ = write!(fen, " {} {}", self.halfmove_clock, self.fullmove_number);
        fen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos_round_trip() {
        let board = Board::from_fen(START_FEN).unwrap();
        assert_eq!(board.to_fen(), START_FEN);
    }

    #[test]
    fn test_kiwipete_fields() {
        let board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -")
                .unwrap();
        assert_eq!(board.side_to_move(), Color::White);
        assert_eq!(board.castling_rights(), CastlingRights::all());
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.fullmove_number(), 1);
        assert_eq!(board.occupancy().popcount(), 32);
    }

    #[test]
    fn test_optional_clock_fields() {
        let board = Board::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -").unwrap();
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.fullmove_number(), 1);
        assert_eq!(board.to_fen(), "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1");
    }

    #[test]
    fn test_en_passant_square_round_trip() {
        let fen = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(board.ep_file, Some(5));
        assert_eq!(board.ep_square().unwrap().to_string(), "f6");
        assert_eq!(board.to_fen(), fen);
    }

    #[test]
    fn test_malformed_fens_are_rejected() {
        assert!(matches!(
            Board::from_fen("8/8/8/8 w"),
            Err(FenError::WrongFieldCount { found: 2 })
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq -"),
            Err(FenError::InvalidPiece { char: 'X' })
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq -"),
            Err(FenError::InvalidSideToMove { .. })
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq -"),
            Err(FenError::InvalidCastling { char: 'x' })
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e9"),
            Err(FenError::InvalidEnPassant { .. })
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1"),
            Err(FenError::InvalidClock { .. })
        ));
        // Rank with nine files
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"),
            Err(FenError::InvalidBoard)
        ));
    }

    #[test]
    fn test_hash_matches_recomputation_after_parse() {
        let fens = [
            START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        ];
        for fen in fens {
            let board = Board::from_fen(fen).unwrap();
            assert_eq!(board.hash(), board.calculate_hash(), "hash mismatch for {fen}");
        }
    }
}
