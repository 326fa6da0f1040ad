//! Reading and writing Forsyth-Edwards Notation
//!
//! Only the piece placement is required. Missing trailing fields take the values they'd have in
//! `w - - 0 1`.

use board::{BoardSquare, Color, Piece, PieceKind};

use crate::{Bitboard, BitboardRepresentation, CastleOptions};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FenError {
    #[error("FEN is empty")]
    Empty,
    #[error("FEN has {0} fields, but there are only 6")]
    TooManyFields(usize),
    #[error("expected 8 ranks in the piece placement, found {0}")]
    RankCount(usize),
    #[error("rank {rank} of the piece placement is malformed")]
    MalformedRank { rank: u8 },
    #[error("unknown piece letter {0:?}")]
    UnknownPiece(char),
    #[error("{0} must have exactly one king")]
    KingCount(Color),
    #[error("there is a pawn on {0}, but pawns can't stand on the first or last rank")]
    PawnOnBackRank(BoardSquare),
    #[error("side to move must be `w` or `b`, not {0:?}")]
    SideToMove(String),
    #[error("invalid castling rights {0:?}")]
    Castling(String),
    #[error("invalid en passant square {0:?}")]
    EnPassant(String),
    #[error("invalid halfmove clock {0:?}")]
    HalfmoveClock(String),
    #[error("invalid fullmove number {0:?}")]
    FullmoveNumber(String),
    #[error("{0} is in check, but it's not their move")]
    OpponentInCheck(Color),
}

impl BitboardRepresentation {
    /// Parse the position described by the given FEN
    ///
    /// ```
    /// use bitboard::BitboardRepresentation;
    /// assert_eq!(
    ///     BitboardRepresentation::from_fen(
    ///         "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    ///     ),
    ///     Ok(BitboardRepresentation::INITIAL_STATE.clone()),
    /// );
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let terms = fen.split_whitespace().collect::<Vec<_>>();
        let (&placement, rest) = terms.split_first().ok_or(FenError::Empty)?;
        if terms.len() > 6 {
            return Err(FenError::TooManyFields(terms.len()));
        }
        let mut board = Self::EMPTY;
        board.read_placement(placement)?;
        board.side_to_move = match rest.first().copied().unwrap_or("w") {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };
        board.castles = parse_castles(rest.get(1).copied().unwrap_or("-"))?;
        {
            let en_passant = rest.get(2).copied().unwrap_or("-");
            board.en_passant_target = if en_passant == "-" {
                BoardSquare::INVALID
            } else {
                en_passant
                    .parse()
                    .map_err(|_| FenError::EnPassant(en_passant.to_string()))?
            };
        }
        {
            let halfmove = rest.get(3).copied().unwrap_or("0");
            let halfmove_clock = parse_counter(halfmove)
                .ok_or_else(|| FenError::HalfmoveClock(halfmove.to_string()))?;
            board.halfmove_clock = u8::try_from(halfmove_clock).unwrap_or(u8::MAX);
        }
        {
            let fullmove = rest.get(4).copied().unwrap_or("1");
            let turn_counter = parse_counter(fullmove)
                .ok_or_else(|| FenError::FullmoveNumber(fullmove.to_string()))?;
            board.turn_counter = u16::try_from(turn_counter).unwrap_or(u16::MAX).max(1);
        }

        board.drop_impossible_castles();
        board.drop_impossible_en_passant();
        let waiting = board.side_to_move.other();
        if board.is_check(waiting) {
            return Err(FenError::OpponentInCheck(waiting));
        }
        Ok(board)
    }

    /// Fill in the pieces from the first field of a FEN
    fn read_placement(&mut self, placement: &str) -> Result<(), FenError> {
        let ranks = placement.split('/').collect::<Vec<_>>();
        if ranks.len() != 8 {
            return Err(FenError::RankCount(ranks.len()));
        }
        for (rank_idx, rank) in ranks.into_iter().enumerate() {
            let rank_idx = 7 - rank_idx as u8;
            let malformed = FenError::MalformedRank { rank: rank_idx + 1 };
            let mut file = 0u8;
            let mut last_was_digit = false;
            for c in rank.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if last_was_digit || !(1..=8).contains(&skip) {
                        return Err(malformed);
                    }
                    last_was_digit = true;
                    file += skip as u8;
                    continue;
                }
                last_was_digit = false;
                let piece = Piece::from_fen_letter(c).ok_or(FenError::UnknownPiece(c))?;
                if file >= 8 {
                    return Err(malformed);
                }
                let square = BoardSquare::from_rank_file(rank_idx, file);
                match piece.kind {
                    PieceKind::King => {
                        if self.king_square(piece.color).is_valid() {
                            return Err(FenError::KingCount(piece.color));
                        }
                        self.put_piece(piece, square);
                    }
                    PieceKind::Pawn if rank_idx == 0 || rank_idx == 7 => {
                        return Err(FenError::PawnOnBackRank(square));
                    }
                    _ => self.put_piece(piece, square),
                }
                file += 1;
            }
            if file != 8 {
                return Err(malformed);
            }
        }
        for color in [Color::White, Color::Black] {
            if !self.king_square(color).is_valid() {
                return Err(FenError::KingCount(color));
            }
        }
        Ok(())
    }

    /// Forget castling rights whose king or rook isn't on its starting square
    fn drop_impossible_castles(&mut self) {
        for color in [Color::White, Color::Black] {
            let rank = color.back_rank();
            let rook = self.piece_bitboard(Piece {
                kind: PieceKind::Rook,
                color,
            });
            if self.king_square(color) != BoardSquare::from_rank_file(rank, 4) {
                self.castles &= !(CastleOptions::for_side(color, true)
                    | CastleOptions::for_side(color, false));
                continue;
            }
            for (kingside, rook_file) in [(true, 7), (false, 0)] {
                if !rook.intersects(BoardSquare::from_rank_file(rank, rook_file).into()) {
                    self.castles &= !CastleOptions::for_side(color, kingside);
                }
            }
        }
    }

    /// Forget an en passant square that no double pawn push could have left behind
    fn drop_impossible_en_passant(&mut self) {
        let target = self.en_passant_target;
        if !target.is_valid() {
            return;
        }
        let mover = self.side_to_move.other();
        let expected_rank = mover.back_rank().abs_diff(2);
        let passed_pawn = target.offset(mover.pawn_direction(), 0);
        let origin = target.offset(-mover.pawn_direction(), 0);
        let plausible = target.rank() == Some(expected_rank)
            && self.get(target).is_none()
            && self.get(origin).is_none()
            && self.get(passed_pawn)
                == Some(Piece {
                    kind: PieceKind::Pawn,
                    color: mover,
                });
        if !plausible {
            self.en_passant_target = BoardSquare::INVALID;
        }
    }

    /// Write the position as a FEN
    ///
    /// The en passant square is only written when an en passant capture is actually legal.
    pub fn to_fen(&self) -> String {
        let pieces = {
            let bitboard_occupied = self.bitboard_occupied();
            let rows = (0..=7)
                .rev()
                .map(|rank_idx| {
                    if !bitboard_occupied.intersects(Bitboard(0xFF << (rank_idx * 8))) {
                        return "8".to_string();
                    }
                    let mut positions = String::with_capacity(8);
                    let mut empty_run = 0u8;
                    for file_idx in 0..8 {
                        match self.get(BoardSquare::from_rank_file(rank_idx, file_idx)) {
                            Some(piece) => {
                                if empty_run > 0 {
                                    positions.push((b'0' + empty_run) as char);
                                    empty_run = 0;
                                }
                                positions.push(piece.fen_letter());
                            }
                            None => empty_run += 1,
                        }
                    }
                    if empty_run > 0 {
                        positions.push((b'0' + empty_run) as char);
                    }
                    positions
                })
                .collect::<Vec<String>>();
            rows.join("/")
        };
        let side_to_move = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };
        let castling = {
            let mut options = String::with_capacity(4);
            for (option, letter) in [
                (CastleOptions::WhiteKingside, 'K'),
                (CastleOptions::WhiteQueenside, 'Q'),
                (CastleOptions::BlackKingside, 'k'),
                (CastleOptions::BlackQueenside, 'q'),
            ] {
                if self.castles.contains(option) {
                    options.push(letter);
                }
            }
            if options.is_empty() {
                options.push('-');
            }
            options
        };
        let en_passant_target = if self.has_legal_en_passant() {
            self.en_passant_target.to_string()
        } else {
            "-".to_string()
        };
        let halfmove_clock = self.halfmove_clock;
        let fullmove_counter = self.turn_counter;
        format!("{pieces} {side_to_move} {castling} {en_passant_target} {halfmove_clock} {fullmove_counter}")
    }
}

/// A clock or move number, which is only digits; values too big for any counter saturate
fn parse_counter(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(field.parse().unwrap_or(u64::MAX))
}

fn parse_castles(field: &str) -> Result<CastleOptions, FenError> {
    if field == "-" {
        return Ok(CastleOptions::empty());
    }
    field.chars().try_fold(CastleOptions::empty(), |castles, c| {
        let option = match c {
            'K' => CastleOptions::WhiteKingside,
            'Q' => CastleOptions::WhiteQueenside,
            'k' => CastleOptions::BlackKingside,
            'q' => CastleOptions::BlackQueenside,
            _ => return Err(FenError::Castling(field.to_string())),
        };
        Ok(castles | option)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_position_fen_parsing() {
        assert_eq!(
            Ok(BitboardRepresentation::INITIAL_STATE),
            BitboardRepresentation::from_fen(
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
            )
        );
    }

    #[test]
    fn test_opening_position_to_fen() {
        assert_eq!(
            BitboardRepresentation::INITIAL_STATE.to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        );
    }

    #[test]
    fn test_fen_round_trip() {
        for fen in [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "4k3/8/8/8/8/8/8/4K2R b K - 37 80",
        ] {
            let board = BitboardRepresentation::from_fen(fen).unwrap();
            assert_eq!(board.to_fen(), fen);
        }
    }

    #[test]
    fn test_en_passant_written_only_when_legal() {
        // After 1. e4 nothing can take on e3
        let board = BitboardRepresentation::from_fen(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        )
        .unwrap();
        assert_eq!(board.en_passant_target, BoardSquare::E3);
        assert_eq!(
            board.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let board = BitboardRepresentation::from_fen("4k3/8/8/8/8/8/8/4K3").unwrap();
        assert_eq!(board.side_to_move, Color::White);
        assert_eq!(board.castles, CastleOptions::empty());
        assert_eq!(board.halfmove_clock, 0);
        assert_eq!(board.turn_counter, 1);
        assert_eq!(board.to_fen(), "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
    }

    #[test]
    fn test_large_counters_saturate() {
        let board = BitboardRepresentation::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 300 70000").unwrap();
        assert_eq!(board.halfmove_clock, u8::MAX);
        assert_eq!(board.turn_counter, u16::MAX);
        let board =
            BitboardRepresentation::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 99999999999999999999999 1")
                .unwrap();
        assert_eq!(board.halfmove_clock, u8::MAX);
    }

    #[test]
    fn test_castles_without_rook_are_dropped() {
        let board = BitboardRepresentation::from_fen("4k3/8/8/8/8/8/8/4K2R w KQkq - 0 1").unwrap();
        assert_eq!(board.castles, CastleOptions::WhiteKingside);
    }

    #[test]
    fn test_rejects_bad_fens() {
        #[track_caller]
        fn check(fen: &str, expected: FenError) {
            assert_eq!(BitboardRepresentation::from_fen(fen), Err(expected), "{fen}");
        }
        check("", FenError::Empty);
        check("   ", FenError::Empty);
        check("not a fen", FenError::RankCount(1));
        check("8/8/8/8/8/8/8/8 w - - 0 1", FenError::KingCount(Color::White));
        check("4k3/8/8/8/8/8/8/4KK2 w - - 0 1", FenError::KingCount(Color::White));
        check("4k3/8/8/8/8/8/8/3K3", FenError::MalformedRank { rank: 1 });
        check("4k3/8/8/8/8/8/8/4K4", FenError::MalformedRank { rank: 1 });
        check("4k3/8/8/8/8/8/8/44K3", FenError::MalformedRank { rank: 1 });
        check("4k3/8/8/8/8/8/8/4X3", FenError::UnknownPiece('X'));
        check(
            "4k2P/8/8/8/8/8/8/4K3 w - - 0 1",
            FenError::PawnOnBackRank(BoardSquare::H8),
        );
        check(
            "4k3/8/8/8/8/8/8/4K3 x - - 0 1",
            FenError::SideToMove("x".to_string()),
        );
        check(
            "4k3/8/8/8/8/8/8/4K3 w KX - 0 1",
            FenError::Castling("KX".to_string()),
        );
        check(
            "4k3/8/8/8/8/8/8/4K3 w - e9 0 1",
            FenError::EnPassant("e9".to_string()),
        );
        check(
            "4k3/8/8/8/8/8/8/4K3 w - - x 1",
            FenError::HalfmoveClock("x".to_string()),
        );
        check(
            "4k3/8/8/8/8/8/8/4K3 w - - +3 1",
            FenError::HalfmoveClock("+3".to_string()),
        );
        check(
            "4k3/8/8/8/8/8/8/4K3 w - - 0 -1",
            FenError::FullmoveNumber("-1".to_string()),
        );
        check("4k3/8/8/8/8/8/8/4K3 w - - 0 1 extra", FenError::TooManyFields(7));
        // Black is in check from the rook, but it's white to move
        check(
            "4k3/8/8/8/8/8/8/4RK2 w - - 0 1",
            FenError::OpponentInCheck(Color::Black),
        );
    }
}
