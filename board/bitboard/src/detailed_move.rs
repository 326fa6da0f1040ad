use board::{BoardSquare, Color, Piece, PieceKind, UciMove};

/// All the details of a move figured out
///
/// These are only ever produced by move generation, so every `DetailedMove` in circulation was
/// legal in the position it was generated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetailedMove {
    pub piece: Piece,
    pub source: BoardSquare,
    pub target: BoardSquare,
    pub is_castle: bool,
    pub is_en_passant: bool,
    pub is_capture: bool,
    pub promotion_into: Option<PieceKind>,
}
impl DetailedMove {
    /// A move which isn't a castle, en passant, or promotion
    pub(crate) const fn plain(
        piece: Piece,
        source: BoardSquare,
        target: BoardSquare,
        is_capture: bool,
    ) -> Self {
        Self {
            piece,
            source,
            target,
            is_castle: false,
            is_en_passant: false,
            is_capture,
            promotion_into: None,
        }
    }

    /// The king of the given color castling, towards the h-file if `kingside`
    pub(crate) const fn castle(color: Color, kingside: bool) -> Self {
        let rank = color.back_rank();
        Self {
            piece: Piece {
                kind: PieceKind::King,
                color,
            },
            source: BoardSquare::from_rank_file(rank, 4),
            target: BoardSquare::from_rank_file(rank, if kingside { 6 } else { 2 }),
            is_castle: true,
            is_en_passant: false,
            is_capture: false,
            promotion_into: None,
        }
    }

    /// Where the rook starts and ends if this move is a castle
    pub(crate) fn castle_rook_squares(&self) -> Option<(BoardSquare, BoardSquare)> {
        if !self.is_castle {
            return None;
        }
        let (rank, file) = self.target.to_rank_file()?;
        match file {
            6 => Some((
                BoardSquare::from_rank_file(rank, 7),
                BoardSquare::from_rank_file(rank, 5),
            )),
            2 => Some((
                BoardSquare::from_rank_file(rank, 0),
                BoardSquare::from_rank_file(rank, 3),
            )),
            _ => None,
        }
    }

    /// The square of the pawn removed by this move if it is an en passant capture
    pub(crate) fn en_passant_victim(&self) -> Option<BoardSquare> {
        self.is_en_passant
            .then(|| self.target.offset(-self.piece.color.pawn_direction(), 0))
    }

    /// Returns the square against which the opponent may respond with an en passant.
    ///
    /// If this move is not a double pawn move, then this is [`BoardSquare::INVALID`].
    pub(crate) fn en_passant_response(&self) -> BoardSquare {
        if self.piece.kind != PieceKind::Pawn || self.is_capture {
            return BoardSquare::INVALID;
        }
        let Some((source_rank, file)) = self.source.to_rank_file() else {
            return BoardSquare::INVALID;
        };
        let Some((target_rank, _)) = self.target.to_rank_file() else {
            return BoardSquare::INVALID;
        };
        if source_rank.abs_diff(target_rank) == 2 {
            BoardSquare::from_rank_file((source_rank + target_rank) / 2, file)
        } else {
            BoardSquare::INVALID
        }
    }
}
impl From<DetailedMove> for UciMove {
    fn from(value: DetailedMove) -> Self {
        Self {
            source: value.source,
            target: value.target,
            promotion: value.promotion_into,
        }
    }
}
