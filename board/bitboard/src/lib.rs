//! A chess rules engine which stores the position as a set of bitboards.
//!
//! [`GameState`] is the type the rest of the workspace plays against: it implements
//! [`board::Board`] and remembers enough history to spot repetitions.

use board::{BoardSquare, Color, Piece, PieceKind, UciMove};

mod bitboard;
mod detailed_move;
mod fen;
mod game;

pub use crate::bitboard::Bitboard;
pub use crate::detailed_move::DetailedMove;
pub use crate::fen::FenError;
pub use crate::game::GameState;

pub type Result<T, E = Error> = core::result::Result<T, E>;

bitflags::bitflags! {
    /// Which castles are allowed (the king and rook haven't moved yet)
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CastleOptions: u8 {
        const WhiteKingside = 0b0000_0001;
        const WhiteQueenside = 0b0000_0010;
        /// A mask for whether white can castle in either direction
        const White = 0b0000_0011;
        const BlackKingside = 0b0000_0100;
        const BlackQueenside = 0b0000_1000;
        /// A mask for whether black can castle in either direction
        const Black = 0b0000_1100;
    }
}
impl CastleOptions {
    /// The single castle for the given side and direction
    pub const fn for_side(color: Color, kingside: bool) -> Self {
        match (color, kingside) {
            (Color::White, true) => Self::WhiteKingside,
            (Color::White, false) => Self::WhiteQueenside,
            (Color::Black, true) => Self::BlackKingside,
            (Color::Black, false) => Self::BlackQueenside,
        }
    }

    /// The castles lost once anything moves from or to the given square
    const fn touching(square: BoardSquare) -> Self {
        match square {
            BoardSquare::E1 => Self::White,
            BoardSquare::A1 => Self::WhiteQueenside,
            BoardSquare::H1 => Self::WhiteKingside,
            BoardSquare::E8 => Self::Black,
            BoardSquare::A8 => Self::BlackQueenside,
            BoardSquare::H8 => Self::BlackKingside,
            _ => Self::empty(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("error parsing FEN: {0}")]
    Fen(#[from] FenError),
    #[error("move {0} is not legal in the current position")]
    IllegalMove(UciMove),
}

/// Represent using a bunch of bitboards
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitboardRepresentation {
    // piece placement
    pub white_pawn: Bitboard,
    pub white_rook: Bitboard,
    pub white_knight: Bitboard,
    pub white_bishop: Bitboard,
    pub white_queen: Bitboard,
    pub white_king: BoardSquare,
    pub black_pawn: Bitboard,
    pub black_rook: Bitboard,
    pub black_knight: Bitboard,
    pub black_bishop: Bitboard,
    pub black_queen: Bitboard,
    pub black_king: BoardSquare,

    // flags
    /// Whether en passant is allowed and, if so, where
    ///
    /// If no en passant is allowed, then this will be an invalid square. A valid square here only
    /// means a pawn just double-stepped past it; the capture may still be illegal.
    pub en_passant_target: BoardSquare,
    pub side_to_move: Color,
    /// What castles are allowed, given the history of moves
    ///
    /// These castles aren't necessarily legal right now, as it may be blocked by intervening
    /// pieces and/or checks.
    pub castles: CastleOptions,

    // clocks
    /// Number of half-moves since pawn was moved or piece was captured
    ///
    /// The game is drawn by the 75 move rule when this counter hits 150
    pub halfmove_clock: u8,
    /// The number of turns elapsed in the game
    pub turn_counter: u16,
}

impl BitboardRepresentation {
    /// A board with no pieces on it and no moves made
    pub const EMPTY: Self = Self {
        white_pawn: Bitboard::empty(),
        white_rook: Bitboard::empty(),
        white_knight: Bitboard::empty(),
        white_bishop: Bitboard::empty(),
        white_queen: Bitboard::empty(),
        white_king: BoardSquare::INVALID,
        black_pawn: Bitboard::empty(),
        black_rook: Bitboard::empty(),
        black_knight: Bitboard::empty(),
        black_bishop: Bitboard::empty(),
        black_queen: Bitboard::empty(),
        black_king: BoardSquare::INVALID,
        en_passant_target: BoardSquare::INVALID,
        side_to_move: Color::White,
        castles: CastleOptions::empty(),
        halfmove_clock: 0,
        turn_counter: 1,
    };

    /// The state at the start of a chess game
    pub const INITIAL_STATE: Self = Self {
        white_pawn: Bitboard(0xFF00),
        white_rook: Bitboard(0x81),
        white_knight: Bitboard(0x42),
        white_bishop: Bitboard(0x24),
        white_queen: Bitboard(0x08),
        white_king: BoardSquare::E1,
        black_pawn: Bitboard(0x00FF0000_00000000),
        black_rook: Bitboard(0x81000000_00000000),
        black_knight: Bitboard(0x42000000_00000000),
        black_bishop: Bitboard(0x24000000_00000000),
        black_queen: Bitboard(0x08000000_00000000),
        black_king: BoardSquare::E8,
        en_passant_target: BoardSquare::INVALID,
        side_to_move: Color::White,
        castles: CastleOptions::all(),
        halfmove_clock: 0,
        turn_counter: 1,
    };

    /// The squares occupied by white's pieces
    pub const fn white_bitboard(&self) -> Bitboard {
        self.white_pawn
            .union(self.white_rook)
            .union(self.white_knight)
            .union(self.white_bishop)
            .union(self.white_queen)
            .union(Bitboard::from_board_square(self.white_king))
    }

    /// The squares occupied by black's pieces
    pub const fn black_bitboard(&self) -> Bitboard {
        self.black_pawn
            .union(self.black_rook)
            .union(self.black_knight)
            .union(self.black_bishop)
            .union(self.black_queen)
            .union(Bitboard::from_board_square(self.black_king))
    }

    /// The squares occupied by the given side's pieces
    pub const fn color_bitboard(&self, color: Color) -> Bitboard {
        match color {
            Color::White => self.white_bitboard(),
            Color::Black => self.black_bitboard(),
        }
    }

    /// Returns a bitboard of all occupied squares
    pub const fn bitboard_occupied(&self) -> Bitboard {
        self.white_bitboard().union(self.black_bitboard())
    }

    /// Find the piece, if any, at the given square
    ///
    /// Returns `None` if the given square is invalid.
    pub fn get(&self, square: BoardSquare) -> Option<Piece> {
        if !square.is_valid() {
            return None;
        }
        let query_bitboard = Bitboard::from(square);
        Piece::all_pieces().find(|&piece| self.piece_bitboard(piece).intersects(query_bitboard))
    }

    /// Get the square on which the given player's King resides
    pub const fn king_square(&self, color: Color) -> BoardSquare {
        match color {
            Color::White => self.white_king,
            Color::Black => self.black_king,
        }
    }

    /// Get the bitboard associated with the given piece
    pub const fn piece_bitboard(&self, piece: Piece) -> Bitboard {
        match (piece.kind, piece.color) {
            (PieceKind::Pawn, Color::White) => self.white_pawn,
            (PieceKind::Rook, Color::White) => self.white_rook,
            (PieceKind::Knight, Color::White) => self.white_knight,
            (PieceKind::Bishop, Color::White) => self.white_bishop,
            (PieceKind::Queen, Color::White) => self.white_queen,
            (PieceKind::King, Color::White) => Bitboard::from_board_square(self.white_king),
            (PieceKind::Pawn, Color::Black) => self.black_pawn,
            (PieceKind::Rook, Color::Black) => self.black_rook,
            (PieceKind::Knight, Color::Black) => self.black_knight,
            (PieceKind::Bishop, Color::Black) => self.black_bishop,
            (PieceKind::Queen, Color::Black) => self.black_queen,
            (PieceKind::King, Color::Black) => Bitboard::from_board_square(self.black_king),
        }
    }

    /// Get a mutable reference to the bitboard associated with the given piece
    ///
    /// Returns `None` for [`PieceKind::King`] because we don't store the bitboard when we can only
    /// have one piece.
    fn piece_bitboard_mut(&mut self, piece: Piece) -> Option<&mut Bitboard> {
        match (piece.kind, piece.color) {
            (PieceKind::King, _) => None,
            (PieceKind::Pawn, Color::White) => Some(&mut self.white_pawn),
            (PieceKind::Rook, Color::White) => Some(&mut self.white_rook),
            (PieceKind::Knight, Color::White) => Some(&mut self.white_knight),
            (PieceKind::Bishop, Color::White) => Some(&mut self.white_bishop),
            (PieceKind::Queen, Color::White) => Some(&mut self.white_queen),
            (PieceKind::Pawn, Color::Black) => Some(&mut self.black_pawn),
            (PieceKind::Rook, Color::Black) => Some(&mut self.black_rook),
            (PieceKind::Knight, Color::Black) => Some(&mut self.black_knight),
            (PieceKind::Bishop, Color::Black) => Some(&mut self.black_bishop),
            (PieceKind::Queen, Color::Black) => Some(&mut self.black_queen),
        }
    }

    /// Put the piece on the square, which must be empty
    fn put_piece(&mut self, piece: Piece, square: BoardSquare) {
        match self.piece_bitboard_mut(piece) {
            Some(bitboard) => *bitboard |= square,
            None => match piece.color {
                Color::White => self.white_king = square,
                Color::Black => self.black_king = square,
            },
        }
    }

    /// Take whatever piece is on the square off the board
    fn remove_piece(&mut self, square: BoardSquare) -> Option<Piece> {
        let piece = self.get(square)?;
        match self.piece_bitboard_mut(piece) {
            Some(bitboard) => *bitboard &= !Bitboard::from(square),
            None => match piece.color {
                Color::White => self.white_king = BoardSquare::INVALID,
                Color::Black => self.black_king = BoardSquare::INVALID,
            },
        }
        Some(piece)
    }

    /// Returns `true` if any piece of the color `by` attacks `square`
    ///
    /// A piece attacks a square if the same kind of piece standing on that square would attack
    /// it back, with pawns looking in the opposite direction.
    pub fn is_attacked(&self, square: BoardSquare, by: Color) -> bool {
        let occupied = self.bitboard_occupied();
        PieceKind::KINDS.into_iter().any(|kind| {
            let attackers = self.piece_bitboard(Piece { kind, color: by });
            !attackers.is_empty()
                && Bitboard::attacks(
                    square,
                    Piece {
                        kind,
                        color: by.other(),
                    },
                    occupied,
                )
                .intersects(attackers)
        })
    }

    /// Returns `true` if the given color's King is in check
    pub fn is_check(&self, color: Color) -> bool {
        let king = self.king_square(color);
        king.is_valid() && self.is_attacked(king, color.other())
    }

    /// Every move the side to move can make, ignoring whether it leaves their king in check
    fn pseudo_legal_moves(&self) -> Vec<DetailedMove> {
        let color = self.side_to_move;
        let own = self.color_bitboard(color);
        let enemy = self.color_bitboard(color.other());
        let occupied = own | enemy;
        let mut moves = Vec::with_capacity(64);
        for kind in [
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
            PieceKind::King,
        ] {
            let piece = Piece { kind, color };
            for source in self.piece_bitboard(piece).squares_iter() {
                let targets = Bitboard::attacks(source, piece, occupied) & !own;
                moves.extend(targets.squares_iter().map(|target| {
                    DetailedMove::plain(piece, source, target, enemy.intersects(target.into()))
                }));
            }
        }
        self.pawn_moves(enemy, occupied, &mut moves);
        self.castle_moves(occupied, &mut moves);
        moves
    }

    /// Pushes, captures, en passant, and promotions for the side to move
    fn pawn_moves(&self, enemy: Bitboard, occupied: Bitboard, moves: &mut Vec<DetailedMove>) {
        let color = self.side_to_move;
        let pawn = Piece {
            kind: PieceKind::Pawn,
            color,
        };
        let direction = color.pawn_direction();
        let start_rank = color.back_rank().abs_diff(1);
        let promotion_rank = color.other().back_rank();
        let mut push = |mv: DetailedMove| {
            if mv.target.rank() == Some(promotion_rank) {
                moves.extend(PieceKind::PROMOTIONS.into_iter().map(|kind| DetailedMove {
                    promotion_into: Some(kind),
                    ..mv
                }));
            } else {
                moves.push(mv);
            }
        };
        for source in self.piece_bitboard(pawn).squares_iter() {
            let single = source.offset(direction, 0);
            if single.is_valid() && !occupied.intersects(single.into()) {
                push(DetailedMove::plain(pawn, source, single, false));
                let double = single.offset(direction, 0);
                if source.rank() == Some(start_rank) && !occupied.intersects(double.into()) {
                    push(DetailedMove::plain(pawn, source, double, false));
                }
            }
            let attacks = Bitboard::attacks(source, pawn, occupied);
            for target in (attacks & enemy).squares_iter() {
                push(DetailedMove::plain(pawn, source, target, true));
            }
            if attacks.intersects(self.en_passant_target.into()) {
                push(DetailedMove {
                    is_en_passant: true,
                    ..DetailedMove::plain(pawn, source, self.en_passant_target, true)
                });
            }
        }
    }

    /// Castles whose rights remain, whose path is clear, and whose king never crosses an attacked
    /// square
    fn castle_moves(&self, occupied: Bitboard, moves: &mut Vec<DetailedMove>) {
        let color = self.side_to_move;
        if self.is_check(color) {
            return;
        }
        let rank = color.back_rank();
        for kingside in [true, false] {
            if !self.castles.contains(CastleOptions::for_side(color, kingside)) {
                continue;
            }
            // Files between the king and rook, then files the king crosses
            let must_be_empty: &[u8] = if kingside { &[5, 6] } else { &[1, 2, 3] };
            let king_path: &[u8] = if kingside { &[5, 6] } else { &[3, 2] };
            if must_be_empty
                .iter()
                .any(|&file| occupied.intersects(BoardSquare::from_rank_file(rank, file).into()))
            {
                continue;
            }
            if king_path
                .iter()
                .any(|&file| self.is_attacked(BoardSquare::from_rank_file(rank, file), color.other()))
            {
                continue;
            }
            let castle = DetailedMove::castle(color, kingside);
            let rook_in_place = castle.castle_rook_squares().is_some_and(|(rook_square, _)| {
                self.get(rook_square)
                    == Some(Piece {
                        kind: PieceKind::Rook,
                        color,
                    })
            });
            if rook_in_place && self.king_square(color) == castle.source {
                moves.push(castle);
            }
        }
    }

    /// Every legal move for the side to move
    pub fn legal_moves(&self) -> Vec<DetailedMove> {
        let mut moves = self.pseudo_legal_moves();
        moves.retain(|&mv| {
            let mut post_move = self.clone();
            post_move.do_move(mv);
            !post_move.is_check(self.side_to_move)
        });
        moves
    }

    /// Whether the side to move has any legal en passant capture
    pub fn has_legal_en_passant(&self) -> bool {
        self.en_passant_target.is_valid() && self.legal_moves().iter().any(|mv| mv.is_en_passant)
    }

    /// Do the move without checking if it's legal
    ///
    /// The move must have come from [`Self::legal_moves`] on this exact position, otherwise the
    /// resulting board is meaningless.
    fn do_move(&mut self, m: DetailedMove) {
        self.remove_piece(m.source);
        if let Some(victim) = m.en_passant_victim() {
            self.remove_piece(victim);
        } else if m.is_capture {
            self.remove_piece(m.target);
        }
        self.put_piece(
            Piece {
                kind: m.promotion_into.unwrap_or(m.piece.kind),
                color: m.piece.color,
            },
            m.target,
        );
        if let Some((rook_source, rook_target)) = m.castle_rook_squares() {
            if let Some(rook) = self.remove_piece(rook_source) {
                self.put_piece(rook, rook_target);
            }
        }
        self.castles &= !(CastleOptions::touching(m.source) | CastleOptions::touching(m.target));
        if m.is_capture || m.piece.kind == PieceKind::Pawn {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if self.side_to_move == Color::Black {
            self.turn_counter = self.turn_counter.saturating_add(1);
        }
        self.en_passant_target = m.en_passant_response();
        self.side_to_move = self.side_to_move.other();
    }

    /// Whether the given side lacks the material to ever checkmate, regardless of what the other
    /// side does
    fn has_insufficient_material(&self, color: Color) -> bool {
        let of = |kind, color| self.piece_bitboard(Piece { kind, color });
        let both = |kind| of(kind, Color::White) | of(kind, Color::Black);
        if !(of(PieceKind::Pawn, color) | of(PieceKind::Rook, color) | of(PieceKind::Queen, color))
            .is_empty()
        {
            return false;
        }
        if !of(PieceKind::Knight, color).is_empty() {
            // A lone knight can only mate if the opponent has pieces to get in their own way
            let opponent = color.other();
            let blockers = self.color_bitboard(opponent)
                & !(of(PieceKind::King, opponent) | of(PieceKind::Queen, opponent));
            return self.color_bitboard(color).num_set() <= 2 && blockers.is_empty();
        }
        if !of(PieceKind::Bishop, color).is_empty() {
            let bishops = both(PieceKind::Bishop);
            let same_color = !bishops.intersects(Bitboard::DARK_SQUARES)
                || !bishops.intersects(Bitboard::LIGHT_SQUARES);
            return same_color
                && both(PieceKind::Pawn).is_empty()
                && both(PieceKind::Knight).is_empty();
        }
        true
    }

    /// Neither side has the material to checkmate
    pub fn is_insufficient_material(&self) -> bool {
        self.has_insufficient_material(Color::White) && self.has_insufficient_material(Color::Black)
    }

    /// The parts of the position that decide whether two positions are repetitions of each other
    ///
    /// The clocks are zeroed, and the en passant square is dropped unless the capture is legal.
    fn repetition_key(&self) -> Self {
        Self {
            en_passant_target: if self.has_legal_en_passant() {
                self.en_passant_target
            } else {
                BoardSquare::INVALID
            },
            halfmove_clock: 0,
            turn_counter: 0,
            ..self.clone()
        }
    }
}

/// Count the leaf nodes of the legal move tree `depth` plies deep
#[cfg(test)]
fn perft(board: &BitboardRepresentation, depth: u32) -> usize {
    if depth == 0 {
        return 1;
    }
    let moves = board.legal_moves();
    if depth == 1 {
        return moves.len();
    }
    moves
        .into_iter()
        .map(|mv| {
            let mut next = board.clone();
            next.do_move(mv);
            perft(&next, depth - 1)
        })
        .sum()
}
