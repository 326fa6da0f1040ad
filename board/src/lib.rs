//! The shared vocabulary of a chess game, and the [`Board`] trait through which the rest of the
//! workspace talks to whatever knows the rules.

use core::{fmt, str::FromStr};
use std::error;

/// The types of pieces there are
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}
impl PieceKind {
    /// All the kinds of pieces there are
    pub const KINDS: [PieceKind; 6] = [
        Self::Pawn,
        Self::Rook,
        Self::Knight,
        Self::Bishop,
        Self::Queen,
        Self::King,
    ];

    /// The kinds a pawn may promote into, in the order they're generated
    pub const PROMOTIONS: [PieceKind; 4] = [Self::Queen, Self::Rook, Self::Bishop, Self::Knight];

    /// The capitalized version of the letter used for this piece in FEN
    pub const fn fen_letter(self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Rook => 'R',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    /// The kind named by a FEN letter of either case
    pub const fn from_fen_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'P' => Some(Self::Pawn),
            'R' => Some(Self::Rook),
            'N' => Some(Self::Knight),
            'B' => Some(Self::Bishop),
            'Q' => Some(Self::Queen),
            'K' => Some(Self::King),
            _ => None,
        }
    }

    /// Whether a pawn can promote into this kind of piece
    pub const fn is_promotable(self) -> bool {
        match self {
            PieceKind::Pawn | PieceKind::King => false,
            PieceKind::Rook | PieceKind::Queen | PieceKind::Knight | PieceKind::Bishop => true,
        }
    }
}

/// The colors a piece can have
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}
impl Color {
    pub const fn other(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// The rank index (0-based) on which this side's pieces start
    pub const fn back_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// The direction this side's pawns advance in, as a rank offset
    pub const fn pawn_direction(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Color::White => "White",
            Color::Black => "Black",
        })
    }
}

/// A piece
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}
impl Piece {
    pub const fn fen_letter(self) -> char {
        match self.color {
            Color::White => self.kind.fen_letter().to_ascii_uppercase(),
            Color::Black => self.kind.fen_letter().to_ascii_lowercase(),
        }
    }

    /// Parse a FEN piece letter: uppercase is white, lowercase is black
    pub const fn from_fen_letter(letter: char) -> Option<Self> {
        let Some(kind) = PieceKind::from_fen_letter(letter) else {
            return None;
        };
        let color = if letter.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Self { kind, color })
    }

    /// Every piece of either color, white first
    pub fn all_pieces() -> impl Iterator<Item = Self> {
        [Color::White, Color::Black].into_iter().flat_map(|color| {
            PieceKind::KINDS
                .into_iter()
                .map(move |kind| Self { kind, color })
        })
    }
}

/// An index on the board
///
/// Stored in 0x88 method:
/// ```text
/// 0b12345678
///        +-+ File
///    +-+ Rank
///   +   + Must be zero, invalid position if 1
/// ```
///
/// Each square is represented in one byte, and this format makes it easy to do operations and
/// check if the resulting square is valid and on the board.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardSquare(pub u8);

/// Declare a named constant for every square, rank by rank
macro_rules! named_squares {
    ($($rank:literal => [$a:ident, $b:ident, $c:ident, $d:ident, $e:ident, $f:ident, $g:ident, $h:ident],)*) => {$(
        pub const $a: Self = Self($rank << 4);
        pub const $b: Self = Self($rank << 4 | 1);
        pub const $c: Self = Self($rank << 4 | 2);
        pub const $d: Self = Self($rank << 4 | 3);
        pub const $e: Self = Self($rank << 4 | 4);
        pub const $f: Self = Self($rank << 4 | 5);
        pub const $g: Self = Self($rank << 4 | 6);
        pub const $h: Self = Self($rank << 4 | 7);
    )*};
}

impl BoardSquare {
    /// An invalid square
    ///
    /// Please use this instead of making your own so it's obvious if a deliberately-invalid square
    /// appeared.
    pub const INVALID: Self = Self(0xee);

    named_squares! {
        0 => [A1, B1, C1, D1, E1, F1, G1, H1],
        1 => [A2, B2, C2, D2, E2, F2, G2, H2],
        2 => [A3, B3, C3, D3, E3, F3, G3, H3],
        3 => [A4, B4, C4, D4, E4, F4, G4, H4],
        4 => [A5, B5, C5, D5, E5, F5, G5, H5],
        5 => [A6, B6, C6, D6, E6, F6, G6, H6],
        6 => [A7, B7, C7, D7, E7, F7, G7, H7],
        7 => [A8, B8, C8, D8, E8, F8, G8, H8],
    }

    /// Returns if this square is valid
    ///
    /// ```
    /// # use board::BoardSquare;
    /// assert!(!BoardSquare::INVALID.is_valid());
    /// assert!(BoardSquare::H8.is_valid());
    /// ```
    pub const fn is_valid(self) -> bool {
        self.0 & 0x88 == 0
    }

    /// Produce a board square from the rank and file, returning [`Self::INVALID`] if the rank and
    /// file are not a valid square.
    pub const fn from_rank_file(rank: u8, file: u8) -> Self {
        if rank < 8 && file < 8 {
            Self(rank << 4 | file)
        } else {
            Self::INVALID
        }
    }

    /// Returns the `(rank, file)` tuple if this position is valid
    pub const fn to_rank_file(self) -> Option<(u8, u8)> {
        if self.is_valid() {
            Some((self.0 >> 4, self.0 & 0x07))
        } else {
            None
        }
    }

    /// The 0-based rank of this square, if it is valid
    pub const fn rank(self) -> Option<u8> {
        match self.to_rank_file() {
            Some((rank, _)) => Some(rank),
            None => None,
        }
    }

    /// Offset the given number of ranks and files.
    ///
    /// Positive rank moves towards the 8th rank, while positive file moves from a towards h.
    ///
    /// ```rust
    /// use board::BoardSquare;
    /// assert_eq!(BoardSquare::D2, BoardSquare::A1.offset(1, 3));
    /// assert_eq!(BoardSquare::A1, BoardSquare::D2.offset(-1, -3));
    /// assert_eq!(BoardSquare::F7, BoardSquare::F7.offset(0, 0));
    /// assert!(!BoardSquare::D1.offset(-1, 0).is_valid());
    /// assert!(!BoardSquare::D8.offset(1, 0).is_valid());
    /// assert!(!BoardSquare::A4.offset(0, -1).is_valid());
    /// assert!(!BoardSquare::H4.offset(0, 1).is_valid());
    /// ```
    pub const fn offset(self, rank: i8, file: i8) -> Self {
        BoardSquareOffset::from_rank_file(rank, file).offset(self)
    }
}
impl fmt::Debug for BoardSquare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "BoardSquare({self})")
        } else {
            write!(f, "BoardSquare(invalid {:X})", self.0)
        }
    }
}
/// Writes the square's name (`e4`), or `XX` if the square is invalid
impl fmt::Display for BoardSquare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rank_file() {
            Some((rank, file)) => write!(f, "{}{}", (b'a' + file) as char, rank + 1),
            None => f.write_str("XX"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("board position string was invalid")]
pub struct BoardSquareFromStrErr;

impl FromStr for BoardSquare {
    type Err = BoardSquareFromStrErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let &[file, rank] = s.as_bytes() else {
            return Err(BoardSquareFromStrErr);
        };
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(BoardSquareFromStrErr);
        }
        Ok(Self::from_rank_file(rank - b'1', file - b'a'))
    }
}

/// An offset on a board
///
/// This struct stores any possible offset in both rank and file between any two squares, using
/// only one byte of space.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BoardSquareOffset(u8);
impl BoardSquareOffset {
    /// The offsets corresponding to all possible knight moves
    pub const KNIGHT_MOVES: [BoardSquareOffset; 8] = [
        Self::from_rank_file(2, 1),
        Self::from_rank_file(2, -1),
        Self::from_rank_file(-2, 1),
        Self::from_rank_file(-2, -1),
        Self::from_rank_file(1, 2),
        Self::from_rank_file(1, -2),
        Self::from_rank_file(-1, 2),
        Self::from_rank_file(-1, -2),
    ];

    /// The offsets corresponding to all possible king moves
    pub const KING_MOVES: [BoardSquareOffset; 8] = [
        Self::from_rank_file(1, 1),
        Self::from_rank_file(1, 0),
        Self::from_rank_file(1, -1),
        Self::from_rank_file(0, 1),
        Self::from_rank_file(0, -1),
        Self::from_rank_file(-1, 1),
        Self::from_rank_file(-1, 0),
        Self::from_rank_file(-1, -1),
    ];

    /// The single steps a rook slides along
    pub const ROOK_DIRECTIONS: [BoardSquareOffset; 4] = [
        Self::from_rank_file(1, 0),
        Self::from_rank_file(-1, 0),
        Self::from_rank_file(0, 1),
        Self::from_rank_file(0, -1),
    ];

    /// The single steps a bishop slides along
    pub const BISHOP_DIRECTIONS: [BoardSquareOffset; 4] = [
        Self::from_rank_file(1, 1),
        Self::from_rank_file(1, -1),
        Self::from_rank_file(-1, 1),
        Self::from_rank_file(-1, -1),
    ];

    /// The moves a white pawn can make to attack
    pub const WHITE_PAWN_ATTACKS: [BoardSquareOffset; 2] =
        [Self::from_rank_file(1, 1), Self::from_rank_file(1, -1)];

    /// The moves a black pawn can make to attack
    pub const BLACK_PAWN_ATTACKS: [BoardSquareOffset; 2] =
        [Self::from_rank_file(-1, 1), Self::from_rank_file(-1, -1)];

    /// The offsets from which a pawn of the given color attacks
    pub const fn pawn_attacks(color: Color) -> [BoardSquareOffset; 2] {
        match color {
            Color::White => Self::WHITE_PAWN_ATTACKS,
            Color::Black => Self::BLACK_PAWN_ATTACKS,
        }
    }

    /// Produce a new offset from the given rank and file amounts
    ///
    /// In debug mode, we assert that the rank and file are both on the interval [-7,7] (which are
    /// the only possible offsets).
    pub const fn from_rank_file(rank: i8, file: i8) -> Self {
        debug_assert!(-8 < rank && rank < 8);
        debug_assert!(-8 < file && file < 8);
        Self(((rank as u8) << 4) & 0xF0 | (file as u8) & 0x0F)
    }

    /// Offset the given board square
    ///
    /// If the square is already invalid, then the same square is returned unchanged.
    pub const fn offset(self, square: BoardSquare) -> BoardSquare {
        if square.is_valid() {
            BoardSquare(((self.0 & 0x77) + square.0) ^ (self.0 & 0x88))
        } else {
            square
        }
    }
}
impl fmt::Debug for BoardSquareOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardSquareOffset")
            .field("rank", &((self.0 as i8) >> 4))
            .field("file", &((self.0 as i8) << 4 >> 4))
            .finish()
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("not a move in UCI notation (expected something like `e2e4` or `e7e8q`)")]
pub struct UciMoveParseError;

/// A move written the way UCI writes them: where the piece starts, where it ends, and what it
/// promotes into
///
/// This carries no information about which piece is moving, so it only means something against
/// the position it was written for.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct UciMove {
    pub source: BoardSquare,
    pub target: BoardSquare,
    pub promotion: Option<PieceKind>,
}
impl UciMove {
    pub const fn new(source: BoardSquare, target: BoardSquare) -> Self {
        Self {
            source,
            target,
            promotion: None,
        }
    }

    pub const fn promoting(self, kind: PieceKind) -> Self {
        Self {
            promotion: Some(kind),
            ..self
        }
    }
}
impl fmt::Debug for UciMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UciMove({self})")
    }
}
impl fmt::Display for UciMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.source, self.target)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.fen_letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}
/// Parses a lowercase UCI move
///
/// ```
/// use board::{BoardSquare, PieceKind, UciMove};
/// assert_eq!(
///     "e7e8q".parse::<UciMove>().unwrap(),
///     UciMove::new(BoardSquare::E7, BoardSquare::E8).promoting(PieceKind::Queen),
/// );
/// assert!("e2e2".parse::<UciMove>().is_err());
/// assert!("e7e8k".parse::<UciMove>().is_err());
/// ```
impl FromStr for UciMove {
    type Err = UciMoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_ascii() {
            return Err(UciMoveParseError);
        }
        let promotion = match s.len() {
            4 => None,
            5 => match PieceKind::from_fen_letter(s.as_bytes()[4] as char) {
                Some(kind) if kind.is_promotable() && s.as_bytes()[4].is_ascii_lowercase() => {
                    Some(kind)
                }
                _ => return Err(UciMoveParseError),
            },
            _ => return Err(UciMoveParseError),
        };
        let source = s[0..2].parse().map_err(|_| UciMoveParseError)?;
        let target = s[2..4].parse().map_err(|_| UciMoveParseError)?;
        // UCI spells the null move `0000`; a piece never moves onto its own square
        if source == target {
            return Err(UciMoveParseError);
        }
        Ok(Self {
            source,
            target,
            promotion,
        })
    }
}

/// The possible outcomes of a game
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    /// The side to move is in check and has no legal moves
    Checkmate { winner: Color },
    /// The side to move is not in check and has no legal moves
    Stalemate,
    /// Neither side has enough material left to deliver mate
    InsufficientMaterial,
    /// 75 moves by each side without a capture or a pawn move
    SeventyFiveMoves,
    /// The same position occurred five times
    FivefoldRepetition,
    /// The rules say the game is over, but not for any of the reasons above
    Unclassified,
}
impl GameOutcome {
    /// The side that won, if this outcome has a winner
    pub const fn winner(self) -> Option<Color> {
        match self {
            Self::Checkmate { winner } => Some(winner),
            _ => None,
        }
    }

    /// Whether this outcome is a draw
    ///
    /// [`Self::Unclassified`] is neither a win nor a draw: we don't know what it is.
    pub const fn is_draw(self) -> bool {
        matches!(
            self,
            Self::Stalemate
                | Self::InsufficientMaterial
                | Self::SeventyFiveMoves
                | Self::FivefoldRepetition
        )
    }
}
impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkmate { winner } => write!(f, "Checkmate: {winner} wins."),
            Self::Stalemate => f.write_str("Draw by stalemate."),
            Self::InsufficientMaterial => f.write_str("Draw by insufficient material."),
            Self::SeventyFiveMoves => f.write_str("Draw by the 75-move rule."),
            Self::FivefoldRepetition => f.write_str("Draw by fivefold repetition."),
            Self::Unclassified => f.write_str("Game over."),
        }
    }
}

/// Functionality belonging to all boards that can be made
///
/// A board owns the position and every rule of the game. Callers never look inside it: they ask
/// it for legal moves, hand it moves to make, and query it for the end of the game.
pub trait Board: Sized {
    /// An error type that can be returned
    type Err: error::Error;

    /// Parse a board from the given FEN
    fn from_fen(fen: &str) -> Result<Self, Self::Err>;

    /// Convert to a FEN string
    fn to_fen(&self) -> String;

    /// Get the state at the start of a chess game
    fn initial_state() -> Self;

    /// The side whose turn it is
    fn side_to_move(&self) -> Color;

    /// Every move the side to move may legally make
    fn legal_moves(&self) -> Vec<UciMove>;

    /// Whether the given move captures a piece (including en passant)
    fn is_capture(&self, mv: UciMove) -> bool;

    /// Make the given move, in place
    ///
    /// Returns `Err(..)`, leaving the board unchanged, if the move isn't one of
    /// [`Self::legal_moves`].
    fn make_move(&mut self, mv: UciMove) -> Result<(), Self::Err>;

    /// Make the board after the given sequence of moves
    fn from_move_sequence(moves: impl IntoIterator<Item = UciMove>) -> Result<Self, Self::Err> {
        let mut state = Self::initial_state();
        for m in moves {
            state.make_move(m)?;
        }
        Ok(state)
    }

    /// Find the legal move written by `token`, if there is one
    fn parse_move_token(&self, token: &str) -> Option<UciMove> {
        let mv = token.parse::<UciMove>().ok()?;
        self.legal_moves().into_iter().find(|legal| *legal == mv)
    }

    /// The side to move is in check and has no legal moves
    fn is_checkmate(&self) -> bool;

    /// The side to move isn't in check but has no legal moves
    fn is_stalemate(&self) -> bool;

    /// Neither side has the material to ever deliver checkmate
    fn is_insufficient_material(&self) -> bool;

    /// 150 half-moves have passed without a capture or pawn move, and the game hasn't ended some
    /// other way
    fn is_seventyfive_moves(&self) -> bool;

    /// The current position has occurred at least five times
    fn is_fivefold_repetition(&self) -> bool;

    /// Whether the game has ended for any reason
    fn is_game_over(&self) -> bool {
        self.is_checkmate()
            || self.is_stalemate()
            || self.is_insufficient_material()
            || self.is_seventyfive_moves()
            || self.is_fivefold_repetition()
    }
}
