use core::{
    fmt,
    ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not},
};

use board::{BoardSquare, BoardSquareOffset, Piece, PieceKind};

/// A bitboard (which is equivalent to a `u64`)
///
/// Bit `rank * 8 + file` is set when the square is in the set, so bit 0 is a1 and bit 63 is h8.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Bitboard(pub u64);

impl Bitboard {
    /// The squares of the same color as h1
    pub const LIGHT_SQUARES: Self = Self(0x55AA_55AA_55AA_55AA);
    /// The squares of the same color as a1
    pub const DARK_SQUARES: Self = Self(0xAA55_AA55_AA55_AA55);

    /// Create an empty bitboard
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Produce a bitboard from the given board square.
    ///
    /// If the board square is invalid, this return the empty bitboard.
    pub const fn from_board_square(square: BoardSquare) -> Self {
        if square.is_valid() {
            Self(1u64 << ((((square.0 & 0x70) >> 1) | (square.0 & 0x07)) as u64))
        } else {
            Self::empty()
        }
    }

    /// The squares reached by taking exactly one of the given steps from `square`
    pub fn step_attacks(square: BoardSquare, steps: &[BoardSquareOffset]) -> Self {
        steps
            .iter()
            .map(|step| Self::from_board_square(step.offset(square)))
            .fold(Self::empty(), Self::union)
    }

    /// The squares reached by sliding from `square` along each direction until the edge of the
    /// board or the first square in `blockers` (which is included).
    pub fn sliding_attacks(
        square: BoardSquare,
        directions: &[BoardSquareOffset],
        blockers: Self,
    ) -> Self {
        let mut attacked = Self::empty();
        for direction in directions {
            let mut new_square = direction.offset(square);
            while new_square.is_valid() {
                let new_board = Self::from_board_square(new_square);
                attacked |= new_board;
                if blockers.intersects(new_board) {
                    break;
                }
                new_square = direction.offset(new_square);
            }
        }
        attacked
    }

    /// Returns all of the squares threatened by the given piece standing on `square`, with the
    /// given squares blocked by pieces.
    ///
    /// For the purposes of this, we assume that the squares blocked are enemy pieces that we can
    /// capture, so those squares are threatened. Pawns threaten only their capture squares.
    pub fn attacks(square: BoardSquare, piece: Piece, blockers: Self) -> Self {
        match piece.kind {
            PieceKind::King => Self::step_attacks(square, &BoardSquareOffset::KING_MOVES),
            PieceKind::Knight => Self::step_attacks(square, &BoardSquareOffset::KNIGHT_MOVES),
            PieceKind::Pawn => {
                Self::step_attacks(square, &BoardSquareOffset::pawn_attacks(piece.color))
            }
            PieceKind::Bishop => {
                Self::sliding_attacks(square, &BoardSquareOffset::BISHOP_DIRECTIONS, blockers)
            }
            PieceKind::Rook => {
                Self::sliding_attacks(square, &BoardSquareOffset::ROOK_DIRECTIONS, blockers)
            }
            // Break the queen down into a rook and a bishop
            PieceKind::Queen => Self::sliding_attacks(
                square,
                &BoardSquareOffset::ROOK_DIRECTIONS,
                blockers,
            )
            .union(Self::sliding_attacks(
                square,
                &BoardSquareOffset::BISHOP_DIRECTIONS,
                blockers,
            )),
        }
    }
}
/// Ways to query
impl Bitboard {
    /// Query if the bitboard is empty
    ///
    /// ```
    /// use bitboard::Bitboard;
    /// assert!(Bitboard::empty().is_empty());
    /// assert!(!Bitboard(0x01).is_empty());
    /// ```
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if `self & other` is not empty
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if `self & other == other`
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Produce an iterator of all selected board squares from a bitboard, from a1 towards h8
    ///
    /// ```
    /// use board::BoardSquare;
    /// use bitboard::{Bitboard, BitboardRepresentation};
    /// assert_eq!(Bitboard::empty().squares_iter().count(), 0);
    /// assert_eq!(
    ///     BitboardRepresentation::INITIAL_STATE.white_rook.squares_iter().collect::<Vec<_>>(),
    ///     vec![BoardSquare::A1, BoardSquare::H1],
    /// );
    /// assert_eq!(Bitboard(!0).squares_iter().count(), 64);
    /// ```
    pub fn squares_iter(self) -> impl Iterator<Item = BoardSquare> {
        let mut remaining = self.0;
        core::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let idx = remaining.trailing_zeros() as u8;
            remaining &= remaining - 1;
            Some(BoardSquare::from_rank_file(idx >> 3, idx & 0x07))
        })
    }

    /// Returns the number of bits which are set
    pub const fn num_set(self) -> u32 {
        self.0.count_ones()
    }
}

/// Bit-wise operations for combining things
impl Bitboard {
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub const fn negation(self) -> Self {
        Self(!self.0)
    }
}

impl BitOr<Bitboard> for Bitboard {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}
impl BitOr<BoardSquare> for Bitboard {
    type Output = Self;

    fn bitor(self, rhs: BoardSquare) -> Self::Output {
        self.union(Self::from(rhs))
    }
}
impl<T> BitOrAssign<T> for Bitboard
where
    Bitboard: BitOr<T, Output = Bitboard>,
{
    fn bitor_assign(&mut self, rhs: T) {
        *self = *self | rhs
    }
}
impl BitAnd<Bitboard> for Bitboard {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs)
    }
}
impl<T> BitAndAssign<T> for Bitboard
where
    Bitboard: BitAnd<T, Output = Bitboard>,
{
    fn bitand_assign(&mut self, rhs: T) {
        *self = *self & rhs
    }
}
impl Not for Bitboard {
    type Output = Self;
    fn not(self) -> Self::Output {
        self.negation()
    }
}

impl From<BoardSquare> for Bitboard {
    fn from(value: BoardSquare) -> Self {
        Self::from_board_square(value)
    }
}
impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Bitboard")
            .field(&format_args!("{:X}", self.0))
            .finish()
    }
}
/// Display as a TUI version of a grid, with the 8th rank on top
///
/// ```
/// use bitboard::Bitboard;
/// use board::BoardSquare;
///
/// assert_eq!(
///     Bitboard::from(BoardSquare::A1).to_string(),
///     "        \n        \n        \n        \n        \n        \n        \nX       \n",
/// );
/// assert_eq!(
///     Bitboard::from(BoardSquare::H8).to_string(),
///     "       X\n        \n        \n        \n        \n        \n        \n        \n",
/// );
/// ```
impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        for rank in (0..8).rev() {
            for file in 0..8 {
                f.write_char(if self.0 & (1 << (rank * 8 + file)) == 0 {
                    ' '
                } else {
                    'X'
                })?;
            }
            f.write_char('\n')?;
        }
        Ok(())
    }
}
