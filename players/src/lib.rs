//! Traits for an arbitrary player, and for anything watching the game

use board::{Board, Color, GameOutcome, UciMove};

/// A player in a game
///
/// This trait is generic over how the players decides what to do, so terminal and AI players can
/// both implement this. The player doesn't keep its own copy of the game: it's shown the current
/// position every time it's asked to move.
pub trait Player<B: Board> {
    /// Decide on a move to make in the given position
    ///
    /// Returning [`Decision::Move`] doesn't make the move. The caller checks it against the board
    /// and applies it.
    fn make_move(&mut self, board: &B) -> Decision;
}

impl<B: Board, P: Player<B> + ?Sized> Player<B> for &mut P {
    fn make_move(&mut self, board: &B) -> Decision {
        (**self).make_move(board)
    }
}

/// What a player answered when asked for a move
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Play this move
    Move(UciMove),
    /// The player tried to give a move but it wasn't acceptable; ask again
    Rejected(Rejection),
    /// There was nothing to choose from
    NoLegalMoves,
    /// The player's input has ended for good
    InputClosed,
    /// Someone outside the game asked us to stop
    Interrupted,
}

/// Why a move typed by a player wasn't accepted
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Could not parse {token:?}. Use UCI like e2e4 or e7e8q.")]
    MalformedToken { token: String },
    #[error("Illegal move {mv} in the current position.")]
    IllegalInPosition { mv: UciMove },
}

/// How a session came to an end
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The game is over
    Finished(GameOutcome),
    /// The human's input ran out before the game was over
    InputClosed,
    /// The session was interrupted before the game was over
    Interrupted,
}
impl SessionEnd {
    pub const fn outcome(self) -> Option<GameOutcome> {
        match self {
            Self::Finished(outcome) => Some(outcome),
            Self::InputClosed | Self::Interrupted => None,
        }
    }
}

/// Things that happen over the course of a session which someone might want to show
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent<'a> {
    /// The game is about to start from this position
    Started { fen: &'a str, bot_side: Color },
    /// The requested starting position couldn't be used, so the standard one is used instead
    StartingPositionRejected { fen: &'a str, reason: String },
    /// The human's move wasn't accepted
    MoveRejected(&'a Rejection),
    /// The bot picked a move, which has now been played
    BotMoved { side: Color, mv: UciMove },
    /// A move was made, leaving the board in this position
    PositionChanged { fen: &'a str },
    /// The session is over
    Finished(&'a SessionEnd),
}

/// Someone watching the game
pub trait Spectator {
    fn on_event(&mut self, event: &GameEvent<'_>);
}

impl<S: Spectator + ?Sized> Spectator for &mut S {
    fn on_event(&mut self, event: &GameEvent<'_>) {
        (**self).on_event(event)
    }
}
