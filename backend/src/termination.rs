//! Deciding whether, and how, a game has ended

use board::{Board, Color, GameOutcome};

/// Everything the board says about the end of the game, gathered in one place
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminalSignals {
    pub checkmate: bool,
    pub stalemate: bool,
    pub insufficient_material: bool,
    pub seventy_five_moves: bool,
    pub fivefold_repetition: bool,
    pub game_over: bool,
    pub side_to_move: Color,
}

impl TerminalSignals {
    /// Ask the board about every way the game could have ended
    pub fn query<B: Board>(board: &B) -> Self {
        Self {
            checkmate: board.is_checkmate(),
            stalemate: board.is_stalemate(),
            insufficient_material: board.is_insufficient_material(),
            seventy_five_moves: board.is_seventyfive_moves(),
            fivefold_repetition: board.is_fivefold_repetition(),
            game_over: board.is_game_over(),
            side_to_move: board.side_to_move(),
        }
    }
}

/// Whether the game is still going
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Terminated(GameOutcome),
}

impl GameStatus {
    pub const fn outcome(self) -> Option<GameOutcome> {
        match self {
            Self::InProgress => None,
            Self::Terminated(outcome) => Some(outcome),
        }
    }

    pub const fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated(_))
    }
}

type Rule = (fn(&TerminalSignals) -> bool, fn(&TerminalSignals) -> GameOutcome);

/// Checked in order, and the first that applies decides the outcome
const RULES: [Rule; 6] = [
    // The side to move is the one that got mated
    (
        |signals| signals.checkmate,
        |signals| GameOutcome::Checkmate {
            winner: signals.side_to_move.other(),
        },
    ),
    (|signals| signals.stalemate, |_| GameOutcome::Stalemate),
    (
        |signals| signals.insufficient_material,
        |_| GameOutcome::InsufficientMaterial,
    ),
    (
        |signals| signals.seventy_five_moves,
        |_| GameOutcome::SeventyFiveMoves,
    ),
    (
        |signals| signals.fivefold_repetition,
        |_| GameOutcome::FivefoldRepetition,
    ),
    (|signals| signals.game_over, |_| GameOutcome::Unclassified),
];

/// Turn the signals into the outcome of the game, if it's over
pub fn classify(signals: &TerminalSignals) -> GameStatus {
    RULES
        .iter()
        .find(|(applies, _)| applies(signals))
        .map_or(GameStatus::InProgress, |(_, outcome)| {
            GameStatus::Terminated(outcome(signals))
        })
}
