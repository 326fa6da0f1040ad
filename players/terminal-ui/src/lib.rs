//! A player for a human typing in the terminal, and the rest of what the human sees

use std::io::{self, Write};

use board::{Board, Color, UciMove};
use players::{Decision, Player, Rejection, SessionEnd};

mod input;
mod spectator;

pub use input::{ChannelLineSource, InputLine, LineSource, ReaderLineSource};
pub use spectator::{write_banner, TerminalSpectator};

const SIDE_PROMPT: &str = "Should the BOT play as White or Black? (w/b): ";
const SIDE_REPROMPT: &str = "Please type 'w' or 'b': ";
const FEN_PROMPT: &str = "Enter a starting FEN or press Enter for the standard start: ";
const MOVE_PROMPT: &str = "Your move (UCI like e2e4, or e7e8q for promotion): ";

/// The answer to "which side does the bot play" wasn't `w` or `b`
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("expected `w` or `b`, not {input:?}")]
pub struct InvalidSideSelection {
    pub input: String,
}

/// Parse which side the bot plays: `w` or `b`, in either case
///
/// ```
/// use board::Color;
/// assert_eq!(terminal_ui::parse_bot_side(" W "), Ok(Color::White));
/// assert!(terminal_ui::parse_bot_side("white").is_err());
/// ```
pub fn parse_bot_side(input: &str) -> Result<Color, InvalidSideSelection> {
    match input.trim().to_ascii_lowercase().as_str() {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(InvalidSideSelection {
            input: input.to_string(),
        }),
    }
}

/// Turn what the human typed into a move which is legal on `board`
pub fn interpret_move_token<B: Board>(board: &B, token: &str) -> Result<UciMove, Rejection> {
    let token = token.trim().to_ascii_lowercase();
    let mv = token
        .parse::<UciMove>()
        .map_err(|_| Rejection::MalformedToken {
            token: token.clone(),
        })?;
    board
        .parse_move_token(&token)
        .ok_or(Rejection::IllegalInPosition { mv })
}

/// Show a prompt without a line break and make sure it's visible before blocking on input
fn prompt(output: &mut impl Write, text: &str) {
    if let Err(e) = write!(output, "{text}").and_then(|()| output.flush()) {
        log::warn!("Couldn't show prompt: {e}");
    }
}

/// The session can't go on without an answer
fn unanswered(line: InputLine) -> Result<String, SessionEnd> {
    match line {
        InputLine::Line(line) => Ok(line),
        InputLine::Closed => Err(SessionEnd::InputClosed),
        InputLine::Interrupted => Err(SessionEnd::Interrupted),
    }
}

/// Ask which side the bot should play until we get a usable answer
///
/// Returns `Err(..)` with how the session ended if the input ran out or was interrupted first.
pub fn prompt_bot_side(
    input: &mut impl LineSource,
    output: &mut impl Write,
) -> Result<Color, SessionEnd> {
    prompt(output, SIDE_PROMPT);
    loop {
        let answer = unanswered(input.next_line())?;
        match parse_bot_side(&answer) {
            Ok(color) => return Ok(color),
            Err(e) => {
                log::debug!("Asking again: {e}");
                prompt(output, SIDE_REPROMPT);
            }
        }
    }
}

/// Ask for the FEN to start from, where `None` means the standard starting position
pub fn prompt_starting_fen(
    input: &mut impl LineSource,
    output: &mut impl Write,
) -> Result<Option<String>, SessionEnd> {
    prompt(output, FEN_PROMPT);
    let answer = unanswered(input.next_line())?;
    let fen = answer.trim();
    Ok((!fen.is_empty()).then(|| fen.to_string()))
}

/// An input for a human typing in the terminal
#[derive(Debug)]
pub struct TerminalUIPlayer<S, W = io::Stdout> {
    input: S,
    output: W,
}

impl<S: LineSource> TerminalUIPlayer<S> {
    /// Read moves from `input`, prompting on standard output
    pub fn new(input: S) -> Self {
        Self::with_output(input, io::stdout())
    }
}

impl<S: LineSource, W: Write> TerminalUIPlayer<S, W> {
    pub const fn with_output(input: S, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (S, W) {
        (self.input, self.output)
    }
}

impl<B: Board, S: LineSource, W: Write> Player<B> for TerminalUIPlayer<S, W> {
    fn make_move(&mut self, board: &B) -> Decision {
        if let Err(e) = writeln!(self.output, "{} to move (you).", board.side_to_move()) {
            log::warn!("Couldn't show whose move it is: {e}");
        }
        prompt(&mut self.output, MOVE_PROMPT);
        match self.input.next_line() {
            InputLine::Line(token) => match interpret_move_token(board, &token) {
                Ok(mv) => Decision::Move(mv),
                Err(rejection) => {
                    log::warn!("Rejected move {token:?}: {rejection}");
                    Decision::Rejected(rejection)
                }
            },
            InputLine::Closed => Decision::InputClosed,
            InputLine::Interrupted => Decision::Interrupted,
        }
    }
}
