use std::io::{self, Write};

use players::{GameEvent, SessionEnd, Spectator};

/// Write the title shown when the program starts
pub fn write_banner(output: &mut impl Write) -> io::Result<()> {
    let rule = "=".repeat(60);
    writeln!(output, "{rule}")?;
    writeln!(output, "{:^60}", "Chess Bot v0.1")?;
    writeln!(output, "{rule}")
}

/// Narrates the game to a human, one line per event
#[derive(Debug)]
pub struct TerminalSpectator<W> {
    output: W,
}

impl<W: Write> TerminalSpectator<W> {
    pub const fn new(output: W) -> Self {
        Self { output }
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    fn describe(&mut self, event: &GameEvent<'_>) -> io::Result<()> {
        match event {
            GameEvent::Started { fen, .. } => writeln!(self.output, "Starting FEN: {fen}"),
            GameEvent::StartingPositionRejected { .. } => writeln!(
                self.output,
                "Invalid FEN; starting from the standard setup."
            ),
            GameEvent::MoveRejected(rejection) => {
                writeln!(self.output, "{rejection} Try again.")
            }
            GameEvent::BotMoved { side, mv } => writeln!(self.output, "Bot ({side}) plays: {mv}"),
            GameEvent::PositionChanged { fen } => writeln!(self.output, "Position (FEN): {fen}"),
            GameEvent::Finished(SessionEnd::Finished(outcome)) => {
                writeln!(self.output, "{outcome}")
            }
            GameEvent::Finished(SessionEnd::InputClosed) => writeln!(self.output, "\n(bye)"),
            GameEvent::Finished(SessionEnd::Interrupted) => {
                writeln!(self.output, "\n(interrupted)")
            }
        }?;
        self.output.flush()
    }
}

impl<W: Write> Spectator for TerminalSpectator<W> {
    fn on_event(&mut self, event: &GameEvent<'_>) {
        if let Err(e) = self.describe(event) {
            log::warn!("Couldn't show {event:?}: {e}");
        }
    }
}
