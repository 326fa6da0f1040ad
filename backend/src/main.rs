use std::{io, process::ExitCode};

use backend::{Backend, BackendError, GameSession};
use bitboard::GameState;
use board::Color;
use clap::Parser;
use monke::MonkePlayer;
use players::{GameEvent, SessionEnd, Spectator};
use terminal_ui::{ChannelLineSource, TerminalSpectator, TerminalUIPlayer};

/// Play a game of chess in the terminal against a bot which takes material whenever it can
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// The side the bot plays, `w` or `b` (asked for if not given)
    #[arg(long, value_parser = terminal_ui::parse_bot_side)]
    bot: Option<Color>,

    /// The position to start from, as FEN (asked for if not given; empty means the standard start)
    #[arg(long)]
    fen: Option<String>,

    /// Seed for the bot's choices, to replay the same game
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();
    let args = Args::parse();
    log::debug!("{args:?}");
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Error> {
    terminal_ui::write_banner(&mut io::stdout())?;
    let mut input = ChannelLineSource::stdin()?;
    let mut spectator = TerminalSpectator::new(io::stdout());

    let (bot_side, fen) = match setup(args.bot, args.fen, &mut input) {
        Ok(answers) => answers,
        Err(end) => {
            spectator.on_event(&GameEvent::Finished(&end));
            return Ok(());
        }
    };

    let session = GameSession::<GameState>::new(bot_side, fen.as_deref(), &mut spectator);
    let bot = match args.seed {
        Some(seed) => MonkePlayer::seeded(seed),
        None => MonkePlayer::new(),
    };
    let human = TerminalUIPlayer::new(input);
    Backend::new(session, human, bot, spectator).run()?;
    Ok(())
}

/// Ask whatever the command line didn't say
fn setup(
    bot: Option<Color>,
    fen: Option<String>,
    input: &mut ChannelLineSource,
) -> Result<(Color, Option<String>), SessionEnd> {
    let bot_side = match bot {
        Some(side) => side,
        None => terminal_ui::prompt_bot_side(input, &mut io::stdout())?,
    };
    let fen = match fen {
        Some(fen) => Some(fen),
        None => terminal_ui::prompt_starting_fen(input, &mut io::stdout())?,
    };
    Ok((bot_side, fen))
}
