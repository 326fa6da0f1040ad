//! Runs a game between a human and a bot, from the first move to the outcome

mod session;
pub mod termination;

pub use session::{Backend, BackendError, GameSession, Sides};
pub use termination::{classify, GameStatus, TerminalSignals};
