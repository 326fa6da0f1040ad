use board::{Board, Color, GameOutcome, UciMove};
use players::{Decision, GameEvent, Player, SessionEnd, Spectator};

use crate::termination::{classify, GameStatus, TerminalSignals};

/// Something went wrong which means the game can't be trusted anymore
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("the board refused {mv} after it was checked against the current position: {reason}")]
    MoveRefused { mv: UciMove, reason: String },
}

/// Which side each participant plays
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sides {
    pub human: Color,
    pub bot: Color,
}

/// One game between the human and the bot
#[derive(Clone, Debug)]
pub struct GameSession<B> {
    sides: Sides,
    position: B,
    status: GameStatus,
}

impl<B: Board> GameSession<B> {
    /// Set up a game where the bot plays `bot_side`, starting from `fen`
    ///
    /// See [`Self::initialize_position`] for what happens with the FEN.
    pub fn new(bot_side: Color, fen: Option<&str>, spectator: &mut impl Spectator) -> Self {
        Self {
            sides: Self::assign_sides(bot_side),
            position: Self::initialize_position(fen, spectator),
            status: GameStatus::InProgress,
        }
    }

    /// The human gets whichever side the bot doesn't
    pub const fn assign_sides(bot_side: Color) -> Sides {
        Sides {
            human: bot_side.other(),
            bot: bot_side,
        }
    }

    /// The position described by `fen`, or the standard starting position if there isn't one
    ///
    /// A FEN the board can't use isn't fatal. The spectator hears about it and we play from the
    /// standard starting position instead.
    pub fn initialize_position(fen: Option<&str>, spectator: &mut impl Spectator) -> B {
        let Some(fen) = fen.map(str::trim).filter(|fen| !fen.is_empty()) else {
            return B::initial_state();
        };
        match B::from_fen(fen) {
            Ok(position) => position,
            Err(e) => {
                log::warn!("Rejected starting FEN {fen:?}: {e}");
                spectator.on_event(&GameEvent::StartingPositionRejected {
                    fen,
                    reason: e.to_string(),
                });
                B::initial_state()
            }
        }
    }

    /// The current position
    pub const fn position(&self) -> &B {
        &self.position
    }

    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// Check whether the game has ended, returning the outcome if it has
    ///
    /// Once the game has ended, it stays ended.
    fn update_status(&mut self) -> Option<GameOutcome> {
        if !self.status.is_terminated() {
            self.status = classify(&TerminalSignals::query(&self.position));
        }
        self.status.outcome()
    }

    /// Make a move which has already been checked against the current position
    fn apply(&mut self, mv: UciMove) -> Result<(), BackendError> {
        self.position
            .make_move(mv)
            .map_err(|e| BackendError::MoveRefused {
                mv,
                reason: e.to_string(),
            })
    }
}

/// A backend which queries moves from the two players until the game is done
#[derive(Debug)]
pub struct Backend<B, Human, Bot, S> {
    session: GameSession<B>,
    human: Human,
    bot: Bot,
    spectator: S,
}

impl<B, Human, Bot, S> Backend<B, Human, Bot, S>
where
    B: Board,
    Human: Player<B>,
    Bot: Player<B>,
    S: Spectator,
{
    pub const fn new(session: GameSession<B>, human: Human, bot: Bot, spectator: S) -> Self {
        Self {
            session,
            human,
            bot,
            spectator,
        }
    }

    /// Get the state of the game right now
    pub const fn session(&self) -> &GameSession<B> {
        &self.session
    }

    /// Play the game until it ends, or until the human stops answering
    ///
    /// Errors only come from the board contradicting itself. Everything the human can do wrong is
    /// handled by asking again.
    pub fn run(&mut self) -> Result<SessionEnd, BackendError> {
        let fen = self.session.position.to_fen();
        let bot_side = self.session.sides.bot;
        log::info!("Starting game from {fen}, bot plays {bot_side}");
        self.spectator
            .on_event(&GameEvent::Started { fen: &fen, bot_side });
        let end = self.play()?;
        log::info!("Session over: {end:?}");
        self.spectator.on_event(&GameEvent::Finished(&end));
        Ok(end)
    }

    fn play(&mut self) -> Result<SessionEnd, BackendError> {
        if let Some(outcome) = self.session.update_status() {
            return Ok(SessionEnd::Finished(outcome));
        }
        loop {
            let side = self.session.position.side_to_move();
            let by_bot = side == self.session.sides.bot;
            let decision = if by_bot {
                self.bot.make_move(&self.session.position)
            } else {
                self.human.make_move(&self.session.position)
            };
            match decision {
                Decision::Move(mv) => {
                    self.session.apply(mv)?;
                    if by_bot {
                        self.spectator
                            .on_event(&GameEvent::BotMoved { side, mv });
                    }
                    let fen = self.session.position.to_fen();
                    self.spectator
                        .on_event(&GameEvent::PositionChanged { fen: &fen });
                    if let Some(outcome) = self.session.update_status() {
                        return Ok(SessionEnd::Finished(outcome));
                    }
                }
                Decision::Rejected(rejection) => {
                    self.spectator
                        .on_event(&GameEvent::MoveRejected(&rejection));
                }
                Decision::NoLegalMoves => {
                    return Ok(SessionEnd::Finished(self.no_legal_moves(side)));
                }
                Decision::InputClosed => return Ok(SessionEnd::InputClosed),
                Decision::Interrupted => return Ok(SessionEnd::Interrupted),
            }
        }
    }

    /// A player found nothing to play, so the game must be over
    fn no_legal_moves(&mut self, side: Color) -> GameOutcome {
        self.session.update_status().unwrap_or_else(|| {
            log::error!("{side} has no legal moves, but the board doesn't say the game is over");
            self.session.status = GameStatus::Terminated(GameOutcome::Unclassified);
            GameOutcome::Unclassified
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use bitboard::GameState;
    use monke::MonkePlayer;
    use players::Rejection;
    use terminal_ui::{ChannelLineSource, InputLine, ReaderLineSource, TerminalUIPlayer};

    const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// An owned copy of a [`GameEvent`]
    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Seen {
        Started(String, Color),
        StartingPositionRejected(String),
        MoveRejected(Rejection),
        BotMoved(Color, UciMove),
        PositionChanged(String),
        Finished(SessionEnd),
    }

    #[derive(Debug, Default)]
    struct Recorder(Vec<Seen>);

    impl Spectator for Recorder {
        fn on_event(&mut self, event: &GameEvent<'_>) {
            self.0.push(match *event {
                GameEvent::Started { fen, bot_side } => Seen::Started(fen.to_string(), bot_side),
                GameEvent::StartingPositionRejected { fen, .. } => {
                    Seen::StartingPositionRejected(fen.to_string())
                }
                GameEvent::MoveRejected(rejection) => Seen::MoveRejected(rejection.clone()),
                GameEvent::BotMoved { side, mv } => Seen::BotMoved(side, mv),
                GameEvent::PositionChanged { fen } => Seen::PositionChanged(fen.to_string()),
                GameEvent::Finished(end) => Seen::Finished(*end),
            });
        }
    }

    /// A player who gives the same answers every game
    struct Scripted(Vec<Decision>);

    impl<B: Board> Player<B> for Scripted {
        fn make_move(&mut self, _board: &B) -> Decision {
            if self.0.is_empty() {
                Decision::InputClosed
            } else {
                self.0.remove(0)
            }
        }
    }

    fn human(input: &str) -> TerminalUIPlayer<ReaderLineSource<Cursor<String>>, Vec<u8>> {
        TerminalUIPlayer::with_output(
            ReaderLineSource::new(Cursor::new(input.to_string())),
            Vec::new(),
        )
    }

    fn uci(mv: &str) -> UciMove {
        mv.parse().unwrap()
    }

    /// Play a game between the scripted human and a seeded bot
    fn play<H: Player<GameState>>(
        bot_side: Color,
        fen: Option<&str>,
        human: H,
    ) -> (Result<SessionEnd, BackendError>, GameSession<GameState>, Vec<Seen>) {
        let mut recorder = Recorder::default();
        let session = GameSession::new(bot_side, fen, &mut recorder);
        let mut backend = Backend::new(session, human, MonkePlayer::seeded(1), &mut recorder);
        let result = backend.run();
        let session = backend.session().clone();
        drop(backend);
        (result, session, recorder.0)
    }

    #[test]
    fn test_sides_are_opposite() {
        for bot in [Color::White, Color::Black] {
            let sides = GameSession::<GameState>::assign_sides(bot);
            assert_eq!(sides.bot, bot);
            assert_eq!(sides.human, bot.other());
        }
    }

    #[test]
    fn test_empty_fen_is_standard() {
        for fen in [None, Some(""), Some("   ")] {
            let mut recorder = Recorder::default();
            let position = GameSession::<GameState>::initialize_position(fen, &mut recorder);
            assert_eq!(position.to_fen(), INITIAL_FEN);
            assert!(recorder.0.is_empty());
        }
    }

    #[test]
    fn test_garbage_fen_falls_back() {
        let mut recorder = Recorder::default();
        let session = GameSession::<GameState>::new(Color::White, Some("garbage"), &mut recorder);
        assert_eq!(session.position().to_fen(), INITIAL_FEN);
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(
            recorder.0,
            [Seen::StartingPositionRejected("garbage".to_string())]
        );

        // The game then goes on from the standard start
        let (result, session, seen) = play(Color::Black, Some("garbage"), human("e2e4\n"));
        assert_eq!(result.unwrap(), SessionEnd::InputClosed);
        assert_eq!(
            seen[..3],
            [
                Seen::StartingPositionRejected("garbage".to_string()),
                Seen::Started(INITIAL_FEN.to_string(), Color::Black),
                Seen::PositionChanged(
                    "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".to_string()
                ),
            ]
        );
        assert!(matches!(seen[3], Seen::BotMoved(Color::Black, _)));
        assert_eq!(seen.last(), Some(&Seen::Finished(SessionEnd::InputClosed)));
        assert_eq!(session.position().side_to_move(), Color::White);
    }

    #[test]
    fn test_human_opening_move() {
        let (result, session, seen) = play(Color::Black, None, human("e2e4\n"));
        assert_eq!(result.unwrap(), SessionEnd::InputClosed);
        assert_eq!(seen[0], Seen::Started(INITIAL_FEN.to_string(), Color::Black));
        assert_eq!(
            seen[1],
            Seen::PositionChanged(
                "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".to_string()
            )
        );
        let Seen::BotMoved(Color::Black, bot_move) = seen[2] else {
            panic!("expected the bot to move, saw {:?}", seen[2]);
        };
        assert_eq!(seen[3], Seen::PositionChanged(session.position().to_fen()));
        assert_eq!(seen[4], Seen::Finished(SessionEnd::InputClosed));
        assert_eq!(seen.len(), 5);
        // The bot answered from the position after e4
        assert!(GameState::from_move_sequence([uci("e2e4"), bot_move]).is_ok());
        assert_eq!(session.position().side_to_move(), Color::White);
        assert_eq!(session.status(), GameStatus::InProgress);
    }

    #[test]
    fn test_rejected_moves_are_asked_again() {
        let (result, session, seen) = play(Color::Black, None, human("e2e5\nhello\nE2E4\n"));
        assert_eq!(result.unwrap(), SessionEnd::InputClosed);
        assert_eq!(
            seen[1..4],
            [
                Seen::MoveRejected(Rejection::IllegalInPosition { mv: uci("e2e5") }),
                Seen::MoveRejected(Rejection::MalformedToken {
                    token: "hello".to_string()
                }),
                Seen::PositionChanged(
                    "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".to_string()
                ),
            ]
        );
        // Exactly two plies were made: the human's e4 and the bot's answer
        assert_eq!(session.position().side_to_move(), Color::White);
        assert!(session.position().to_fen().ends_with(" 2"));
    }

    #[test]
    fn test_bot_moves_first_as_white() {
        let (result, session, seen) = play(Color::White, None, human(""));
        assert_eq!(result.unwrap(), SessionEnd::InputClosed);
        assert!(matches!(seen[1], Seen::BotMoved(Color::White, _)));
        assert!(matches!(seen[2], Seen::PositionChanged(_)));
        assert_eq!(seen[3], Seen::Finished(SessionEnd::InputClosed));
        assert_eq!(session.position().side_to_move(), Color::Black);
    }

    #[test]
    fn test_closed_before_any_move() {
        let (result, session, seen) = play(Color::Black, None, human(""));
        assert_eq!(result.unwrap(), SessionEnd::InputClosed);
        assert_eq!(session.position().to_fen(), INITIAL_FEN);
        assert_eq!(
            seen,
            [
                Seen::Started(INITIAL_FEN.to_string(), Color::Black),
                Seen::Finished(SessionEnd::InputClosed),
            ]
        );
    }

    #[test]
    fn test_back_rank_mate_by_human() {
        let (result, session, seen) = play(
            Color::Black,
            Some("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1"),
            human("a1a8\n"),
        );
        let mate = SessionEnd::Finished(GameOutcome::Checkmate {
            winner: Color::White,
        });
        assert_eq!(result.unwrap(), mate);
        assert_eq!(
            session.status(),
            GameStatus::Terminated(GameOutcome::Checkmate {
                winner: Color::White
            })
        );
        assert_eq!(
            seen[1..],
            [
                Seen::PositionChanged("R5k1/5ppp/8/8/8/8/8/6K1 b - - 1 1".to_string()),
                Seen::Finished(mate),
            ]
        );
    }

    #[test]
    fn test_interrupted_mid_game() {
        let (sender, receiver) = std::sync::mpsc::channel();
        sender.send(InputLine::Line("d2d4".to_string())).unwrap();
        sender.send(InputLine::Interrupted).unwrap();
        let human = TerminalUIPlayer::with_output(ChannelLineSource::new(receiver), Vec::new());
        let (result, session, seen) = play(Color::Black, None, human);
        assert_eq!(result.unwrap(), SessionEnd::Interrupted);
        // The position is exactly as the last snapshot showed it
        let Some(Seen::PositionChanged(last_fen)) = seen
            .iter()
            .rev()
            .find(|seen| matches!(seen, Seen::PositionChanged(_)))
        else {
            panic!("no moves were made");
        };
        assert_eq!(&session.position().to_fen(), last_fen);
        assert_eq!(seen.last(), Some(&Seen::Finished(SessionEnd::Interrupted)));
    }

    #[test]
    fn test_terminal_starting_position() {
        let (result, session, seen) =
            play(Color::Black, Some("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1"), human(""));
        let stalemate = SessionEnd::Finished(GameOutcome::Stalemate);
        assert_eq!(result.unwrap(), stalemate);
        assert_eq!(session.position().to_fen(), "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], Seen::Finished(stalemate));
    }

    #[test]
    fn test_refused_move_is_an_error() {
        let mut recorder = Recorder::default();
        let session = GameSession::<GameState>::new(Color::Black, None, &mut recorder);
        let human = Scripted(vec![Decision::Move(uci("e2e5"))]);
        let mut backend = Backend::new(session, human, MonkePlayer::seeded(1), &mut recorder);
        assert!(matches!(
            backend.run(),
            Err(BackendError::MoveRefused { mv, .. }) if mv == uci("e2e5")
        ));
        assert_eq!(backend.session().position().to_fen(), INITIAL_FEN);
    }

    #[test]
    fn test_bots_play_to_the_end() {
        let mut recorder = Recorder::default();
        let session = GameSession::<GameState>::new(Color::Black, None, &mut recorder);
        let mut backend = Backend::new(
            session,
            MonkePlayer::seeded(99),
            MonkePlayer::seeded(100),
            &mut recorder,
        );
        let end = backend.run().unwrap();
        let outcome = end.outcome().expect("two bots never stop answering");
        assert_ne!(outcome, GameOutcome::Unclassified);
        assert!(backend.session().position().is_game_over());
        assert_eq!(backend.session().status(), GameStatus::Terminated(outcome));
    }

    /// A board with no moves that insists the game isn't over
    #[derive(Clone, Debug)]
    struct Stuck;

    #[derive(Debug, thiserror::Error)]
    #[error("stuck boards can't do anything")]
    struct StuckError;

    impl Board for Stuck {
        type Err = StuckError;

        fn from_fen(_fen: &str) -> Result<Self, Self::Err> {
            Err(StuckError)
        }
        fn to_fen(&self) -> String {
            "stuck".to_string()
        }
        fn initial_state() -> Self {
            Stuck
        }
        fn side_to_move(&self) -> Color {
            Color::White
        }
        fn legal_moves(&self) -> Vec<UciMove> {
            Vec::new()
        }
        fn is_capture(&self, _mv: UciMove) -> bool {
            false
        }
        fn make_move(&mut self, _mv: UciMove) -> Result<(), Self::Err> {
            Err(StuckError)
        }
        fn is_checkmate(&self) -> bool {
            false
        }
        fn is_stalemate(&self) -> bool {
            false
        }
        fn is_insufficient_material(&self) -> bool {
            false
        }
        fn is_seventyfive_moves(&self) -> bool {
            false
        }
        fn is_fivefold_repetition(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_no_legal_moves_but_not_over() {
        let mut recorder = Recorder::default();
        let session = GameSession::<Stuck>::new(Color::White, None, &mut recorder);
        let mut backend = Backend::new(
            session,
            Scripted(Vec::new()),
            MonkePlayer::seeded(0),
            &mut recorder,
        );
        let unclassified = SessionEnd::Finished(GameOutcome::Unclassified);
        assert_eq!(backend.run().unwrap(), unclassified);
        assert_eq!(
            backend.session().status(),
            GameStatus::Terminated(GameOutcome::Unclassified)
        );
        drop(backend);
        assert_eq!(
            recorder.0,
            [
                Seen::Started("stuck".to_string(), Color::White),
                Seen::Finished(unclassified),
            ]
        );
    }

    #[test]
    fn test_bad_fen_on_stub_board_falls_back() {
        let mut recorder = Recorder::default();
        GameSession::<Stuck>::new(Color::White, Some("anything"), &mut recorder);
        assert_eq!(
            recorder.0,
            [Seen::StartingPositionRejected("anything".to_string())]
        );
    }
}
