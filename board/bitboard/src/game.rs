use board::{Board, Color, UciMove};

use crate::{BitboardRepresentation, DetailedMove, Error, Result};

/// A position together with the positions that led to it
///
/// Only the positions since the last capture or pawn move are kept, since nothing before them can
/// ever come back.
#[derive(Clone, Debug)]
pub struct GameState {
    board: BitboardRepresentation,
    /// Repetition keys of every position since the last irreversible move, including the current
    /// one
    history: Vec<BitboardRepresentation>,
}

impl GameState {
    pub fn new(board: BitboardRepresentation) -> Self {
        let history = vec![board.repetition_key()];
        Self { board, history }
    }

    /// How many times the current position has occurred
    pub fn repetitions(&self) -> usize {
        let Some(current) = self.history.last() else {
            return 0;
        };
        self.history.iter().filter(|key| *key == current).count()
    }

    fn detail(&self, mv: UciMove) -> Option<DetailedMove> {
        self.board
            .legal_moves()
            .into_iter()
            .find(|legal| UciMove::from(*legal) == mv)
    }
}

impl Board for GameState {
    type Err = Error;

    fn from_fen(fen: &str) -> Result<Self> {
        Ok(Self::new(BitboardRepresentation::from_fen(fen)?))
    }

    fn to_fen(&self) -> String {
        self.board.to_fen()
    }

    fn initial_state() -> Self {
        Self::new(BitboardRepresentation::INITIAL_STATE)
    }

    fn side_to_move(&self) -> Color {
        self.board.side_to_move
    }

    fn legal_moves(&self) -> Vec<UciMove> {
        self.board
            .legal_moves()
            .into_iter()
            .map(UciMove::from)
            .collect()
    }

    fn is_capture(&self, mv: UciMove) -> bool {
        self.detail(mv).is_some_and(|mv| mv.is_capture)
    }

    fn make_move(&mut self, mv: UciMove) -> Result<()> {
        let detailed = self.detail(mv).ok_or(Error::IllegalMove(mv))?;
        self.board.do_move(detailed);
        if self.board.halfmove_clock == 0 {
            self.history.clear();
        }
        self.history.push(self.board.repetition_key());
        Ok(())
    }

    fn is_checkmate(&self) -> bool {
        self.board.is_check(self.board.side_to_move) && self.board.legal_moves().is_empty()
    }

    fn is_stalemate(&self) -> bool {
        !self.board.is_check(self.board.side_to_move) && self.board.legal_moves().is_empty()
    }

    fn is_insufficient_material(&self) -> bool {
        self.board.is_insufficient_material()
    }

    fn is_seventyfive_moves(&self) -> bool {
        self.board.halfmove_clock >= 150 && !self.board.legal_moves().is_empty()
    }

    fn is_fivefold_repetition(&self) -> bool {
        self.repetitions() >= 5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(moves: &str) -> GameState {
        GameState::from_move_sequence(
            moves
                .split_whitespace()
                .map(|mv| mv.parse().expect("test moves should be valid UCI")),
        )
        .expect("test moves should be legal")
    }

    #[test]
    fn test_fools_mate() {
        let game = play("f2f3 e7e5 g2g4 d8h4");
        assert!(game.is_checkmate());
        assert!(!game.is_stalemate());
        assert!(game.is_game_over());
        assert_eq!(game.side_to_move(), Color::White);
    }

    #[test]
    fn test_stalemate() {
        let game = GameState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(game.is_stalemate());
        assert!(!game.is_checkmate());
        assert!(game.legal_moves().is_empty());
        assert!(game.is_game_over());
    }

    #[test]
    fn test_bare_kings() {
        let game = GameState::from_fen("8/8/8/4k3/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(game.is_insufficient_material());
        assert!(game.is_game_over());
        assert!(!game.legal_moves().is_empty());
    }

    #[test]
    fn test_seventy_five_moves() {
        let game = GameState::from_fen("8/8/8/4k3/8/8/R7/4K3 w - - 150 100").unwrap();
        assert!(game.is_seventyfive_moves());
        assert!(!game.is_insufficient_material());
        assert!(game.is_game_over());
        let game = GameState::from_fen("8/8/8/4k3/8/8/R7/4K3 w - - 149 100").unwrap();
        assert!(!game.is_seventyfive_moves());
        assert!(!game.is_game_over());
    }

    #[test]
    fn test_fivefold_repetition() {
        let shuffle = "g1f3 g8f6 f3g1 f6g8 ";
        let game = play(&shuffle.repeat(3));
        assert_eq!(game.repetitions(), 4);
        assert!(!game.is_fivefold_repetition());
        let game = play(&shuffle.repeat(4));
        assert_eq!(game.repetitions(), 5);
        assert!(game.is_fivefold_repetition());
        assert!(game.is_game_over());
    }

    #[test]
    fn test_pawn_move_resets_repetitions() {
        let game = play("g1f3 g8f6 f3g1 f6g8 e2e4");
        assert_eq!(game.repetitions(), 1);
    }

    #[test]
    fn test_illegal_move_leaves_board_alone() {
        let mut game = GameState::initial_state();
        let before = game.to_fen();
        let illegal = UciMove::new(board::BoardSquare::E2, board::BoardSquare::E5);
        assert!(matches!(
            game.make_move(illegal),
            Err(Error::IllegalMove(mv)) if mv == illegal
        ));
        assert_eq!(game.to_fen(), before);
    }

    #[test]
    fn test_captures() {
        let game = play("e2e4 d7d5");
        assert!(game.is_capture("e4d5".parse().unwrap()));
        assert!(!game.is_capture("e4e5".parse().unwrap()));
        // Not a legal move at all
        assert!(!game.is_capture("e4e6".parse().unwrap()));
    }

    #[test]
    fn test_double_push_fen_has_no_en_passant() {
        let game = play("e2e4");
        assert_eq!(
            game.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_parse_move_token() {
        let game = GameState::initial_state();
        assert_eq!(
            game.parse_move_token("e2e4"),
            Some(UciMove::new(
                board::BoardSquare::E2,
                board::BoardSquare::E4
            ))
        );
        assert_eq!(game.parse_move_token("e2e5"), None);
        assert_eq!(game.parse_move_token("hello"), None);
    }
}
