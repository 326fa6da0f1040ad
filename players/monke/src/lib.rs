//! A player which makes random moves, grabbing material whenever it can

use board::Board;
use players::{Decision, Player};

use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};

/// Choose a move uniformly at random, only looking at captures if there are any
///
/// Returns `None` if there are no moves to choose from.
///
/// ```
/// use rand::{rngs::SmallRng, SeedableRng};
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// assert_eq!(monke::select_move(&[1, 2, 3, 4], |n| n % 4 == 0, &mut rng), Some(4));
/// assert_eq!(monke::select_move::<u8>(&[], |_| true, &mut rng), None);
/// ```
pub fn select_move<M: Clone>(
    legal: &[M],
    is_capture: impl Fn(&M) -> bool,
    rng: &mut impl Rng,
) -> Option<M> {
    let captures = legal
        .iter()
        .filter(|mv| is_capture(mv))
        .cloned()
        .collect::<Vec<_>>();
    log::debug!(
        "choosing from {} captures out of {} legal moves",
        captures.len(),
        legal.len()
    );
    if captures.is_empty() {
        legal.choose(rng).cloned()
    } else {
        captures.choose(rng).cloned()
    }
}

/// A player which makes random moves, except that it always captures when it can
///
/// The name is pronounced like "Monkey"
#[derive(Debug)]
pub struct MonkePlayer<R = SmallRng> {
    /// How we decide what to do
    rng: R,
}

impl MonkePlayer {
    /// Create a new player seeded from the operating system
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }

    /// Create a new player which makes the same choices every time it's given the same seed
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MonkePlayer<R> {
    pub const fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<B: Board, R: Rng> Player<B> for MonkePlayer<R> {
    fn make_move(&mut self, board: &B) -> Decision {
        match select_move(&board.legal_moves(), |mv| board.is_capture(*mv), &mut self.rng) {
            Some(mv) => Decision::Move(mv),
            None => Decision::NoLegalMoves,
        }
    }
}

impl Default for MonkePlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bitboard::GameState;
    use board::UciMove;
    use quickcheck::quickcheck;

    quickcheck! {
        fn test_never_invents_moves(legal: Vec<u16>, seed: u64) -> bool {
            let mut rng = SmallRng::seed_from_u64(seed);
            match select_move(&legal, |mv| mv % 3 == 0, &mut rng) {
                Some(mv) => legal.contains(&mv),
                None => legal.is_empty(),
            }
        }

        fn test_captures_when_it_can(legal: Vec<u16>, seed: u64) -> bool {
            let mut rng = SmallRng::seed_from_u64(seed);
            let is_capture = |mv: &u16| mv % 3 == 0;
            let any_capture = legal.iter().any(is_capture);
            match select_move(&legal, is_capture, &mut rng) {
                Some(mv) => is_capture(&mv) == any_capture,
                None => legal.is_empty(),
            }
        }

        fn test_same_seed_same_choice(legal: Vec<u16>, seed: u64) -> bool {
            let first = select_move(&legal, |_| false, &mut SmallRng::seed_from_u64(seed));
            let second = select_move(&legal, |_| false, &mut SmallRng::seed_from_u64(seed));
            first == second
        }
    }

    #[test]
    fn test_every_move_can_be_chosen() {
        let legal = [0u8, 1, 2, 3];
        let mut seen = [false; 4];
        let mut rng = SmallRng::seed_from_u64(0);
        for _ in 0..200 {
            let mv = select_move(&legal, |_| false, &mut rng).unwrap();
            seen[mv as usize] = true;
        }
        assert_eq!(seen, [true; 4]);
    }

    #[test]
    fn test_always_takes_the_only_capture() {
        // After 1. e4 d5 the only capture is exd5
        let board = GameState::from_move_sequence(
            ["e2e4", "d7d5"]
                .into_iter()
                .map(|mv| mv.parse::<UciMove>().unwrap()),
        )
        .unwrap();
        let mut player = MonkePlayer::seeded(12);
        for _ in 0..20 {
            assert_eq!(
                player.make_move(&board),
                Decision::Move("e4d5".parse().unwrap())
            );
        }
    }

    #[test]
    fn test_no_legal_moves() {
        let board = GameState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(
            MonkePlayer::seeded(0).make_move(&board),
            Decision::NoLegalMoves
        );
    }

    #[test]
    fn test_plays_legal_moves_all_game() {
        let mut board = GameState::initial_state();
        let mut player = MonkePlayer::seeded(2024);
        for _ in 0..60 {
            match player.make_move(&board) {
                Decision::Move(mv) => {
                    assert!(board.legal_moves().contains(&mv));
                    board.make_move(mv).unwrap();
                }
                Decision::NoLegalMoves => {
                    assert!(board.is_game_over());
                    break;
                }
                other => panic!("unexpected decision {other:?}"),
            }
        }
    }
}
