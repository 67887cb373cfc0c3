//! Rule-of-thumb move selection for both games.

use super::MoveSelector;
use crate::error::GameError;
use crate::games::rps::{Choice, RpsMove, RpsState};
use crate::games::tictactoe::{Board, Position, Symbol, TicTacToeMove, TicTacToeState, check_winner};
use crate::games::{GameMove, GameState, GameStatus, PlayerId};
use crate::sanitize::SanitizedSession;
use crate::session::Difficulty;
use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

/// Stateless heuristic opponent.
///
/// | game | easy | medium | hard |
/// |---|---|---|---|
/// | tic-tac-toe | random cell | win, block, center, random | minimax |
/// | rock-paper-scissors | random | counter last | counter most frequent |
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSelector;

impl HeuristicSelector {
    /// Creates the selector.
    pub fn new() -> Self {
        Self
    }

    /// Chooses a move using the supplied random source.
    ///
    /// # Errors
    ///
    /// [`GameError::Agent`] if the game is over or it is not the agent's turn.
    pub fn select_with<R: Rng + ?Sized>(
        &self,
        session: &SanitizedSession,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<GameMove, GameError> {
        if session.status() != GameStatus::Playing {
            return Err(GameError::agent(format!(
                "Game {} is {}, nothing to play",
                session.id(),
                session.status()
            )));
        }
        match &session.game {
            GameState::TicTacToe(state) => {
                if state.base.current_player_id != PlayerId::Ai {
                    return Err(GameError::agent("Not the agent's turn"));
                }
                select_tictactoe(state, difficulty, rng)
                    .map(GameMove::TicTacToe)
                    .ok_or_else(|| GameError::agent("No empty cell left"))
            }
            GameState::RockPaperScissors(state) => {
                if state.base.current_player_id != PlayerId::Ai {
                    return Err(GameError::agent("Not the agent's turn"));
                }
                if state.has_chosen(PlayerId::Ai) || state.active_round().is_none() {
                    return Err(GameError::agent("No open round for the agent"));
                }
                Ok(GameMove::RockPaperScissors(RpsMove::new(select_rps(
                    state, difficulty, rng,
                ))))
            }
        }
    }
}

#[async_trait]
impl MoveSelector for HeuristicSelector {
    #[instrument(skip(self, session), fields(game_id = %session.id(), game_type = %session.game_type()))]
    async fn choose_move(
        &self,
        session: &SanitizedSession,
        difficulty: Difficulty,
    ) -> Result<GameMove, GameError> {
        let mv = self.select_with(session, difficulty, &mut rand::thread_rng())?;
        debug!(%mv, %difficulty, "Heuristic chose move");
        Ok(mv)
    }
}

fn select_tictactoe<R: Rng + ?Sized>(
    state: &TicTacToeState,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<TicTacToeMove> {
    let me = state.symbol_of(PlayerId::Ai)?;
    let open = Position::empty_on(&state.board);
    let choice = match difficulty {
        Difficulty::Easy => open.choose(rng).copied(),
        Difficulty::Medium => winning_cell(&state.board, me)
            .or_else(|| winning_cell(&state.board, me.opponent()))
            .or_else(|| state.board.is_empty(Position::Center).then_some(Position::Center))
            .or_else(|| open.choose(rng).copied()),
        Difficulty::Hard => best_cell(&state.board, me),
    };
    choice.map(TicTacToeMove::from)
}

/// A cell that completes a line for `symbol`, if any.
fn winning_cell(board: &Board, symbol: Symbol) -> Option<Position> {
    Position::empty_on(board).into_iter().find(|pos| {
        let mut next = board.clone();
        next.set(*pos, symbol);
        matches!(check_winner(&next), Some((winner, _)) if winner == symbol)
    })
}

/// Full-depth minimax. Earlier cells win ties.
fn best_cell(board: &Board, me: Symbol) -> Option<Position> {
    Position::empty_on(board)
        .into_iter()
        .map(|pos| {
            let mut next = board.clone();
            next.set(pos, me);
            (pos, minimax(&next, me, me.opponent(), 1))
        })
        .fold(None, |best: Option<(Position, i32)>, (pos, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((pos, score)),
        })
        .map(|(pos, _)| pos)
}

fn minimax(board: &Board, me: Symbol, to_move: Symbol, depth: i32) -> i32 {
    if let Some((winner, _)) = check_winner(board) {
        return if winner == me { 10 - depth } else { depth - 10 };
    }
    if board.is_full() {
        return 0;
    }
    let scores = Position::empty_on(board).into_iter().map(|pos| {
        let mut next = board.clone();
        next.set(pos, to_move);
        minimax(&next, me, to_move.opponent(), depth + 1)
    });
    if to_move == me {
        scores.max().unwrap_or(0)
    } else {
        scores.min().unwrap_or(0)
    }
}

fn select_rps<R: Rng + ?Sized>(state: &RpsState, difficulty: Difficulty, rng: &mut R) -> Choice {
    let history = opponent_history(state);
    let read = match difficulty {
        Difficulty::Easy => None,
        Difficulty::Medium => history.last().copied(),
        Difficulty::Hard => most_frequent(&history),
    };
    match read {
        Some(expected) => expected.counter(),
        None => Choice::ALL.choose(rng).copied().unwrap_or(Choice::Rock),
    }
}

/// The human's choices in resolved rounds, oldest first.
fn opponent_history(state: &RpsState) -> Vec<Choice> {
    let Some(seat) = state.base.seat_of(PlayerId::Player1) else {
        return Vec::new();
    };
    state
        .rounds
        .iter()
        .filter(|round| round.is_resolved())
        .filter_map(|round| round.choice_for_seat(seat))
        .collect()
}

/// Most frequent choice; on a tie, the one played most recently.
fn most_frequent(history: &[Choice]) -> Option<Choice> {
    Choice::ALL
        .iter()
        .filter_map(|choice| {
            let count = history.iter().filter(|c| *c == choice).count();
            let last_seen = history.iter().rposition(|c| c == choice)?;
            Some((*choice, count, last_seen))
        })
        .max_by_key(|(_, count, last_seen)| (*count, *last_seen))
        .map(|(choice, _, _)| choice)
}
