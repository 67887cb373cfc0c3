//! Rules for best-of-N rock-paper-scissors.

use super::types::{Choice, Round, RpsMove, RpsState};
use crate::games::common::{BaseState, GameResult, Player, PlayerId, Winner};
use crate::games::rules::{GameOptions, GameRules, MoveError};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Stateless rock-paper-scissors rules engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpsRules;

impl RpsRules {
    /// Decides a round between the first and second seat.
    pub fn resolve(players: &[Player], first: Choice, second: Choice) -> Winner {
        let seat_winner = match first.versus(second) {
            Ordering::Greater => players.first(),
            Ordering::Less => players.get(1),
            Ordering::Equal => None,
        };
        seat_winner
            .map(|p| Winner::Player(p.id))
            .unwrap_or(Winner::Draw)
    }
}

impl GameRules for RpsRules {
    type State = RpsState;
    type Move = RpsMove;

    #[instrument(skip(self, players, options), fields(max_rounds = options.max_rounds))]
    fn initial_state(
        &self,
        id: String,
        players: [Player; 2],
        options: &GameOptions,
        at: DateTime<Utc>,
    ) -> RpsState {
        let max_rounds = options.max_rounds.max(1);
        let scores: BTreeMap<PlayerId, u32> = players.iter().map(|p| (p.id, 0)).collect();
        let opener = players[0].id;

        RpsState {
            base: BaseState::new(id, players.to_vec(), opener, at),
            rounds: vec![Round::default(); max_rounds],
            current_round: 0,
            max_rounds,
            scores,
        }
    }

    #[instrument(skip(self, state), fields(game_id = %state.base.id, round = state.current_round))]
    fn check_move(&self, state: &RpsState, _mv: &RpsMove, player: PlayerId) -> Result<(), MoveError> {
        if !state.base.is_playing() {
            return Err(MoveError::GameNotPlaying(state.base.status));
        }
        if !state.base.has_player(player) {
            return Err(MoveError::UnknownPlayer(player.to_string()));
        }
        match state.active_round() {
            None => Err(MoveError::RoundsExhausted),
            Some(round) if round.is_resolved() => Err(MoveError::RoundsExhausted),
            Some(_) if state.has_chosen(player) => Err(MoveError::AlreadyChose(player)),
            Some(_) if player != state.base.current_player_id => Err(MoveError::NotYourTurn(player)),
            Some(_) => Ok(()),
        }
    }

    #[instrument(skip(self, state), fields(game_id = %state.base.id, round = state.current_round))]
    fn apply_move(
        &self,
        state: &RpsState,
        mv: &RpsMove,
        player: PlayerId,
        at: DateTime<Utc>,
    ) -> Result<RpsState, MoveError> {
        self.check_move(state, mv, player)?;
        let seat = state
            .base
            .seat_of(player)
            .ok_or_else(|| MoveError::UnknownPlayer(player.to_string()))?;

        let mut next = state.clone();
        let index = next.current_round;
        let round = next
            .rounds
            .get_mut(index)
            .ok_or(MoveError::RoundsExhausted)?;
        round.set_choice_for_seat(seat, mv.choice);

        match (round.player1_choice, round.player2_choice) {
            (Some(first), Some(second)) => {
                let winner = Self::resolve(&state.base.players, first, second);
                round.winner = Some(winner);
                if let Winner::Player(id) = winner {
                    *next.scores.entry(id).or_insert(0) += 1;
                }
                next.current_round += 1;
                next.base.current_player_id = next.base.first_player_id();
                debug!(round = index, %first, %second, %winner, "Round resolved");
            }
            _ => {
                next.base.current_player_id = state.base.opponent_of(player).unwrap_or(player);
                debug!(round = index, %player, "Choice recorded, waiting for opponent");
            }
        }

        next.base.updated_at = at;
        Ok(next)
    }

    #[instrument(skip(self, state), fields(game_id = %state.base.id))]
    fn check_game_end(&self, state: &RpsState) -> Option<GameResult> {
        if state.current_round < state.max_rounds {
            return None;
        }
        let first = state.base.players.first()?.id;
        let second = state.base.players.get(1)?.id;
        let (a, b) = (state.score(first), state.score(second));

        let result = match a.cmp(&b) {
            Ordering::Greater => GameResult::new(Winner::Player(first), format!("Won {}-{}", a, b)),
            Ordering::Less => GameResult::new(Winner::Player(second), format!("Won {}-{}", b, a)),
            Ordering::Equal => GameResult::new(Winner::Draw, format!("Tied {}-{}", a, b)),
        };
        Some(result)
    }

    fn valid_moves(&self, state: &RpsState, player: PlayerId) -> Vec<RpsMove> {
        let open = state.base.is_playing()
            && state.base.has_player(player)
            && state.base.current_player_id == player
            && state.active_round().is_some_and(|r| !r.is_resolved())
            && !state.has_chosen(player);
        if !open {
            return Vec::new();
        }
        Choice::ALL.iter().copied().map(RpsMove::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state() -> RpsState {
        RpsRules.initial_state(
            "r1".to_string(),
            [Player::human("Alice"), Player::agent("AI")],
            &GameOptions::default(),
            Utc::now(),
        )
    }

    fn play(state: &RpsState, player: PlayerId, choice: Choice) -> RpsState {
        RpsRules
            .apply_move(state, &RpsMove::new(choice), player, Utc::now())
            .unwrap()
    }

    #[test]
    fn test_beats_relation_is_cyclic() {
        assert!(Choice::Rock.beats(Choice::Scissors));
        assert!(Choice::Scissors.beats(Choice::Paper));
        assert!(Choice::Paper.beats(Choice::Rock));
        for c in Choice::ALL {
            assert!(!c.beats(c));
            assert!(c.counter().beats(c));
        }
    }

    #[test]
    fn test_first_choice_hands_turn_to_opponent() {
        let state = play(&new_state(), PlayerId::Player1, Choice::Rock);
        assert_eq!(state.current_round, 0);
        assert_eq!(state.base.current_player_id, PlayerId::Ai);
        assert_eq!(state.rounds[0].winner, None);
    }

    #[test]
    fn test_second_choice_resolves_and_resets_turn() {
        let state = play(&new_state(), PlayerId::Player1, Choice::Rock);
        let state = play(&state, PlayerId::Ai, Choice::Scissors);
        assert_eq!(state.current_round, 1);
        assert_eq!(state.rounds[0].winner, Some(Winner::Player(PlayerId::Player1)));
        assert_eq!(state.score(PlayerId::Player1), 1);
        assert_eq!(state.base.current_player_id, PlayerId::Player1);
    }

    #[test]
    fn test_cannot_choose_twice_in_a_round() {
        let state = play(&new_state(), PlayerId::Player1, Choice::Rock);
        let result = RpsRules.check_move(&state, &RpsMove::new(Choice::Paper), PlayerId::Player1);
        assert_eq!(result, Err(MoveError::AlreadyChose(PlayerId::Player1)));
    }

    #[test]
    fn test_second_seat_cannot_open_a_round() {
        let state = new_state();
        let result = RpsRules.check_move(&state, &RpsMove::new(Choice::Rock), PlayerId::Ai);
        assert_eq!(result, Err(MoveError::NotYourTurn(PlayerId::Ai)));
        assert!(RpsRules.valid_moves(&state, PlayerId::Ai).is_empty());

        let state = play(&play(&state, PlayerId::Player1, Choice::Rock), PlayerId::Ai, Choice::Paper);
        let result = RpsRules.check_move(&state, &RpsMove::new(Choice::Rock), PlayerId::Ai);
        assert_eq!(result, Err(MoveError::NotYourTurn(PlayerId::Ai)));
    }

    #[test]
    fn test_no_result_before_last_round() {
        let state = play(&new_state(), PlayerId::Player1, Choice::Rock);
        let state = play(&state, PlayerId::Ai, Choice::Rock);
        assert_eq!(RpsRules.check_game_end(&state), None);
    }
}
