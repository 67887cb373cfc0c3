//! Rock-paper-scissors domain types.

use crate::games::common::{BaseState, PlayerId, Winner};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A hand shape.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Choice {
    /// Beats scissors.
    Rock,
    /// Beats rock.
    Paper,
    /// Beats paper.
    Scissors,
}

impl Choice {
    /// All three choices.
    pub const ALL: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissors];

    /// True if `self` beats `other`.
    pub fn beats(self, other: Choice) -> bool {
        matches!(
            (self, other),
            (Choice::Rock, Choice::Scissors)
                | (Choice::Scissors, Choice::Paper)
                | (Choice::Paper, Choice::Rock)
        )
    }

    /// The choice that beats `self`.
    pub fn counter(self) -> Choice {
        match self {
            Choice::Rock => Choice::Paper,
            Choice::Paper => Choice::Scissors,
            Choice::Scissors => Choice::Rock,
        }
    }

    /// Compares two choices from `self`'s point of view.
    pub fn versus(self, other: Choice) -> Ordering {
        if self == other {
            Ordering::Equal
        } else if self.beats(other) {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    }
}

/// One simultaneous exchange. Closed once `winner` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// Choice of the first seat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1_choice: Option<Choice>,
    /// Choice of the second seat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2_choice: Option<Choice>,
    /// Set once both choices are in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
}

impl Round {
    /// True once the round has a winner (or draw).
    pub fn is_resolved(&self) -> bool {
        self.winner.is_some()
    }

    /// Choice recorded for a seat index (0 or 1).
    pub fn choice_for_seat(&self, seat: usize) -> Option<Choice> {
        match seat {
            0 => self.player1_choice,
            1 => self.player2_choice,
            _ => None,
        }
    }

    pub(crate) fn set_choice_for_seat(&mut self, seat: usize, choice: Choice) {
        match seat {
            0 => self.player1_choice = Some(choice),
            _ => self.player2_choice = Some(choice),
        }
    }

    /// Removes both choices. Only meaningful on an unresolved round.
    pub(crate) fn redact(&mut self) {
        self.player1_choice = None;
        self.player2_choice = None;
        self.winner = None;
    }
}

/// A rock-paper-scissors move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RpsMove {
    /// The hand shape.
    pub choice: Choice,
}

impl RpsMove {
    /// Creates a move.
    pub fn new(choice: Choice) -> Self {
        Self { choice }
    }
}

/// Complete rock-paper-scissors game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpsState {
    /// Shared game fields.
    #[serde(flatten)]
    pub base: BaseState,
    /// One entry per round, `max_rounds` long.
    pub rounds: Vec<Round>,
    /// Index of the round being played. Equals `max_rounds` once all are done.
    pub current_round: usize,
    /// Number of rounds in the match.
    pub max_rounds: usize,
    /// Rounds won per seat.
    pub scores: BTreeMap<PlayerId, u32>,
}

impl RpsState {
    /// The round currently accepting choices, if any.
    pub fn active_round(&self) -> Option<&Round> {
        self.rounds.get(self.current_round)
    }

    /// Rounds won by the seat.
    pub fn score(&self, player: PlayerId) -> u32 {
        self.scores.get(&player).copied().unwrap_or(0)
    }

    /// True if the seat already chose in the active round.
    pub fn has_chosen(&self, player: PlayerId) -> bool {
        match (self.base.seat_of(player), self.active_round()) {
            (Some(seat), Some(round)) => round.choice_for_seat(seat).is_some(),
            _ => false,
        }
    }
}
