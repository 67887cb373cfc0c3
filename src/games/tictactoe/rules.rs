//! Game logic and rules for tic-tac-toe.

use super::position::Position;
use super::types::{Board, Symbol, TicTacToeMove, TicTacToeState};
use crate::games::common::{BaseState, GameResult, Player, PlayerId, Winner};
use crate::games::rules::{GameOptions, GameRules, MoveError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Winning combinations, with the name used in the result reason.
pub(crate) const LINES: [([Position; 3], &str); 8] = [
    // Rows
    (
        [Position::TopLeft, Position::TopCenter, Position::TopRight],
        "top row",
    ),
    (
        [Position::MiddleLeft, Position::Center, Position::MiddleRight],
        "middle row",
    ),
    (
        [
            Position::BottomLeft,
            Position::BottomCenter,
            Position::BottomRight,
        ],
        "bottom row",
    ),
    // Columns
    (
        [Position::TopLeft, Position::MiddleLeft, Position::BottomLeft],
        "left column",
    ),
    (
        [Position::TopCenter, Position::Center, Position::BottomCenter],
        "center column",
    ),
    (
        [Position::TopRight, Position::MiddleRight, Position::BottomRight],
        "right column",
    ),
    // Diagonals
    (
        [Position::TopLeft, Position::Center, Position::BottomRight],
        "main diagonal",
    ),
    (
        [Position::TopRight, Position::Center, Position::BottomLeft],
        "anti-diagonal",
    ),
];

/// Returns the symbol holding a complete line, and that line's name.
pub fn check_winner(board: &Board) -> Option<(Symbol, &'static str)> {
    LINES.iter().find_map(|([a, b, c], name)| {
        let symbol = board.get(*a)?;
        (board.get(*b) == Some(symbol) && board.get(*c) == Some(symbol)).then_some((symbol, *name))
    })
}

/// Stateless tic-tac-toe rules engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToeRules;

impl GameRules for TicTacToeRules {
    type State = TicTacToeState;
    type Move = TicTacToeMove;

    #[instrument(skip(self, players, options), fields(human_symbol = %options.human_symbol))]
    fn initial_state(
        &self,
        id: String,
        players: [Player; 2],
        options: &GameOptions,
        at: DateTime<Utc>,
    ) -> TicTacToeState {
        let [first, second] = &players;
        let mut player_symbols = BTreeMap::new();
        player_symbols.insert(first.id, options.human_symbol);
        player_symbols.insert(second.id, options.human_symbol.opponent());

        // X always opens.
        let opener = if options.human_symbol == Symbol::X {
            first.id
        } else {
            second.id
        };

        debug!(%opener, "Creating tic-tac-toe state");
        TicTacToeState {
            base: BaseState::new(id, players.to_vec(), opener, at),
            board: Board::new(),
            player_symbols,
        }
    }

    #[instrument(skip(self, state), fields(game_id = %state.base.id))]
    fn check_move(
        &self,
        state: &TicTacToeState,
        mv: &TicTacToeMove,
        player: PlayerId,
    ) -> Result<(), MoveError> {
        if !state.base.is_playing() {
            return Err(MoveError::GameNotPlaying(state.base.status));
        }
        if !state.base.has_player(player) {
            return Err(MoveError::UnknownPlayer(player.to_string()));
        }
        if player != state.base.current_player_id {
            return Err(MoveError::NotYourTurn(player));
        }
        let pos = mv.position().ok_or(MoveError::OutOfRange {
            row: mv.row,
            col: mv.col,
        })?;
        if !state.board.is_empty(pos) {
            return Err(MoveError::CellOccupied(pos));
        }
        Ok(())
    }

    #[instrument(skip(self, state), fields(game_id = %state.base.id))]
    fn apply_move(
        &self,
        state: &TicTacToeState,
        mv: &TicTacToeMove,
        player: PlayerId,
        at: DateTime<Utc>,
    ) -> Result<TicTacToeState, MoveError> {
        self.check_move(state, mv, player)?;
        let pos = mv.position().ok_or(MoveError::OutOfRange {
            row: mv.row,
            col: mv.col,
        })?;
        let symbol = state
            .symbol_of(player)
            .ok_or_else(|| MoveError::UnknownPlayer(player.to_string()))?;

        let mut next = state.clone();
        next.board.set(pos, symbol);
        next.base.current_player_id = state.base.opponent_of(player).unwrap_or(player);
        next.base.updated_at = at;

        debug!(position = %pos, %symbol, next = %next.base.current_player_id, "Placed symbol");
        Ok(next)
    }

    #[instrument(skip(self, state), fields(game_id = %state.base.id))]
    fn check_game_end(&self, state: &TicTacToeState) -> Option<GameResult> {
        if let Some((symbol, line)) = check_winner(&state.board) {
            let winner = state.player_with(symbol)?;
            return Some(GameResult::new(
                Winner::Player(winner),
                format!("Three in a row on the {}", line),
            ));
        }
        if state.board.is_full() {
            return Some(GameResult::new(Winner::Draw, "Board is full with no winner"));
        }
        None
    }

    fn valid_moves(&self, state: &TicTacToeState, player: PlayerId) -> Vec<TicTacToeMove> {
        if !state.base.is_playing()
            || !state.base.has_player(player)
            || state.base.current_player_id != player
        {
            return Vec::new();
        }
        Position::empty_on(&state.board)
            .into_iter()
            .map(TicTacToeMove::from)
            .collect()
    }
}
