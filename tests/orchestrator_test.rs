//! Tests for game creation and move processing.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use strictly_arena::rps::Choice;
use strictly_arena::tictactoe::{Position, TicTacToeMove};
use strictly_arena::{
    CreateGameRequest, Difficulty, ErrorKind, GameMove, GameOrchestrator, GameState, GameStatus,
    GameSession, GameType, MemorySessionStore, MoveError, PlayerId, RulesEngine, SessionStore,
    SharedStore, StoreError, Winner,
};

fn setup() -> (SharedStore, GameOrchestrator) {
    let store: SharedStore = Arc::new(MemorySessionStore::new());
    let orchestrator = GameOrchestrator::new(store.clone(), RulesEngine::new());
    (store, orchestrator)
}

fn cell(row: usize, col: usize) -> serde_json::Value {
    json!({ "row": row, "col": col })
}

async fn stored_bytes(store: &SharedStore, id: &str) -> String {
    let session = store
        .get(id)
        .await
        .expect("Store read failed")
        .expect("Session missing");
    serde_json::to_string(&session).expect("Serialize failed")
}

#[tokio::test]
async fn test_create_game_builds_players_and_difficulty() {
    let (_store, orch) = setup();
    let session = orch
        .create_game(
            GameType::TicTacToe,
            CreateGameRequest::new("Ada").with_difficulty(Difficulty::Hard),
        )
        .await
        .expect("Create failed");

    let base = session.base();
    assert_eq!(base.players.len(), 2);
    assert_eq!(base.players[0].id, PlayerId::Player1);
    assert_eq!(base.players[0].name, "Ada");
    assert!(!base.players[0].is_ai);
    assert_eq!(base.players[1].id, PlayerId::Ai);
    assert!(base.players[1].is_ai);
    assert_eq!(base.status, GameStatus::Playing);
    assert_eq!(session.difficulty, Some(Difficulty::Hard));
    assert!(session.history.is_empty());
    assert!(!session.id().is_empty());
}

#[tokio::test]
async fn test_create_game_defaults_difficulty() {
    let (store, _) = setup();
    let orch = GameOrchestrator::new(store, RulesEngine::new()).with_default_difficulty(Difficulty::Easy);
    let session = orch
        .create_game(GameType::RockPaperScissors, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    assert_eq!(session.difficulty, Some(Difficulty::Easy));
}

#[tokio::test]
async fn test_create_with_same_id_is_idempotent() {
    let (store, orch) = setup();
    for game_type in [GameType::TicTacToe, GameType::RockPaperScissors] {
        let id = format!("fixed-{}", game_type);
        let first = orch
            .create_game(game_type, CreateGameRequest::new("Ada").with_game_id(&id))
            .await
            .expect("First create failed");
        let before = stored_bytes(&store, &id).await;

        let second = orch
            .create_game(
                game_type,
                CreateGameRequest::new("Someone else")
                    .with_game_id(&id)
                    .with_difficulty(Difficulty::Hard),
            )
            .await
            .expect("Second create failed");

        assert_eq!(first, second);
        assert_eq!(stored_bytes(&store, &id).await, before);
    }
}

#[tokio::test]
async fn test_existing_game_is_returned_after_moves() {
    let (_store, orch) = setup();
    let req = CreateGameRequest::new("Ada").with_game_id("g");
    orch.create_game(GameType::TicTacToe, req.clone()).await.expect("Create failed");
    let moved = orch
        .submit_move(GameType::TicTacToe, "g", "player1", cell(1, 1))
        .await
        .expect("Move failed");
    let again = orch.create_game(GameType::TicTacToe, req).await.expect("Create failed");
    assert_eq!(again, moved);
}

#[tokio::test]
async fn test_reusing_id_for_other_game_type_is_malformed() {
    let (_store, orch) = setup();
    orch.create_game(GameType::TicTacToe, CreateGameRequest::new("Ada").with_game_id("shared"))
        .await
        .expect("Create failed");
    let err = orch
        .create_game(
            GameType::RockPaperScissors,
            CreateGameRequest::new("Ada").with_game_id("shared"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[tokio::test]
async fn test_blank_player_name_is_malformed() {
    let (_store, orch) = setup();
    let err = orch
        .create_game(GameType::TicTacToe, CreateGameRequest::new("   "))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[tokio::test]
async fn test_history_is_append_only_in_submission_order() {
    let (_store, orch) = setup();
    let game = orch
        .create_game(GameType::TicTacToe, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    let id = game.id().to_string();

    let moves = [
        (PlayerId::Player1, Position::Center),
        (PlayerId::Ai, Position::TopLeft),
        (PlayerId::Player1, Position::TopRight),
        (PlayerId::Ai, Position::BottomLeft),
    ];
    let mut previous_history = Vec::new();
    let mut previous_updated = game.updated_at();
    for (n, (player, pos)) in moves.iter().enumerate() {
        let mv = GameMove::TicTacToe(TicTacToeMove::from(*pos));
        let session = orch
            .apply_move(GameType::TicTacToe, &id, *player, mv)
            .await
            .expect("Move failed");

        assert_eq!(session.history.len(), n + 1);
        assert_eq!(&session.history[..n], &previous_history[..]);
        let last = &session.history[n];
        assert_eq!(last.player_id, *player);
        assert_eq!(last.mv, mv);
        assert_eq!(last.timestamp, session.updated_at());
        assert!(session.updated_at() > previous_updated);

        previous_updated = session.updated_at();
        previous_history = session.history.clone();
    }
}

#[tokio::test]
async fn test_rejected_move_leaves_session_byte_identical() {
    let (store, orch) = setup();
    let game = orch
        .create_game(GameType::TicTacToe, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    let id = game.id().to_string();
    orch.submit_move(GameType::TicTacToe, &id, "player1", cell(0, 0))
        .await
        .expect("Move failed");
    let before = stored_bytes(&store, &id).await;

    // Human out of turn, agent on an occupied cell, out of range, unknown seat.
    let attempts = [
        ("player1", cell(2, 2)),
        ("ai", cell(0, 0)),
        ("ai", cell(5, 1)),
        ("player2", cell(1, 1)),
    ];
    for (player, payload) in attempts {
        let err = orch
            .submit_move(GameType::TicTacToe, &id, player, payload)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidMove, "{}", err);
        assert_eq!(stored_bytes(&store, &id).await, before);
    }

    let err = orch
        .submit_move(GameType::TicTacToe, &id, "ai", json!({ "cell": 4 }))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert_eq!(stored_bytes(&store, &id).await, before);
}

#[tokio::test]
async fn test_agent_out_of_turn_is_rejected_like_anyone() {
    let (_store, orch) = setup();
    let game = orch
        .create_game(GameType::TicTacToe, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    let err = orch
        .submit_move(GameType::TicTacToe, game.id(), "ai", cell(1, 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        strictly_arena::GameError::InvalidMove {
            reason: MoveError::NotYourTurn(PlayerId::Ai)
        }
    ));
}

#[tokio::test]
async fn test_missing_game_is_not_found() {
    let (_store, orch) = setup();
    let err = orch
        .submit_move(GameType::TicTacToe, "nope", "player1", cell(0, 0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let game = orch
        .create_game(GameType::TicTacToe, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    let err = orch
        .get_session(GameType::RockPaperScissors, game.id())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_winning_move_finishes_game() {
    let (_store, orch) = setup();
    let game = orch
        .create_game(GameType::TicTacToe, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    let id = game.id().to_string();

    let sequence = [
        ("player1", cell(0, 0)),
        ("ai", cell(1, 0)),
        ("player1", cell(0, 1)),
        ("ai", cell(1, 1)),
    ];
    for (player, payload) in sequence {
        let session = orch
            .submit_move(GameType::TicTacToe, &id, player, payload)
            .await
            .expect("Move failed");
        assert_eq!(session.status(), GameStatus::Playing);
        assert_eq!(session.base().winner, None);
    }

    let done = orch
        .submit_move(GameType::TicTacToe, &id, "player1", cell(0, 2))
        .await
        .expect("Winning move failed");
    assert_eq!(done.status(), GameStatus::Finished);
    assert_eq!(done.base().winner, Some(Winner::Player(PlayerId::Player1)));
    assert_eq!(done.history.len(), 5);

    let err = orch
        .submit_move(GameType::TicTacToe, &id, "ai", cell(2, 2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        strictly_arena::GameError::InvalidMove {
            reason: MoveError::GameNotPlaying(GameStatus::Finished)
        }
    ));
}

#[tokio::test]
async fn test_rps_match_finishes_with_score() {
    let (_store, orch) = setup();
    let game = orch
        .create_game(GameType::RockPaperScissors, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    let id = game.id().to_string();

    let rounds = [
        (Choice::Rock, Choice::Scissors),
        (Choice::Paper, Choice::Rock),
        (Choice::Rock, Choice::Paper),
    ];
    let mut last = game;
    for (human, agent) in rounds {
        orch.submit_move(GameType::RockPaperScissors, &id, "player1", json!({ "choice": human }))
            .await
            .expect("Human choice failed");
        last = orch
            .submit_move(GameType::RockPaperScissors, &id, "ai", json!({ "choice": agent }))
            .await
            .expect("Agent choice failed");
    }

    assert_eq!(last.status(), GameStatus::Finished);
    assert_eq!(last.base().winner, Some(Winner::Player(PlayerId::Player1)));
    let GameState::RockPaperScissors(state) = &last.game else {
        panic!("Expected rps state");
    };
    assert_eq!(state.score(PlayerId::Player1), 2);
    assert_eq!(state.score(PlayerId::Ai), 1);
    assert_eq!(last.history.len(), 6);
}

#[tokio::test]
async fn test_unknown_rps_choice_is_invalid_move() {
    let (_store, orch) = setup();
    let game = orch
        .create_game(GameType::RockPaperScissors, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    let err = orch
        .submit_move(GameType::RockPaperScissors, game.id(), "player1", json!({ "choice": "lizard" }))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidMove);
}

#[tokio::test]
async fn test_concurrent_moves_on_one_game_are_serialized() {
    let (_store, orch) = setup();
    let game = orch
        .create_game(GameType::TicTacToe, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    let id = game.id().to_string();

    let tasks: Vec<_> = [cell(0, 0), cell(2, 2)]
        .into_iter()
        .map(|payload| {
            let orch = orch.clone();
            let id = id.clone();
            tokio::spawn(async move {
                orch.submit_move(GameType::TicTacToe, &id, "player1", payload).await
            })
        })
        .collect();

    let mut accepted = 0;
    let mut rejected = 0;
    for task in tasks {
        match task.await.expect("Task panicked") {
            Ok(_) => accepted += 1,
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::InvalidMove);
                rejected += 1;
            }
        }
    }
    assert_eq!((accepted, rejected), (1, 1));

    let session = orch.get_session(GameType::TicTacToe, &id).await.expect("Get failed");
    assert_eq!(session.history.len(), 1);
}

#[tokio::test]
async fn test_valid_moves_and_delete() {
    let (_store, orch) = setup();
    let game = orch
        .create_game(GameType::TicTacToe, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    let id = game.id().to_string();

    let moves = orch
        .valid_moves(GameType::TicTacToe, &id, "player1")
        .await
        .expect("Valid moves failed");
    assert_eq!(moves.len(), 9);
    let moves = orch
        .valid_moves(GameType::TicTacToe, &id, "ai")
        .await
        .expect("Valid moves failed");
    assert!(moves.is_empty());

    orch.delete_session(GameType::TicTacToe, &id).await.expect("Delete failed");
    let err = orch.get_session(GameType::TicTacToe, &id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = orch.delete_session(GameType::TicTacToe, &id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_list_sessions_filters_by_type() {
    let (_store, orch) = setup();
    orch.create_game(GameType::TicTacToe, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    orch.create_game(GameType::RockPaperScissors, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    orch.create_game(GameType::RockPaperScissors, CreateGameRequest::new("Bo"))
        .await
        .expect("Create failed");

    let ttt = orch.list_sessions(GameType::TicTacToe).await.expect("List failed");
    let rps = orch.list_sessions(GameType::RockPaperScissors).await.expect("List failed");
    assert_eq!(ttt.len(), 1);
    assert_eq!(rps.len(), 2);
    assert!(rps.iter().all(|s| s.game_type() == GameType::RockPaperScissors));
}

#[tokio::test]
async fn test_lock_table_does_not_grow_with_unknown_ids() {
    let (_store, orch) = setup();
    for i in 0..100 {
        let err = orch
            .submit_move(GameType::TicTacToe, &format!("missing-{}", i), "player1", cell(0, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
    assert!(orch.locks().is_empty());

    let game = orch
        .create_game(GameType::TicTacToe, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    orch.submit_move(GameType::TicTacToe, game.id(), "player1", cell(1, 1))
        .await
        .expect("Move failed");
    orch.delete_session(GameType::TicTacToe, game.id())
        .await
        .expect("Delete failed");
    assert!(orch.locks().is_empty());
}

/// Memory store whose writes fail on demand.
#[derive(Debug, Default)]
struct FailingWrites {
    inner: MemorySessionStore,
    failing: AtomicBool,
    writes: AtomicUsize,
}

#[async_trait]
impl SessionStore for FailingWrites {
    async fn get(&self, id: &str) -> Result<Option<GameSession>, StoreError> {
        self.inner.get(id).await
    }

    async fn set(&self, id: &str, session: &GameSession) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::new("disk full"));
        }
        self.inner.set(id, session).await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.inner.delete(id).await
    }

    async fn list_by_type(&self, game_type: GameType) -> Result<Vec<GameSession>, StoreError> {
        self.inner.list_by_type(game_type).await
    }
}

#[tokio::test]
async fn test_store_failures_surface_without_partial_state() {
    let store = Arc::new(FailingWrites::default());
    let shared: SharedStore = store.clone();
    let orch = GameOrchestrator::new(shared.clone(), RulesEngine::new());

    let game = orch
        .create_game(GameType::TicTacToe, CreateGameRequest::new("Ada"))
        .await
        .expect("Create failed");
    orch.submit_move(GameType::TicTacToe, game.id(), "player1", cell(0, 0))
        .await
        .expect("Move failed");
    let before = stored_bytes(&shared, game.id()).await;

    store.failing.store(true, Ordering::SeqCst);
    let writes = store.writes.load(Ordering::SeqCst);

    let err = orch
        .apply_move(
            GameType::TicTacToe,
            game.id(),
            PlayerId::Ai,
            GameMove::TicTacToe(TicTacToeMove::from(Position::Center)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(err.to_string().contains("disk full"), "{}", err);
    // One attempt, no retry.
    assert_eq!(store.writes.load(Ordering::SeqCst), writes + 1);
    assert_eq!(stored_bytes(&shared, game.id()).await, before);

    let err = orch
        .create_game(
            GameType::RockPaperScissors,
            CreateGameRequest::new("Ada").with_game_id("never-written"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    let err = orch
        .get_session(GameType::RockPaperScissors, "never-written")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
