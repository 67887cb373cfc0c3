//! Tests for the session store backends.

use chrono::{DateTime, Duration, TimeZone, Utc};
use strictly_arena::{
    Difficulty, GameOptions, GameSession, GameType, MemorySessionStore, Player, RulesEngine,
    SessionStore, SqliteSessionStore,
};
use tempfile::TempDir;

fn at(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::seconds(offset_secs)
}

fn session(game_type: GameType, id: &str, offset_secs: i64) -> GameSession {
    let state = RulesEngine::new().initial_state(
        game_type,
        id.to_string(),
        [Player::human("Ada"), Player::agent("AI")],
        &GameOptions::default(),
        at(offset_secs),
    );
    GameSession::new(state, Some(Difficulty::Medium))
}

fn sqlite_store() -> (TempDir, SqliteSessionStore) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("arena.db");
    let store = SqliteSessionStore::open(path.to_str().expect("Non-UTF-8 temp path"))
        .expect("Failed to open store");
    (dir, store)
}

async fn exercise_store(store: &dyn SessionStore) {
    assert_eq!(store.get("a").await.expect("Get failed"), None);

    let a = session(GameType::TicTacToe, "a", 1);
    let b = session(GameType::TicTacToe, "b", 3);
    let c = session(GameType::RockPaperScissors, "c", 2);
    for s in [&a, &b, &c] {
        store.set(s.id(), s).await.expect("Set failed");
    }

    assert_eq!(store.get("a").await.expect("Get failed"), Some(a.clone()));
    assert_eq!(store.get("c").await.expect("Get failed"), Some(c.clone()));

    let ttt = store.list_by_type(GameType::TicTacToe).await.expect("List failed");
    let ids: Vec<&str> = ttt.iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    let rps = store
        .list_by_type(GameType::RockPaperScissors)
        .await
        .expect("List failed");
    assert_eq!(rps, vec![c.clone()]);

    // Replacing a document moves it to the front of its type.
    let a2 = session(GameType::TicTacToe, "a", 10);
    store.set("a", &a2).await.expect("Set failed");
    let ttt = store.list_by_type(GameType::TicTacToe).await.expect("List failed");
    assert_eq!(ttt.first(), Some(&a2));
    assert_eq!(ttt.len(), 2);

    assert!(store.delete("b").await.expect("Delete failed"));
    assert!(!store.delete("b").await.expect("Delete failed"));
    assert_eq!(store.get("b").await.expect("Get failed"), None);
}

#[tokio::test]
async fn test_memory_store_contract() {
    let store = MemorySessionStore::new();
    exercise_store(&store).await;
}

#[tokio::test]
async fn test_sqlite_store_contract() {
    let (_dir, store) = sqlite_store();
    exercise_store(&store).await;
}

#[tokio::test]
async fn test_sqlite_sessions_survive_reopen() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("arena.db");
    let path = path.to_str().expect("Non-UTF-8 temp path").to_string();
    let original = session(GameType::RockPaperScissors, "persisted", 5);

    {
        let store = SqliteSessionStore::open(&path).expect("Failed to open store");
        store.set(original.id(), &original).await.expect("Set failed");
    }

    let reopened = SqliteSessionStore::open(&path).expect("Failed to reopen store");
    let loaded = reopened
        .get("persisted")
        .await
        .expect("Get failed")
        .expect("Session missing after reopen");
    assert_eq!(loaded, original);
}

#[tokio::test]
async fn test_sqlite_open_fails_on_bad_path() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("missing").join("nested").join("arena.db");
    let result = SqliteSessionStore::open(path.to_str().expect("Non-UTF-8 temp path"));
    assert!(result.is_err());
}
