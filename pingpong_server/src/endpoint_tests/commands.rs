use pingpong_engine::{
    db_types::{MatchId, MatchSnapshot, MatchState},
    LiveMatchApi,
    MatchStoreError,
    PlayerDirectoryError,
};
use serde_json::json;

use super::{
    helpers::TestClient,
    mocks::{backend_with_players, match_in_progress, MockBackend},
};
use crate::{
    commands::{handle_arbiter_message, handle_spectator_message, replay_for_client, send_match_state},
    errors::SessionError,
    registry::{ClientType, ConnectionRegistry},
};

struct Fixture {
    registry: ConnectionRegistry,
    arbiter: TestClient,
    watcher: TestClient,
    elsewhere: TestClient,
    global: TestClient,
}

impl Fixture {
    fn new() -> Self {
        let registry = ConnectionRegistry::new();
        let arbiter = TestClient::connect(&registry, ClientType::Arbiter, Some("m1"));
        let watcher = TestClient::connect(&registry, ClientType::Spectator, Some("m1"));
        let elsewhere = TestClient::connect(&registry, ClientType::Spectator, Some("m2"));
        let global = TestClient::connect(&registry, ClientType::Tv, None);
        Self { registry, arbiter, watcher, elsewhere, global }
    }

    async fn arbiter_sends(&self, api: &LiveMatchApi<MockBackend>, text: &str) -> Result<(), SessionError> {
        handle_arbiter_message(api, &self.registry, &self.arbiter.id, &MatchId::from("m1"), text).await
    }
}

fn backend_for(snapshot: MatchSnapshot) -> MockBackend {
    let mut backend = backend_with_players();
    backend.expect_fetch_match().returning(move |_| Ok(Some(snapshot.clone())));
    backend
}

#[actix_web::test]
async fn point_is_saved_and_broadcast() {
    let _ = env_logger::try_init();
    let mut backend = backend_for(match_in_progress());
    backend
        .expect_save_match()
        .withf(|s| s.points_a == 4 && s.points_b == 2 && s.point_history.len() == 1)
        .times(1)
        .returning(|_| Ok(()));
    let api = LiveMatchApi::new(backend);
    let mut f = Fixture::new();
    f.arbiter_sends(&api, r#"{"action":"point","jugador":"a","tipo":"ace"}"#).await.unwrap();

    let msg = f.watcher.received_one();
    assert_eq!(msg["type"], "point_scored");
    assert_eq!(msg["match"]["points_a"], 4);
    assert_eq!(msg["match"]["player_a"]["name"], "Alice");
    assert_eq!(msg["match"]["player_b"], json!(null));
    assert_eq!(msg["point"]["scorer"], "a");
    assert_eq!(msg["point"]["point_type"], "ace");
    assert_eq!(msg["set_ganado"], false);
    assert_eq!(msg["partido_terminado"], false);
    assert!(msg["timestamp"].is_string());
    assert_eq!(f.arbiter.received_one()["type"], "point_scored");
    assert_eq!(f.global.received_one()["type"], "point_scored");
    assert!(f.elsewhere.received().is_empty());
}

#[actix_web::test]
async fn set_point_is_flagged() {
    let _ = env_logger::try_init();
    let mut snapshot = match_in_progress();
    snapshot.points_a = 9;
    snapshot.points_b = 5;
    let mut backend = backend_for(snapshot);
    backend.expect_save_match().returning(|_| Ok(()));
    let api = LiveMatchApi::new(backend);
    let mut f = Fixture::new();
    f.arbiter_sends(&api, r#"{"action":"point","jugador":"a"}"#).await.unwrap();
    let msg = f.watcher.received_one();
    assert_eq!(msg["situacion"], json!([{"tipo": "set_point", "jugador": "a"}]));
}

#[actix_web::test]
async fn illegal_action_is_reported_to_arbiter_only() {
    let _ = env_logger::try_init();
    let mut backend = backend_for(match_in_progress().with_state(MatchState::Paused));
    backend.expect_save_match().never();
    let api = LiveMatchApi::new(backend);
    let mut f = Fixture::new();
    f.arbiter_sends(&api, r#"{"action":"point","jugador":"b"}"#).await.unwrap();

    let msg = f.arbiter.received_one();
    assert_eq!(msg["type"], "error");
    assert_eq!(msg["message"], "Cannot score a point in a match that is paused");
    assert!(f.watcher.received().is_empty());
    assert!(f.global.received().is_empty());
}

#[actix_web::test]
async fn unknown_match_is_reported_to_arbiter() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_match().returning(|_| Ok(None));
    let api = LiveMatchApi::new(backend);
    let mut f = Fixture::new();
    f.arbiter_sends(&api, r#"{"action":"start"}"#).await.unwrap();
    let msg = f.arbiter.received_one();
    assert_eq!(msg["type"], "error");
    assert_eq!(msg["message"], "Match m1 was not found");
    assert!(f.watcher.received().is_empty());
}

#[actix_web::test]
async fn unreadable_command_is_reported_to_arbiter() {
    let _ = env_logger::try_init();
    // No expectations: any store call would fail the test
    let api = LiveMatchApi::new(MockBackend::new());
    let mut f = Fixture::new();
    f.arbiter_sends(&api, r#"{"action":"point","jugador":"c"}"#).await.unwrap();
    f.arbiter_sends(&api, "hello").await.unwrap();
    let msgs = f.arbiter.received();
    assert_eq!(msgs.len(), 2);
    assert!(msgs.iter().all(|m| m["type"] == "error"));
    assert!(msgs[0]["message"].as_str().unwrap().starts_with("Could not understand the command."));
    assert!(f.watcher.received().is_empty());
}

#[actix_web::test]
async fn save_failure_ends_the_session_without_broadcast() {
    let _ = env_logger::try_init();
    let mut backend = backend_for(match_in_progress());
    backend.expect_save_match().returning(|_| Err(MatchStoreError::DatabaseError("disk full".into())));
    let api = LiveMatchApi::new(backend);
    let mut f = Fixture::new();
    let err = f.arbiter_sends(&api, r#"{"action":"undo"}"#).await;
    // Nothing to undo is a validation error, raised before the save
    assert!(err.is_ok());
    assert_eq!(f.arbiter.received_one()["message"], "There are no points to undo");

    let err = f.arbiter_sends(&api, r#"{"action":"pause"}"#).await.expect_err("Expected a backend failure");
    assert!(!err.is_validation());
    assert!(f.arbiter.received().is_empty());
    assert!(f.watcher.received().is_empty());
    assert!(f.global.received().is_empty());
}

#[actix_web::test]
async fn lifecycle_broadcasts() {
    let _ = env_logger::try_init();
    let mut backend = backend_for(MatchSnapshot::new("m1", "p1", "p2"));
    backend
        .expect_save_match()
        .withf(|s| s.state == MatchState::InProgress && s.started_at.is_some())
        .returning(|_| Ok(()));
    let api = LiveMatchApi::new(backend);
    let mut f = Fixture::new();
    f.arbiter_sends(&api, r#"{"action":"start"}"#).await.unwrap();
    let msg = f.watcher.received_one();
    assert_eq!(msg["type"], "match_started");
    assert_eq!(msg["match"]["state"], "in_progress");
}

#[actix_web::test]
async fn timeout_is_broadcast_without_saving() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_match().returning(|_| Ok(Some(match_in_progress())));
    backend.expect_save_match().never();
    let api = LiveMatchApi::new(backend);
    let mut f = Fixture::new();
    f.arbiter_sends(&api, r#"{"action":"timeout","jugador":"b","duracion":60}"#).await.unwrap();
    let msg = f.watcher.received_one();
    assert_eq!(msg["type"], "timeout");
    assert_eq!(msg["match_id"], "m1");
    assert_eq!(msg["jugador"], "b");
    assert_eq!(msg["duracion"], 60);
    assert_eq!(f.global.received_one()["type"], "timeout");
    assert!(f.elsewhere.received().is_empty());
}

#[actix_web::test]
async fn timeout_for_a_missing_match_is_rejected() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_match().returning(|_| Ok(None));
    backend.expect_save_match().never();
    let api = LiveMatchApi::new(backend);
    let mut f = Fixture::new();
    f.arbiter_sends(&api, r#"{"action":"timeout","jugador":"a","duracion":30}"#).await.unwrap();
    let msg = f.arbiter.received_one();
    assert_eq!(msg["type"], "error");
    assert_eq!(msg["message"], "Match m1 was not found");
    assert!(f.watcher.received().is_empty());
    assert!(f.global.received().is_empty());
}

#[actix_web::test]
async fn directory_failure_does_not_block_the_broadcast() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_match().returning(|_| Ok(Some(match_in_progress())));
    backend.expect_save_match().returning(|_| Ok(()));
    backend.expect_fetch_player().returning(|_| Err(PlayerDirectoryError::DatabaseError("directory offline".into())));
    let api = LiveMatchApi::new(backend);
    let mut f = Fixture::new();
    f.arbiter_sends(&api, r#"{"action":"point","jugador":"b"}"#).await.unwrap();
    let msg = f.watcher.received_one();
    assert_eq!(msg["type"], "point_scored");
    assert_eq!(msg["match"]["points_b"], 3);
    assert_eq!(msg["match"]["player_a"], json!(null));
    assert_eq!(msg["match"]["player_b"], json!(null));
    assert!(f.arbiter.received().iter().all(|m| m["type"] == "point_scored"));
}

#[actix_web::test]
async fn spectator_subscribes_to_a_match() {
    let _ = env_logger::try_init();
    let mut backend = backend_for(match_in_progress());
    backend.expect_fetch_active_matches().returning(|| Ok(vec![match_in_progress()]));
    let api = LiveMatchApi::new(backend);
    let registry = ConnectionRegistry::new();
    let mut spectator = TestClient::connect(&registry, ClientType::Spectator, None);

    replay_for_client(&api, &registry, &spectator.id, None).await;
    let msg = spectator.received_one();
    assert_eq!(msg["type"], "active_matches");
    assert_eq!(msg["matches"][0]["match_id"], "m1");
    assert_eq!(msg["matches"][0]["player_a"]["nickname"], "The Wall");

    handle_spectator_message(&api, &registry, &spectator.id, r#"{"type":"subscribe_match","match_id":"m1"}"#).await;
    let msg = spectator.received_one();
    assert_eq!(msg["type"], "match_state");
    assert_eq!(msg["match"]["points_b"], 2);
    let stats = registry.stats();
    assert_eq!(stats.global_watchers, 0);
    assert_eq!(stats.per_match.get(&MatchId::from("m1")), Some(&1));

    // Match broadcasts now reach the spectator, global ones do not
    assert_eq!(registry.broadcast_global(&json!({"type": "ping"})), 0);
    assert_eq!(registry.broadcast_to_match(&MatchId::from("m1"), &json!({"type": "ping"})), 1);
    assert_eq!(spectator.received_one()["type"], "ping");

    handle_spectator_message(&api, &registry, &spectator.id, r#"{"type":"subscribe_match"}"#).await;
    assert_eq!(spectator.received_one()["type"], "active_matches");
    assert_eq!(registry.stats().global_watchers, 1);
}

#[actix_web::test]
async fn spectators_never_see_errors() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_match().returning(|_| Ok(None));
    let api = LiveMatchApi::new(backend);
    let registry = ConnectionRegistry::new();
    let mut spectator = TestClient::connect(&registry, ClientType::Spectator, None);
    handle_spectator_message(&api, &registry, &spectator.id, r#"{"type":"subscribe_match","match_id":"m9"}"#).await;
    handle_spectator_message(&api, &registry, &spectator.id, r#"{"type":"pong"}"#).await;
    handle_spectator_message(&api, &registry, &spectator.id, "garbage").await;
    assert!(spectator.received().is_empty());
    assert!(send_match_state(&api, &registry, &spectator.id, &MatchId::from("m9")).await.is_err());
}
