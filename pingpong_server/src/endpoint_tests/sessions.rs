//! Socket-level tests: a real server, a real WebSocket client.
use std::{fmt::Debug, time::Duration};

use actix_web::{
    rt::time::{sleep, timeout},
    web,
    App,
};
use awc::ws::{Frame, Message};
use futures::{SinkExt, Stream, StreamExt};
use pingpong_engine::{db_types::MatchId, LiveMatchApi, MatchStoreError};
use serde_json::Value;

use super::{
    helpers::TestClient,
    mocks::{backend_with_players, match_in_progress, MockBackend},
};
use crate::{
    config::ServerOptions,
    registry::{ClientType, ConnectionRegistry},
    routes::{ArbiterFeedRoute, LiveFeedRoute},
};

const WAIT: Duration = Duration::from_secs(5);

fn start_server(backend: MockBackend, registry: ConnectionRegistry, keepalive: Duration) -> actix_test::TestServer {
    let api = web::Data::new(LiveMatchApi::new(backend));
    let registry = web::Data::new(registry);
    let options = web::Data::new(ServerOptions { keepalive, ..Default::default() });
    actix_test::start(move || {
        App::new()
            .app_data(api.clone())
            .app_data(registry.clone())
            .app_data(options.clone())
            .service(LiveFeedRoute::<MockBackend>::new())
            .service(ArbiterFeedRoute::<MockBackend>::new())
    })
}

/// The next text frame, decoded. Control frames are skipped. `None` once the server has closed the socket.
async fn next_json<S, E>(socket: &mut S) -> Option<Value>
where
    S: Stream<Item = Result<Frame, E>> + Unpin,
    E: Debug,
{
    loop {
        let frame = timeout(WAIT, socket.next()).await.expect("Timed out waiting for a frame");
        match frame {
            Some(Ok(Frame::Text(bytes))) => return Some(serde_json::from_slice(&bytes).unwrap()),
            Some(Ok(Frame::Ping(_) | Frame::Pong(_))) => continue,
            Some(Ok(Frame::Close(_))) | Some(Err(_)) | None => return None,
            Some(Ok(other)) => panic!("Unexpected frame {other:?}"),
        }
    }
}

/// Session teardown happens on the server's own thread, so poll the registry for a while.
async fn wait_for_total(registry: &ConnectionRegistry, expected: usize) -> bool {
    for _ in 0..100 {
        if registry.stats().total == expected {
            return true;
        }
        sleep(Duration::from_millis(20)).await;
    }
    false
}

#[actix_web::test]
async fn close_frame_disconnects_the_client() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_active_matches().returning(|| Ok(vec![]));
    let registry = ConnectionRegistry::new();
    let mut srv = start_server(backend, registry.clone(), Duration::from_secs(30));

    let mut socket = srv.ws_at("/pingpong/ws/live?type=tv").await.unwrap();
    let msg = next_json(&mut socket).await.unwrap();
    assert_eq!(msg["type"], "connected");
    assert_eq!(msg["client_type"], "tv");
    let msg = next_json(&mut socket).await.unwrap();
    assert_eq!(msg["type"], "active_matches");
    assert_eq!(msg["matches"], serde_json::json!([]));
    let stats = registry.stats();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.global_watchers, 1);

    socket.send(Message::Close(None)).await.unwrap();
    assert!(next_json(&mut socket).await.is_none());
    assert!(wait_for_total(&registry, 0).await, "Client is still registered after closing the socket");
}

#[actix_web::test]
async fn dropped_socket_disconnects_the_client() {
    let _ = env_logger::try_init();
    let mut backend = backend_with_players();
    backend.expect_fetch_match().returning(|_| Ok(Some(match_in_progress())));
    let registry = ConnectionRegistry::new();
    let mut srv = start_server(backend, registry.clone(), Duration::from_secs(30));

    let mut socket = srv.ws_at("/pingpong/ws/live?match_id=m1").await.unwrap();
    assert_eq!(next_json(&mut socket).await.unwrap()["type"], "connected");
    let msg = next_json(&mut socket).await.unwrap();
    assert_eq!(msg["type"], "match_state");
    assert_eq!(msg["match"]["player_a"]["name"], "Alice");
    assert_eq!(registry.stats().per_match.get(&MatchId::from("m1")), Some(&1));

    drop(socket);
    assert!(wait_for_total(&registry, 0).await, "Client is still registered after dropping the socket");
}

#[actix_web::test]
async fn save_failure_closes_the_arbiter_socket() {
    let _ = env_logger::try_init();
    let mut backend = backend_with_players();
    backend.expect_fetch_match().returning(|_| Ok(Some(match_in_progress())));
    backend.expect_save_match().returning(|_| Err(MatchStoreError::DatabaseError("disk full".into())));
    let registry = ConnectionRegistry::new();
    let mut watcher = TestClient::connect(&registry, ClientType::Spectator, Some("m1"));
    let mut srv = start_server(backend, registry.clone(), Duration::from_secs(30));

    let mut socket = srv.ws_at("/pingpong/ws/arbiter/m1").await.unwrap();
    let msg = next_json(&mut socket).await.unwrap();
    assert_eq!(msg["type"], "connected");
    assert_eq!(msg["client_type"], "arbiter");
    let msg = next_json(&mut socket).await.unwrap();
    assert_eq!(msg["type"], "match_state");
    assert_eq!(msg["match"]["points_a"], 3);
    assert_eq!(registry.stats().total, 2);

    socket.send(Message::Text(r#"{"action":"point","jugador":"a"}"#.into())).await.unwrap();
    assert!(next_json(&mut socket).await.is_none(), "Arbiter socket should close after a failed save");
    assert!(wait_for_total(&registry, 1).await, "Arbiter is still registered after the session ended");
    // Nothing was saved, so nothing was broadcast
    assert!(watcher.received().is_empty());
}

#[actix_web::test]
async fn rejected_command_keeps_the_arbiter_connected() {
    let _ = env_logger::try_init();
    let mut backend = backend_with_players();
    backend.expect_fetch_match().returning(|_| Ok(Some(match_in_progress())));
    backend.expect_save_match().never();
    let registry = ConnectionRegistry::new();
    let mut srv = start_server(backend, registry.clone(), Duration::from_secs(30));

    let mut socket = srv.ws_at("/pingpong/ws/arbiter/m1").await.unwrap();
    assert_eq!(next_json(&mut socket).await.unwrap()["type"], "connected");
    assert_eq!(next_json(&mut socket).await.unwrap()["type"], "match_state");

    socket.send(Message::Text(r#"{"action":"start"}"#.into())).await.unwrap();
    let msg = next_json(&mut socket).await.unwrap();
    assert_eq!(msg["type"], "error");
    assert_eq!(msg["message"], "Cannot start a match that is in_progress");
    assert_eq!(registry.stats().total, 1);
}

#[actix_web::test]
async fn idle_socket_gets_a_ping() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_active_matches().returning(|| Ok(vec![]));
    let registry = ConnectionRegistry::new();
    let mut srv = start_server(backend, registry.clone(), Duration::from_millis(300));

    let mut socket = srv.ws_at("/pingpong/ws/live").await.unwrap();
    assert_eq!(next_json(&mut socket).await.unwrap()["type"], "connected");
    assert_eq!(next_json(&mut socket).await.unwrap()["type"], "active_matches");
    let msg = next_json(&mut socket).await.unwrap();
    assert_eq!(msg["type"], "ping");
    assert!(msg["timestamp"].is_string());
    // Pinging does not drop a silent client
    assert_eq!(registry.stats().total, 1);
}
