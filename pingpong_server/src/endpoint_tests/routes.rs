use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use pingpong_engine::{db_types::MatchId, LiveMatchApi, MatchStoreError};
use serde_json::{json, Value};

use super::{
    helpers::{get_request, post_request, send_request, TestClient},
    mocks::{match_in_progress, MockBackend},
};
use crate::{
    config::ServerOptions,
    registry::{ClientType, ConnectionRegistry},
    routes::{health, ws_broadcast, ws_stats, ArbiterFeedRoute, LiveFeedRoute},
};

fn configure(cfg: &mut ServiceConfig, registry: ConnectionRegistry, backend: MockBackend) {
    cfg.app_data(web::Data::new(registry))
        .app_data(web::Data::new(LiveMatchApi::new(backend)))
        .app_data(web::Data::new(ServerOptions::default()))
        .service(health)
        .service(ws_stats)
        .service(ws_broadcast)
        .service(LiveFeedRoute::<MockBackend>::new())
        .service(ArbiterFeedRoute::<MockBackend>::new());
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init();
    let (status, body) =
        get_request("/health", |cfg| configure(cfg, ConnectionRegistry::new(), MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn stats() {
    let _ = env_logger::try_init();
    let registry = ConnectionRegistry::new();
    let _a = TestClient::connect(&registry, ClientType::Spectator, Some("m1"));
    let _b = TestClient::connect(&registry, ClientType::Arbiter, Some("m1"));
    let _c = TestClient::connect(&registry, ClientType::Tv, None);
    let r = registry.clone();
    let (status, body) = get_request("/pingpong/ws/stats", move |cfg| configure(cfg, r, MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    let stats: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["global_watchers"], 1);
    assert_eq!(stats["matches_watched"], 1);
    assert_eq!(stats["per_match"]["m1"], 2);
    assert_eq!(stats["per_type"]["arbiter"], 1);
    assert_eq!(stats["per_type"]["tv"], 1);
}

#[actix_web::test]
async fn broadcast_reaches_everyone() {
    let _ = env_logger::try_init();
    let registry = ConnectionRegistry::new();
    let mut watcher = TestClient::connect(&registry, ClientType::Spectator, Some("m1"));
    let mut global = TestClient::connect(&registry, ClientType::Admin, None);
    let r = registry.clone();
    let body = r#"{"type":"announcement","text":"Finals start in 5 minutes"}"#;
    let (status, reply) =
        post_request("/pingpong/ws/broadcast", body, move |cfg| configure(cfg, r, MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    let reply: Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(reply, json!({"success": true, "delivered": 2}));
    for client in [&mut watcher, &mut global] {
        let msg = client.received_one();
        assert_eq!(msg["type"], "announcement");
        assert_eq!(msg["text"], "Finals start in 5 minutes");
        assert!(msg["timestamp"].is_string());
    }
}

#[actix_web::test]
async fn broadcast_keeps_existing_timestamp() {
    let _ = env_logger::try_init();
    let registry = ConnectionRegistry::new();
    let mut client = TestClient::connect(&registry, ClientType::Spectator, None);
    let r = registry.clone();
    let body = r#"{"type":"note","timestamp":"yesterday"}"#;
    let (status, _) =
        post_request("/pingpong/ws/broadcast", body, move |cfg| configure(cfg, r, MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(client.received_one()["timestamp"], "yesterday");
}

#[actix_web::test]
async fn broadcast_rejects_non_objects() {
    let _ = env_logger::try_init();
    let (status, body) = post_request("/pingpong/ws/broadcast", "[1,2,3]", |cfg| {
        configure(cfg, ConnectionRegistry::new(), MockBackend::new())
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("must be a JSON object"));
}

#[actix_web::test]
async fn arbiter_for_unknown_match() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_match().returning(|_| Ok(None));
    let (status, body) =
        get_request("/pingpong/ws/arbiter/m404", move |cfg| configure(cfg, ConnectionRegistry::new(), backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "The data was not found. Match m404 does not exist");
}

#[actix_web::test]
async fn arbiter_with_backend_failure() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_match().returning(|_| Err(MatchStoreError::DatabaseError("locked".into())));
    let (status, _) =
        get_request("/pingpong/ws/arbiter/m1", move |cfg| configure(cfg, ConnectionRegistry::new(), backend)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn arbiter_requires_websocket_upgrade() {
    let _ = env_logger::try_init();
    let mut backend = MockBackend::new();
    backend.expect_fetch_match().withf(|id| id == &MatchId::from("m1")).returning(|_| Ok(Some(match_in_progress())));
    let registry = ConnectionRegistry::new();
    let r = registry.clone();
    let (status, _) = get_request("/pingpong/ws/arbiter/m1", move |cfg| configure(cfg, r, backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(registry.stats().total, 0);
}

#[actix_web::test]
async fn live_feed_rejects_unknown_client_type() {
    let _ = env_logger::try_init();
    let req = TestRequest::get().uri("/pingpong/ws/live?type=referee");
    let (status, _) = send_request(req, |cfg| configure(cfg, ConnectionRegistry::new(), MockBackend::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
