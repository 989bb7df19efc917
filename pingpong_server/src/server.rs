use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use pingpong_engine::{LiveMatchApi, SqliteDatabase};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    registry::ConnectionRegistry,
    routes::{health, ws_broadcast, ws_stats, ArbiterFeedRoute, LiveFeedRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    info!("🗃️ Database at {} is ready", db.url());
    let srv = create_server_instance(config, db, ConnectionRegistry::new())?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Builds the HTTP server. Every worker shares the same `registry`, so a broadcast from any worker reaches sockets
/// held by all of them.
pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    registry: ConnectionRegistry,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let rules = config.rule_table();
    let srv = HttpServer::new(move || {
        let api = LiveMatchApi::with_rules(db.clone(), rules.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pingpong::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(options))
            .service(health)
            .service(ws_stats)
            .service(ws_broadcast)
            .service(LiveFeedRoute::<SqliteDatabase>::new())
            .service(ArbiterFeedRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
