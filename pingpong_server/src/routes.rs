//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! The two WebSocket routes only upgrade the connection. Everything that happens on the socket afterwards lives in
//! [`crate::ws`] and [`crate::commands`].
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use actix_web_actors::ws;
use chrono::Utc;
use log::*;
use pingpong_engine::{db_types::MatchId, LiveMatchApi, MatchStore, PlayerDirectory};
use serde_json::Value;

use crate::{
    config::ServerOptions,
    data_objects::{BroadcastResult, LiveFeedParams},
    errors::ServerError,
    helpers::get_remote_ip,
    registry::ConnectionRegistry,
    ws::{ArbiterSession, Heartbeat, LiveSession},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

#[get("/pingpong/ws/stats")]
pub async fn ws_stats(registry: web::Data<ConnectionRegistry>) -> impl Responder {
    trace!("💻️ Received stats request");
    HttpResponse::Ok().json(registry.stats())
}

/// Pushes an arbitrary JSON object to every live connection. The state machine is not involved. A `timestamp` field
/// is added if the object does not carry one.
#[post("/pingpong/ws/broadcast")]
pub async fn ws_broadcast(
    registry: web::Data<ConnectionRegistry>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ServerError> {
    let mut message = body.into_inner();
    let obj = message
        .as_object_mut()
        .ok_or_else(|| ServerError::InvalidRequestBody("The broadcast message must be a JSON object".into()))?;
    if !obj.contains_key("timestamp") {
        obj.insert("timestamp".into(), Value::String(Utc::now().to_rfc3339()));
    }
    let delivered = registry.broadcast_to_all(&message);
    info!("💻️ Operator broadcast delivered to {delivered} clients");
    Ok(HttpResponse::Ok().json(BroadcastResult { success: true, delivered }))
}

route!(live_feed => Get "/pingpong/ws/live" impl MatchStore, PlayerDirectory);
pub async fn live_feed<B>(
    req: HttpRequest,
    stream: web::Payload,
    params: web::Query<LiveFeedParams>,
    api: web::Data<LiveMatchApi<B>>,
    registry: web::Data<ConnectionRegistry>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, actix_web::Error>
where
    B: MatchStore + PlayerDirectory + 'static,
{
    let LiveFeedParams { match_id, client_type } = params.into_inner();
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    debug!("💻️ Live feed request from {peer:?} as {client_type} for {match_id:?}");
    let session = LiveSession::new(
        api,
        registry.get_ref().clone(),
        client_type,
        match_id,
        Heartbeat::new(options.keepalive),
    );
    ws::start(session, &req, stream)
}

route!(arbiter_feed => Get "/pingpong/ws/arbiter/{match_id}" impl MatchStore, PlayerDirectory);
pub async fn arbiter_feed<B>(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<MatchId>,
    api: web::Data<LiveMatchApi<B>>,
    registry: web::Data<ConnectionRegistry>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, actix_web::Error>
where
    B: MatchStore + PlayerDirectory + 'static,
{
    let match_id = path.into_inner();
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    debug!("💻️ Arbiter connection request from {peer:?} for match {match_id}");
    // Refuse the upgrade outright for a match that does not exist
    api.fetch_match(&match_id).await.map_err(ServerError::from)?;
    let session = ArbiterSession::new(api, registry.get_ref().clone(), match_id, Heartbeat::new(options.keepalive));
    ws::start(session, &req, stream)
}
