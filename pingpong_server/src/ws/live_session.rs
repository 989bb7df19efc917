use actix::prelude::*;
use actix_web::web;
use actix_web_actors::ws;
use futures::channel::mpsc::unbounded;
use log::*;
use pingpong_engine::{db_types::MatchId, LiveMatchApi, MatchStore, PlayerDirectory};

use super::Heartbeat;
use crate::{
    commands::{handle_spectator_message, replay_for_client},
    registry::{ClientId, ClientType, ConnectionRegistry},
};

/// A read-only feed for spectators, TV screens and admin consoles.
pub struct LiveSession<B> {
    api: web::Data<LiveMatchApi<B>>,
    registry: ConnectionRegistry,
    client_type: ClientType,
    match_id: Option<MatchId>,
    client_id: Option<ClientId>,
    heartbeat: Heartbeat,
}

impl<B> LiveSession<B> {
    pub fn new(
        api: web::Data<LiveMatchApi<B>>,
        registry: ConnectionRegistry,
        client_type: ClientType,
        match_id: Option<MatchId>,
        heartbeat: Heartbeat,
    ) -> Self {
        Self { api, registry, client_type, match_id, client_id: None, heartbeat }
    }
}

impl<B> LiveSession<B>
where B: MatchStore + PlayerDirectory + 'static
{
    fn handle_text(&mut self, text: String, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(client_id) = self.client_id.clone() else {
            return;
        };
        let api = self.api.clone();
        let registry = self.registry.clone();
        let fut = async move { handle_spectator_message(&api, &registry, &client_id, &text).await };
        ctx.wait(fut.into_actor(self));
    }
}

impl<B> Actor for LiveSession<B>
where B: MatchStore + PlayerDirectory + 'static
{
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, rx) = unbounded();
        ctx.add_stream(rx);
        let client_id = self.registry.connect(tx, self.client_type, self.match_id.clone());
        self.client_id = Some(client_id.clone());
        ctx.run_interval(self.heartbeat.check_interval(), |act, ctx| {
            if let Some(ping) = act.heartbeat.poll() {
                ctx.text(ping);
            }
        });
        let api = self.api.clone();
        let registry = self.registry.clone();
        let match_id = self.match_id.clone();
        let fut = async move { replay_for_client(&api, &registry, &client_id, match_id.as_ref()).await };
        ctx.wait(fut.into_actor(self));
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(client_id) = self.client_id.take() {
            self.registry.disconnect(&client_id);
        }
    }
}

impl<B> StreamHandler<Result<ws::Message, ws::ProtocolError>> for LiveSession<B>
where B: MatchStore + PlayerDirectory + 'static
{
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        self.heartbeat.touch();
        match msg {
            Ok(ws::Message::Text(text)) => self.handle_text(text.to_string(), ctx),
            Ok(ws::Message::Ping(data)) => ctx.pong(&data),
            Ok(ws::Message::Close(reason)) => {
                trace!("🔌️ Live client {:?} closed the socket: {reason:?}", self.client_id);
                ctx.close(reason);
                ctx.stop();
            },
            Ok(_) => {},
            Err(e) => {
                debug!("🔌️ Live client {:?} protocol error. {e}", self.client_id);
                ctx.stop();
            },
        }
    }
}

impl<B> StreamHandler<String> for LiveSession<B>
where B: MatchStore + PlayerDirectory + 'static
{
    fn handle(&mut self, msg: String, ctx: &mut Self::Context) {
        ctx.text(msg);
    }
}
