use actix::prelude::*;
use actix_web::web;
use actix_web_actors::ws;
use futures::channel::mpsc::unbounded;
use log::*;
use pingpong_engine::{db_types::MatchId, LiveMatchApi, MatchStore, PlayerDirectory};

use super::Heartbeat;
use crate::{
    commands::{handle_arbiter_message, send_match_state},
    envelopes::{Envelope, LiveEvent},
    registry::{ClientId, ClientType, ConnectionRegistry},
};

/// The control channel for a single match. The arbiter is also a member of the match's group, so it sees the same
/// broadcasts as everyone watching.
pub struct ArbiterSession<B> {
    api: web::Data<LiveMatchApi<B>>,
    registry: ConnectionRegistry,
    match_id: MatchId,
    client_id: Option<ClientId>,
    heartbeat: Heartbeat,
}

impl<B> ArbiterSession<B> {
    pub fn new(
        api: web::Data<LiveMatchApi<B>>,
        registry: ConnectionRegistry,
        match_id: MatchId,
        heartbeat: Heartbeat,
    ) -> Self {
        Self { api, registry, match_id, client_id: None, heartbeat }
    }
}

impl<B> ArbiterSession<B>
where B: MatchStore + PlayerDirectory + 'static
{
    fn handle_text(&mut self, text: String, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(client_id) = self.client_id.clone() else {
            return;
        };
        let api = self.api.clone();
        let registry = self.registry.clone();
        let match_id = self.match_id.clone();
        let fut = async move { handle_arbiter_message(&api, &registry, &client_id, &match_id, &text).await };
        ctx.wait(fut.into_actor(self).map(|result, act, ctx| {
            if let Err(e) = result {
                error!("🔌️ [{}] Arbiter session is closing after a backend failure. {e}", act.match_id);
                let reason = ws::CloseReason { code: ws::CloseCode::Error, description: Some(e.to_string()) };
                ctx.close(Some(reason));
                ctx.stop();
            }
        }));
    }
}

impl<B> Actor for ArbiterSession<B>
where B: MatchStore + PlayerDirectory + 'static
{
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, rx) = unbounded();
        ctx.add_stream(rx);
        let client_id = self.registry.connect(tx, ClientType::Arbiter, Some(self.match_id.clone()));
        self.client_id = Some(client_id.clone());
        ctx.run_interval(self.heartbeat.check_interval(), |act, ctx| {
            if let Some(ping) = act.heartbeat.poll() {
                ctx.text(ping);
            }
        });
        let api = self.api.clone();
        let registry = self.registry.clone();
        let match_id = self.match_id.clone();
        let fut = async move {
            if let Err(e) = send_match_state(&api, &registry, &client_id, &match_id).await {
                warn!("🔌️ [{match_id}] Could not send the match state to arbiter {client_id}. {e}");
                registry.send_to(&client_id, &Envelope::now(LiveEvent::error(e.to_string())));
            }
        };
        ctx.wait(fut.into_actor(self));
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(client_id) = self.client_id.take() {
            self.registry.disconnect(&client_id);
        }
    }
}

impl<B> StreamHandler<Result<ws::Message, ws::ProtocolError>> for ArbiterSession<B>
where B: MatchStore + PlayerDirectory + 'static
{
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        self.heartbeat.touch();
        match msg {
            Ok(ws::Message::Text(text)) => self.handle_text(text.to_string(), ctx),
            Ok(ws::Message::Ping(data)) => ctx.pong(&data),
            Ok(ws::Message::Close(reason)) => {
                debug!("🔌️ [{}] Arbiter closed the socket: {reason:?}", self.match_id);
                ctx.close(reason);
                ctx.stop();
            },
            Ok(ws::Message::Binary(_)) => {
                if let Some(client_id) = &self.client_id {
                    let err = LiveEvent::error("Binary messages are not supported. Send JSON text.");
                    self.registry.send_to(client_id, &Envelope::now(err));
                }
            },
            Ok(_) => {},
            Err(e) => {
                warn!("🔌️ [{}] Arbiter protocol error. {e}", self.match_id);
                ctx.stop();
            },
        }
    }
}

/// Registry traffic for this client, forwarded to the socket.
impl<B> StreamHandler<String> for ArbiterSession<B>
where B: MatchStore + PlayerDirectory + 'static
{
    fn handle(&mut self, msg: String, ctx: &mut Self::Context) {
        ctx.text(msg);
    }
}
