//! Command handling for the live sockets.
//!
//! The session actors only deal with frames and timers. Everything a message *does* lives here as plain async
//! functions over a [`LiveMatchApi`] and a [`ConnectionRegistry`], so it can be exercised without a socket.
use log::*;
use pingpong_engine::{db_types::MatchId, LiveMatchApi, LiveMatchError, MatchStore, PlayerDirectory};

use crate::{
    envelopes::{ArbiterCommand, Envelope, LiveEvent, SpectatorCommand},
    errors::SessionError,
    registry::{ClientId, ConnectionRegistry},
};

pub fn decode_arbiter_command(text: &str) -> Result<ArbiterCommand, SessionError> {
    serde_json::from_str(text).map_err(|e| SessionError::InvalidCommand(e.to_string()))
}

/// Runs an arbiter command against `match_id` and broadcasts the result to the match. Returns the number of clients
/// that received the broadcast.
///
/// Nothing is broadcast unless the new state was saved. Timeouts skip the state machine and are never saved, but the
/// match must still exist.
pub async fn apply_arbiter_command<B>(
    api: &LiveMatchApi<B>,
    registry: &ConnectionRegistry,
    match_id: &MatchId,
    command: ArbiterCommand,
) -> Result<usize, SessionError>
where
    B: MatchStore + PlayerDirectory,
{
    let action = match (command.action(), command) {
        (Some(action), _) => action,
        (None, ArbiterCommand::Timeout { player, duration }) => {
            api.fetch_match(match_id).await?;
            debug!("🔌️ [{match_id}] Timeout for player {player} ({duration}s)");
            let event = LiveEvent::Timeout { match_id: match_id.clone(), jugador: player, duracion: duration };
            return Ok(registry.broadcast_to_match(match_id, &Envelope::now(event)));
        },
        (None, _) => return Ok(0),
    };
    let transition = api.apply(match_id, action).await?;
    let live_match = api.enrich(transition.snapshot.clone()).await;
    let event = LiveEvent::from_transition(transition, live_match);
    Ok(registry.broadcast_to_match(match_id, &Envelope::now(event)))
}

/// Handles one text frame from an arbiter.
///
/// Validation failures are reported to the arbiter alone and the session carries on. Backend failures are returned,
/// and end the session.
pub async fn handle_arbiter_message<B>(
    api: &LiveMatchApi<B>,
    registry: &ConnectionRegistry,
    client_id: &ClientId,
    match_id: &MatchId,
    text: &str,
) -> Result<(), SessionError>
where
    B: MatchStore + PlayerDirectory,
{
    let result = match decode_arbiter_command(text) {
        Ok(command) => apply_arbiter_command(api, registry, match_id, command).await.map(|_| ()),
        Err(e) => Err(e),
    };
    match result {
        Err(e) if e.is_validation() => {
            info!("🔌️ [{match_id}] Rejected command from {client_id}. {e}");
            registry.send_to(client_id, &Envelope::now(LiveEvent::error(e.to_string())));
            Ok(())
        },
        other => other,
    }
}

/// Sends the current state of `match_id` to one client.
pub async fn send_match_state<B>(
    api: &LiveMatchApi<B>,
    registry: &ConnectionRegistry,
    client_id: &ClientId,
    match_id: &MatchId,
) -> Result<bool, LiveMatchError>
where
    B: MatchStore + PlayerDirectory,
{
    let live_match = api.live_match(match_id).await?;
    let situacion = api.situation(&live_match.snapshot);
    Ok(registry.send_to(client_id, &Envelope::now(LiveEvent::MatchState { live_match, situacion })))
}

/// Sends the list of in-progress and paused matches to one client.
pub async fn send_active_matches<B>(
    api: &LiveMatchApi<B>,
    registry: &ConnectionRegistry,
    client_id: &ClientId,
) -> Result<bool, LiveMatchError>
where
    B: MatchStore + PlayerDirectory,
{
    let matches = api.active_matches().await?;
    Ok(registry.send_to(client_id, &Envelope::now(LiveEvent::ActiveMatches { matches })))
}

/// Sends a newly joined live client what it is watching: the match it asked for, or the active matches. Spectators
/// never receive errors, so failures are only logged.
pub async fn replay_for_client<B>(
    api: &LiveMatchApi<B>,
    registry: &ConnectionRegistry,
    client_id: &ClientId,
    match_id: Option<&MatchId>,
) where
    B: MatchStore + PlayerDirectory,
{
    let result = match match_id {
        Some(id) => send_match_state(api, registry, client_id, id).await,
        None => send_active_matches(api, registry, client_id).await,
    };
    if let Err(e) = result {
        warn!("🔌️ Could not replay the current state to {client_id}. {e}");
    }
}

/// Handles one text frame from a spectator, TV or admin client.
pub async fn handle_spectator_message<B>(
    api: &LiveMatchApi<B>,
    registry: &ConnectionRegistry,
    client_id: &ClientId,
    text: &str,
) where
    B: MatchStore + PlayerDirectory,
{
    match serde_json::from_str::<SpectatorCommand>(text) {
        Ok(SpectatorCommand::SubscribeMatch { match_id }) => {
            if registry.subscribe(client_id, match_id.clone()) {
                replay_for_client(api, registry, client_id, match_id.as_ref()).await;
            }
        },
        Ok(SpectatorCommand::Pong) => trace!("🔌️ Pong from {client_id}"),
        Err(e) => debug!("🔌️ Ignoring unreadable message from {client_id}. {e}"),
    }
}
