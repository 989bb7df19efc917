//! Process-wide registry of live WebSocket connections.
//!
//! Every connection belongs to exactly one group: either the group for the match it watches, or the global group,
//! which receives the updates for *every* match. Broadcasting to a match therefore reaches that match's group and
//! then the global group.
//!
//! Delivery is best-effort. Each client is represented by the sending half of an unbounded channel that its session
//! drains into the socket. A failed send means the session has gone away, and the client is disconnected on the spot.
//! Such failures are never reported to the broadcaster.
//!
//! The membership maps are shared between all worker threads and guarded by a single mutex. Sends on an unbounded
//! channel never block, so they are done while holding the lock.
use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use futures::channel::mpsc::UnboundedSender;
use log::*;
use pingpong_engine::db_types::MatchId;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    envelopes::{Envelope, LiveEvent},
    helpers::to_json,
};

pub type ClientSender = UnboundedSender<String>;

//--------------------------------------     ClientId       ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn random(client_type: ClientType) -> Self {
        let suffix: String = thread_rng().sample_iter(&Alphanumeric).take(12).map(char::from).collect();
        Self(format!("{client_type}_{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------     ClientType       --------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    #[default]
    Spectator,
    Arbiter,
    Tv,
    Admin,
}

impl Display for ClientType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ClientType::Spectator => "spectator",
            ClientType::Arbiter => "arbiter",
            ClientType::Tv => "tv",
            ClientType::Admin => "admin",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid client type: {0}")]
pub struct ClientTypeConversionError(String);

impl FromStr for ClientType {
    type Err = ClientTypeConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spectator" => Ok(Self::Spectator),
            "arbiter" => Ok(Self::Arbiter),
            "tv" => Ok(Self::Tv),
            "admin" => Ok(Self::Admin),
            _ => Err(ClientTypeConversionError(s.to_string())),
        }
    }
}

//--------------------------------------     ConnectionEntry       ---------------------------------------------------
#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    pub client_id: ClientId,
    pub client_type: ClientType,
    /// `None` means the client is in the global group.
    pub match_id: Option<MatchId>,
    pub connected_at: DateTime<Utc>,
    sender: ClientSender,
}

//--------------------------------------     RegistryStats       -----------------------------------------------------
/// A point-in-time view of the registry. Not synchronised with concurrent connects and disconnects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total: usize,
    pub global_watchers: usize,
    pub matches_watched: usize,
    pub per_match: HashMap<MatchId, usize>,
    pub per_type: HashMap<ClientType, usize>,
}

//--------------------------------------     ConnectionRegistry       ------------------------------------------------
#[derive(Default)]
struct RegistryState {
    connections: HashMap<ClientId, ConnectionEntry>,
    match_groups: HashMap<MatchId, HashSet<ClientId>>,
    global: HashSet<ClientId>,
}

impl RegistryState {
    fn join(&mut self, client_id: &ClientId, match_id: Option<&MatchId>) {
        match match_id {
            Some(id) => {
                self.match_groups.entry(id.clone()).or_default().insert(client_id.clone());
            },
            None => {
                self.global.insert(client_id.clone());
            },
        }
    }

    fn leave(&mut self, client_id: &ClientId, match_id: Option<&MatchId>) {
        match match_id {
            Some(id) => {
                if let Some(group) = self.match_groups.get_mut(id) {
                    group.remove(client_id);
                    if group.is_empty() {
                        self.match_groups.remove(id);
                    }
                }
            },
            None => {
                self.global.remove(client_id);
            },
        }
    }

    fn remove(&mut self, client_id: &ClientId) -> Option<ConnectionEntry> {
        let entry = self.connections.remove(client_id)?;
        self.leave(client_id, entry.match_id.as_ref());
        // A client is only ever in one group, but make sure nothing is left behind.
        self.global.remove(client_id);
        Some(entry)
    }

    /// Sends `msg` to each of `targets`, returning the number delivered and the clients whose channel is closed.
    fn deliver<'a, I>(&self, targets: I, msg: &str) -> (usize, Vec<ClientId>)
    where I: IntoIterator<Item = &'a ClientId> {
        let mut delivered = 0;
        let mut failed = Vec::new();
        for client_id in targets {
            match self.connections.get(client_id) {
                Some(entry) => match entry.sender.unbounded_send(msg.to_string()) {
                    Ok(()) => delivered += 1,
                    Err(_) => failed.push(client_id.clone()),
                },
                None => failed.push(client_id.clone()),
            }
        }
        (delivered, failed)
    }
}

/// Shared handle to the connection registry. Cloning is cheap and every clone sees the same connections.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // The maps are left consistent at every await-free step, so a poisoned lock is still safe to use.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a new connection and sends it a `connected` envelope. The client joins the group for `match_id` if
    /// one is given, and the global group otherwise.
    pub fn connect(&self, sender: ClientSender, client_type: ClientType, match_id: Option<MatchId>) -> ClientId {
        let client_id = ClientId::random(client_type);
        let entry = ConnectionEntry {
            client_id: client_id.clone(),
            client_type,
            match_id: match_id.clone(),
            connected_at: Utc::now(),
            sender,
        };
        {
            let mut state = self.lock();
            state.join(&client_id, match_id.as_ref());
            state.connections.insert(client_id.clone(), entry);
        }
        match &match_id {
            Some(id) => info!("📡️ {client_type} {client_id} connected to match {id}"),
            None => info!("📡️ {client_type} {client_id} connected to the global feed"),
        }
        let connected = Envelope::now(LiveEvent::Connected { client_id: client_id.clone(), client_type, match_id });
        self.send_to(&client_id, &connected);
        client_id
    }

    /// Removes the client from its group and from the registry. Calling this for an unknown client does nothing.
    pub fn disconnect(&self, client_id: &ClientId) {
        let removed = self.lock().remove(client_id);
        if let Some(entry) = removed {
            let secs = (Utc::now() - entry.connected_at).num_seconds();
            info!("📡️ {} {client_id} disconnected after {secs}s", entry.client_type);
        }
    }

    /// Moves a client into the group for `match_id`, or into the global group if `None`. Returns false if the client
    /// is not registered.
    pub fn subscribe(&self, client_id: &ClientId, match_id: Option<MatchId>) -> bool {
        let mut state = self.lock();
        let Some(current) = state.connections.get(client_id).map(|e| e.match_id.clone()) else {
            return false;
        };
        state.leave(client_id, current.as_ref());
        state.join(client_id, match_id.as_ref());
        if let Some(entry) = state.connections.get_mut(client_id) {
            entry.match_id = match_id.clone();
        }
        match match_id {
            Some(id) => debug!("📡️ {client_id} now watches match {id}"),
            None => debug!("📡️ {client_id} now watches the global feed"),
        }
        true
    }

    /// Best-effort unicast. Returns true if the message was handed to the client's session. A failed send disconnects
    /// the client.
    pub fn send_to<T: Serialize>(&self, client_id: &ClientId, message: &T) -> bool {
        let Some(msg) = to_json(message) else {
            return false;
        };
        let (delivered, failed) = self.lock().deliver([client_id], &msg);
        self.drop_failed(failed);
        delivered == 1
    }

    /// Sends the message to every watcher of `match_id`, and then to every global watcher. Returns the number of
    /// clients reached.
    pub fn broadcast_to_match<T: Serialize>(&self, match_id: &MatchId, message: &T) -> usize {
        let Some(msg) = to_json(message) else {
            return 0;
        };
        let (delivered, failed) = {
            let state = self.lock();
            let (in_match, mut failed) = match state.match_groups.get(match_id) {
                Some(group) => state.deliver(group, &msg),
                None => (0, Vec::new()),
            };
            let (global, global_failed) = state.deliver(&state.global, &msg);
            failed.extend(global_failed);
            (in_match + global, failed)
        };
        trace!("📡️ Broadcast for match {match_id} reached {delivered} clients");
        self.drop_failed(failed);
        delivered
    }

    /// Sends the message to the global group only.
    pub fn broadcast_global<T: Serialize>(&self, message: &T) -> usize {
        let Some(msg) = to_json(message) else {
            return 0;
        };
        let (delivered, failed) = {
            let state = self.lock();
            state.deliver(&state.global, &msg)
        };
        self.drop_failed(failed);
        delivered
    }

    /// Sends the message to every live connection, whatever it is watching.
    pub fn broadcast_to_all<T: Serialize>(&self, message: &T) -> usize {
        let Some(msg) = to_json(message) else {
            return 0;
        };
        let (delivered, failed) = {
            let state = self.lock();
            state.deliver(state.connections.keys(), &msg)
        };
        self.drop_failed(failed);
        delivered
    }

    pub fn stats(&self) -> RegistryStats {
        let state = self.lock();
        let per_match = state.match_groups.iter().map(|(id, group)| (id.clone(), group.len())).collect();
        let mut per_type = HashMap::new();
        for entry in state.connections.values() {
            *per_type.entry(entry.client_type).or_insert(0) += 1;
        }
        RegistryStats {
            total: state.connections.len(),
            global_watchers: state.global.len(),
            matches_watched: state.match_groups.len(),
            per_match,
            per_type,
        }
    }

    pub fn connection(&self, client_id: &ClientId) -> Option<ConnectionEntry> {
        self.lock().connections.get(client_id).cloned()
    }

    fn drop_failed(&self, failed: Vec<ClientId>) {
        for client_id in failed {
            debug!("📡️ Could not send to {client_id}. Dropping the connection.");
            self.disconnect(&client_id);
        }
    }
}
