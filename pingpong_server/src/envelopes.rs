//! Wire formats for the live sockets.
//!
//! Inbound messages are decoded into closed enums, one per socket role. Outbound messages are [`LiveEvent`]s wrapped
//! in an [`Envelope`] that stamps the send time.
use chrono::{DateTime, Utc};
use pingpong_engine::{
    db_types::{MatchId, PointRecord, Side},
    scoring::{MatchAction, Situation, Transition, TransitionKind},
    LiveMatch,
};
use serde::{Deserialize, Serialize};

use crate::registry::{ClientId, ClientType};

//--------------------------------------     Inbound       ----------------------------------------------------------
fn default_point_type() -> String {
    "normal".to_string()
}

/// Commands accepted on the arbiter channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ArbiterCommand {
    Point {
        #[serde(rename = "jugador")]
        player: Side,
        #[serde(rename = "tipo", default = "default_point_type")]
        point_type: String,
    },
    Undo,
    Start,
    Pause,
    Timeout {
        #[serde(rename = "jugador")]
        player: Side,
        #[serde(rename = "duracion", default)]
        duration: u32,
    },
}

impl ArbiterCommand {
    /// The state machine action for this command. Timeouts have none.
    pub fn action(&self) -> Option<MatchAction> {
        match self {
            Self::Point { player, point_type } => {
                Some(MatchAction::Point { scorer: *player, point_type: point_type.clone() })
            },
            Self::Undo => Some(MatchAction::Undo),
            Self::Start => Some(MatchAction::Start),
            Self::Pause => Some(MatchAction::Pause),
            Self::Timeout { .. } => None,
        }
    }
}

/// Messages accepted on the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpectatorCommand {
    SubscribeMatch {
        #[serde(default)]
        match_id: Option<MatchId>,
    },
    Pong,
}

//--------------------------------------     Outbound       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    Connected {
        client_id: ClientId,
        client_type: ClientType,
        match_id: Option<MatchId>,
    },
    MatchState {
        #[serde(rename = "match")]
        live_match: LiveMatch,
        situacion: Vec<Situation>,
    },
    ActiveMatches {
        matches: Vec<LiveMatch>,
    },
    PointScored {
        #[serde(rename = "match")]
        live_match: LiveMatch,
        point: PointRecord,
        set_ganado: bool,
        ganador_set: Option<Side>,
        partido_terminado: bool,
        ganador_partido: Option<Side>,
        situacion: Vec<Situation>,
    },
    PointUndone {
        #[serde(rename = "match")]
        live_match: LiveMatch,
        point: PointRecord,
        situacion: Vec<Situation>,
    },
    MatchStarted {
        #[serde(rename = "match")]
        live_match: LiveMatch,
    },
    MatchPaused {
        #[serde(rename = "match")]
        live_match: LiveMatch,
    },
    Timeout {
        match_id: MatchId,
        jugador: Side,
        duracion: u32,
    },
    Error {
        message: String,
    },
    Ping,
}

impl LiveEvent {
    /// Builds the broadcast for a state machine transition. `live_match` is the enriched form of
    /// `transition.snapshot`.
    pub fn from_transition(transition: Transition, live_match: LiveMatch) -> Self {
        let situacion = transition.situation;
        match transition.kind {
            TransitionKind::PointScored(outcome) => Self::PointScored {
                live_match,
                point: outcome.point,
                set_ganado: outcome.set_winner.is_some(),
                ganador_set: outcome.set_winner,
                partido_terminado: outcome.match_winner.is_some(),
                ganador_partido: outcome.match_winner,
                situacion,
            },
            TransitionKind::PointUndone(point) => Self::PointUndone { live_match, point, situacion },
            TransitionKind::Started => Self::MatchStarted { live_match },
            TransitionKind::Paused => Self::MatchPaused { live_match },
        }
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self::Error { message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub event: LiveEvent,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    pub fn new(event: LiveEvent, timestamp: DateTime<Utc>) -> Self {
        Self { event, timestamp }
    }

    pub fn now(event: LiveEvent) -> Self {
        Self::new(event, Utc::now())
    }
}

impl From<LiveEvent> for Envelope {
    fn from(event: LiveEvent) -> Self {
        Self::now(event)
    }
}
