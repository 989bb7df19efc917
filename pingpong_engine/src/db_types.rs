use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

pub const DEFAULT_POINTS_PER_SET: u32 = 11;
pub const DEFAULT_MIN_WIN_MARGIN: u32 = 2;
pub const DEFAULT_MATCH_TYPE: &str = "best_of_5";

//--------------------------------------     MatchId       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl MatchId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for MatchId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

//--------------------------------------     PlayerId       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for PlayerId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

//--------------------------------------       Side         ---------------------------------------------------------
/// One of the two players in a match. On the wire these are the tokens `"a"` and `"b"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "a"),
            Side::B => write!(f, "b"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid player token: {0}")]
pub struct SideConversionError(String);

impl FromStr for Side {
    type Err = SideConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "A" => Ok(Side::A),
            "b" | "B" => Ok(Side::B),
            _ => Err(SideConversionError(s.to_string())),
        }
    }
}

//--------------------------------------     MatchState       -------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    #[default]
    Pending,
    InProgress,
    Paused,
    Finished,
    Cancelled,
}

impl MatchState {
    /// Matches in these states are listed to spectators joining the global feed.
    pub fn is_active(&self) -> bool {
        matches!(self, MatchState::InProgress | MatchState::Paused)
    }
}

impl Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchState::Pending => "pending",
            MatchState::InProgress => "in_progress",
            MatchState::Paused => "paused",
            MatchState::Finished => "finished",
            MatchState::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid match state: {0}")]
pub struct MatchStateConversionError(String);

impl FromStr for MatchState {
    type Err = MatchStateConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "paused" => Ok(Self::Paused),
            "finished" => Ok(Self::Finished),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(MatchStateConversionError(s.to_string())),
        }
    }
}

//--------------------------------------     PointRecord       ------------------------------------------------------
/// A single entry in the point history. `server` is who served the point (i.e. the server *before* the point was
/// scored), while `points_a`/`points_b` hold the score *after* it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRecord {
    pub time: DateTime<Utc>,
    pub set: u32,
    pub points_a: u32,
    pub points_b: u32,
    pub scorer: Side,
    pub point_type: String,
    pub server: Side,
}

//--------------------------------------      SetResult       ------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetResult {
    pub set: u32,
    pub points_a: u32,
    pub points_b: u32,
    pub winner: Side,
}

//--------------------------------------    MatchSnapshot     ------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub player_a_id: PlayerId,
    pub player_b_id: PlayerId,
    #[serde(default)]
    pub points_a: u32,
    #[serde(default)]
    pub points_b: u32,
    #[serde(default)]
    pub sets_a: u32,
    #[serde(default)]
    pub sets_b: u32,
    pub current_set: u32,
    #[serde(default)]
    pub sets_detail: Vec<SetResult>,
    pub points_per_set: u32,
    pub min_win_margin: u32,
    pub match_type: String,
    pub first_server: Side,
    pub server: Side,
    #[serde(default)]
    pub state: MatchState,
    #[serde(default)]
    pub point_history: Vec<PointRecord>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub winner_id: Option<PlayerId>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
}

impl MatchSnapshot {
    /// Creates a pending match with standard rules: sets to 11, a two point margin, best of five, player A serving
    /// first.
    pub fn new<M: Into<MatchId>, P: Into<PlayerId>>(match_id: M, player_a: P, player_b: P) -> Self {
        Self {
            match_id: match_id.into(),
            player_a_id: player_a.into(),
            player_b_id: player_b.into(),
            points_a: 0,
            points_b: 0,
            sets_a: 0,
            sets_b: 0,
            current_set: 1,
            sets_detail: vec![],
            points_per_set: DEFAULT_POINTS_PER_SET,
            min_win_margin: DEFAULT_MIN_WIN_MARGIN,
            match_type: DEFAULT_MATCH_TYPE.to_string(),
            first_server: Side::A,
            server: Side::A,
            state: MatchState::Pending,
            point_history: vec![],
            started_at: None,
            winner_id: None,
            finished_at: None,
            duration_seconds: None,
        }
    }

    pub fn with_rules(mut self, points_per_set: u32, min_win_margin: u32) -> Self {
        self.points_per_set = points_per_set;
        self.min_win_margin = min_win_margin;
        self
    }

    pub fn with_match_type<S: Into<String>>(mut self, match_type: S) -> Self {
        self.match_type = match_type.into();
        self
    }

    pub fn with_first_server(mut self, side: Side) -> Self {
        self.first_server = side;
        self.server = side;
        self
    }

    pub fn with_state(mut self, state: MatchState) -> Self {
        self.state = state;
        self
    }

    pub fn points(&self, side: Side) -> u32 {
        match side {
            Side::A => self.points_a,
            Side::B => self.points_b,
        }
    }

    pub fn points_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::A => &mut self.points_a,
            Side::B => &mut self.points_b,
        }
    }

    pub fn sets(&self, side: Side) -> u32 {
        match side {
            Side::A => self.sets_a,
            Side::B => self.sets_b,
        }
    }

    pub fn sets_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::A => &mut self.sets_a,
            Side::B => &mut self.sets_b,
        }
    }

    pub fn player_id(&self, side: Side) -> &PlayerId {
        match side {
            Side::A => &self.player_a_id,
            Side::B => &self.player_b_id,
        }
    }
}

//--------------------------------------    PlayerProfile     ------------------------------------------------------
/// Display data for a player. Read-only as far as the live engine is concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: PlayerId,
    pub name: String,
    pub nickname: Option<String>,
    pub photo_url: Option<String>,
    pub rating: Option<i64>,
}
