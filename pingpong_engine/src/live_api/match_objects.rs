use serde::{Deserialize, Serialize};

use crate::db_types::{MatchSnapshot, PlayerProfile};

/// A match snapshot enriched with player display data. This is what spectators see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMatch {
    #[serde(flatten)]
    pub snapshot: MatchSnapshot,
    pub player_a: Option<PlayerProfile>,
    pub player_b: Option<PlayerProfile>,
}

impl LiveMatch {
    pub fn new(snapshot: MatchSnapshot) -> Self {
        Self { snapshot, player_a: None, player_b: None }
    }
}

impl From<MatchSnapshot> for LiveMatch {
    fn from(snapshot: MatchSnapshot) -> Self {
        Self::new(snapshot)
    }
}
