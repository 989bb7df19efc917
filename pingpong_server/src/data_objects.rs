use pingpong_engine::db_types::MatchId;
use serde::{Deserialize, Serialize};

use crate::registry::ClientType;

/// Query parameters for the live feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveFeedParams {
    #[serde(default)]
    pub match_id: Option<MatchId>,
    #[serde(rename = "type", default)]
    pub client_type: ClientType,
}

/// Reply to an operator broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub success: bool,
    pub delivered: usize,
}
