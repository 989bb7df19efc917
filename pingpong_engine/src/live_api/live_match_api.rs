//! Drives a single match through the scoring state machine and the match store.

use std::fmt::Debug;

use chrono::Utc;
use log::*;

use super::{errors::LiveMatchError, match_objects::LiveMatch};
use crate::{
    db_types::{MatchId, MatchSnapshot, PlayerId, PlayerProfile},
    rules::RuleTable,
    scoring::{MatchAction, MatchStateMachine, Situation, Transition},
    traits::{MatchStore, PlayerDirectory},
};

/// `LiveMatchApi` glues the pure [`MatchStateMachine`] to a [`MatchStore`] backend.
///
/// Every state-changing call follows the same sequence: fetch the snapshot, compute the next state, save it. There is
/// no lock across that sequence. Two callers acting on the same match at the same time can both read the same
/// snapshot and the last save wins, so callers must ensure at most one writer per match.
pub struct LiveMatchApi<B> {
    db: B,
    machine: MatchStateMachine,
}

impl<B: Debug> Debug for LiveMatchApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LiveMatchApi ({:?})", self.db)
    }
}

impl<B> LiveMatchApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, machine: MatchStateMachine::default() }
    }

    pub fn with_rules(db: B, rules: RuleTable) -> Self {
        Self { db, machine: MatchStateMachine::new(rules) }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn machine(&self) -> &MatchStateMachine {
        &self.machine
    }

    /// The situational flags for a snapshot that is being replayed to a client.
    pub fn situation(&self, snapshot: &MatchSnapshot) -> Vec<Situation> {
        self.machine.situation(snapshot)
    }
}

impl<B> LiveMatchApi<B>
where B: MatchStore
{
    /// Fetches the snapshot for `match_id`, returning [`LiveMatchError::MatchNotFound`] if it does not exist.
    pub async fn fetch_match(&self, match_id: &MatchId) -> Result<MatchSnapshot, LiveMatchError> {
        self.db.fetch_match(match_id).await?.ok_or_else(|| LiveMatchError::MatchNotFound(match_id.clone()))
    }

    /// Applies an arbiter action to the match and persists the result.
    ///
    /// Validation failures (unknown match, illegal action) are returned before anything is written. If the save
    /// fails, the error is returned and the caller must not broadcast the transition.
    pub async fn apply(&self, match_id: &MatchId, action: MatchAction) -> Result<Transition, LiveMatchError> {
        let snapshot = self.fetch_match(match_id).await?;
        trace!("🏓️ [{match_id}] Applying {action:?}");
        let transition = self.machine.apply(&snapshot, action, Utc::now())?;
        self.db.save_match(&transition.snapshot).await.map_err(|e| {
            error!("🏓️ [{match_id}] Could not save match after a state change. {e}");
            LiveMatchError::from(e)
        })?;
        Ok(transition)
    }
}

impl<B> LiveMatchApi<B>
where B: PlayerDirectory
{
    /// Attaches player profiles to the snapshot. A failed lookup is logged and leaves the profile empty; display data
    /// is never worth failing a broadcast over.
    pub async fn enrich(&self, snapshot: MatchSnapshot) -> LiveMatch {
        let player_a = self.lookup_player(&snapshot.player_a_id).await;
        let player_b = self.lookup_player(&snapshot.player_b_id).await;
        LiveMatch { snapshot, player_a, player_b }
    }

    async fn lookup_player(&self, player_id: &PlayerId) -> Option<PlayerProfile> {
        match self.db.fetch_player(player_id).await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                debug!("🏓️ Player {player_id} is not in the directory");
                None
            },
            Err(e) => {
                warn!("🏓️ Could not look up player {player_id}. {e}");
                None
            },
        }
    }
}

impl<B> LiveMatchApi<B>
where B: MatchStore + PlayerDirectory
{
    pub async fn live_match(&self, match_id: &MatchId) -> Result<LiveMatch, LiveMatchError> {
        let snapshot = self.fetch_match(match_id).await?;
        Ok(self.enrich(snapshot).await)
    }

    /// All matches currently in progress or paused, enriched for display.
    pub async fn active_matches(&self) -> Result<Vec<LiveMatch>, LiveMatchError> {
        let snapshots = self.db.fetch_active_matches().await?;
        let mut result = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            result.push(self.enrich(snapshot).await);
        }
        Ok(result)
    }
}
