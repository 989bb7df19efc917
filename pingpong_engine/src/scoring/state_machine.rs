use chrono::{DateTime, Utc};
use log::*;

use super::{serving_side, set_winner, situation, ScoringError, Situation};
use crate::{
    db_types::{MatchSnapshot, MatchState, PointRecord, SetResult, Side},
    rules::RuleTable,
};

/// An arbiter action that changes the match state. Timeouts are deliberately absent: they are a broadcast-only
/// signal and never touch the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchAction {
    Point { scorer: Side, point_type: String },
    Undo,
    Start,
    Pause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointOutcome {
    pub point: PointRecord,
    /// Set if this point closed the current set.
    pub set_winner: Option<Side>,
    /// Set if this point closed the match.
    pub match_winner: Option<Side>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionKind {
    PointScored(PointOutcome),
    /// Carries the history entry that was removed.
    PointUndone(PointRecord),
    Started,
    Paused,
}

/// The result of applying a [`MatchAction`] to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub snapshot: MatchSnapshot,
    pub kind: TransitionKind,
    pub situation: Vec<Situation>,
}

#[derive(Debug, Clone, Default)]
pub struct MatchStateMachine {
    rules: RuleTable,
}

impl MatchStateMachine {
    pub fn new(rules: RuleTable) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn sets_to_win(&self, snapshot: &MatchSnapshot) -> u32 {
        self.rules.sets_to_win(&snapshot.match_type)
    }

    /// Applies `action` to a copy of `snapshot`. The input is never modified, so a rejected action leaves nothing to
    /// roll back.
    pub fn apply(
        &self,
        snapshot: &MatchSnapshot,
        action: MatchAction,
        now: DateTime<Utc>,
    ) -> Result<Transition, ScoringError> {
        let sets_to_win = self.sets_to_win(snapshot);
        let mut next = snapshot.clone();
        let kind = match action {
            MatchAction::Point { scorer, point_type } => {
                TransitionKind::PointScored(score_point(&mut next, scorer, point_type, sets_to_win, now)?)
            },
            MatchAction::Undo => TransitionKind::PointUndone(undo_point(&mut next)?),
            MatchAction::Start => {
                start(&mut next, now)?;
                TransitionKind::Started
            },
            MatchAction::Pause => {
                pause(&mut next)?;
                TransitionKind::Paused
            },
        };
        let situation = situation(&next, sets_to_win);
        Ok(Transition { snapshot: next, kind, situation })
    }

    /// The situational flags for a snapshot that is being replayed rather than changed.
    pub fn situation(&self, snapshot: &MatchSnapshot) -> Vec<Situation> {
        situation(snapshot, self.sets_to_win(snapshot))
    }
}

fn score_point(
    snapshot: &mut MatchSnapshot,
    scorer: Side,
    point_type: String,
    sets_to_win: u32,
    now: DateTime<Utc>,
) -> Result<PointOutcome, ScoringError> {
    if snapshot.state != MatchState::InProgress {
        return Err(ScoringError::InvalidState { action: "score a point in", state: snapshot.state });
    }
    let served_by = snapshot.server;
    *snapshot.points_mut(scorer) += 1;
    let point = PointRecord {
        time: now,
        set: snapshot.current_set,
        points_a: snapshot.points_a,
        points_b: snapshot.points_b,
        scorer,
        point_type,
        server: served_by,
    };
    snapshot.point_history.push(point.clone());
    trace!(
        "🏓️ [{}] Point to {scorer}. Set {} is {}-{}",
        snapshot.match_id,
        snapshot.current_set,
        snapshot.points_a,
        snapshot.points_b
    );
    let mut outcome = PointOutcome { point, set_winner: None, match_winner: None };
    if let Some(winner) =
        set_winner(snapshot.points_a, snapshot.points_b, snapshot.points_per_set, snapshot.min_win_margin)
    {
        snapshot.sets_detail.push(SetResult {
            set: snapshot.current_set,
            points_a: snapshot.points_a,
            points_b: snapshot.points_b,
            winner,
        });
        *snapshot.sets_mut(winner) += 1;
        outcome.set_winner = Some(winner);
        debug!(
            "🏓️ [{}] Set {} to {winner}. Sets are {}-{}",
            snapshot.match_id, snapshot.current_set, snapshot.sets_a, snapshot.sets_b
        );
        if snapshot.sets(winner) >= sets_to_win {
            finish(snapshot, winner, now);
            outcome.match_winner = Some(winner);
        } else {
            snapshot.current_set += 1;
            snapshot.points_a = 0;
            snapshot.points_b = 0;
        }
    }
    snapshot.server = serving_side(snapshot.first_server, snapshot.points_a, snapshot.points_b);
    Ok(outcome)
}

/// Removes the latest point. A point that closed a set is *not* reversed at the set level: `sets_detail`, the set
/// counters and `current_set` keep the committed values and only the current-set score is decremented (floored at
/// zero).
fn undo_point(snapshot: &mut MatchSnapshot) -> Result<PointRecord, ScoringError> {
    let last = snapshot.point_history.pop().ok_or(ScoringError::NothingToUndo)?;
    let points = snapshot.points_mut(last.scorer);
    *points = points.saturating_sub(1);
    snapshot.server = last.server;
    debug!(
        "🏓️ [{}] Undid point to {}. Set {} is {}-{}",
        snapshot.match_id, last.scorer, snapshot.current_set, snapshot.points_a, snapshot.points_b
    );
    Ok(last)
}

fn start(snapshot: &mut MatchSnapshot, now: DateTime<Utc>) -> Result<(), ScoringError> {
    match snapshot.state {
        MatchState::Pending | MatchState::Paused => {
            snapshot.state = MatchState::InProgress;
            if snapshot.started_at.is_none() {
                snapshot.started_at = Some(now);
            }
            info!("🏓️ [{}] Match is in progress", snapshot.match_id);
            Ok(())
        },
        state => Err(ScoringError::InvalidState { action: "start", state }),
    }
}

fn pause(snapshot: &mut MatchSnapshot) -> Result<(), ScoringError> {
    match snapshot.state {
        MatchState::InProgress => {
            snapshot.state = MatchState::Paused;
            info!("🏓️ [{}] Match paused", snapshot.match_id);
            Ok(())
        },
        state => Err(ScoringError::InvalidState { action: "pause", state }),
    }
}

fn finish(snapshot: &mut MatchSnapshot, winner: Side, now: DateTime<Utc>) {
    snapshot.state = MatchState::Finished;
    snapshot.winner_id = Some(snapshot.player_id(winner).clone());
    snapshot.finished_at = Some(now);
    snapshot.duration_seconds = snapshot.started_at.map(|t| (now - t).num_seconds());
    info!(
        "🏓️ [{}] Match won by {winner} ({}), {}-{} in sets",
        snapshot.match_id,
        snapshot.player_id(winner),
        snapshot.sets_a,
        snapshot.sets_b
    );
}
