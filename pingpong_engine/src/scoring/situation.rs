use serde::{Deserialize, Serialize};

use crate::db_types::{MatchSnapshot, MatchState, Side};

/// Once *both* players have this many points in a set, the serve changes after every point instead of every two.
pub const DEUCE_SERVE_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SituationKind {
    SetPoint,
    MatchPoint,
    Deuce,
}

/// A derived flag describing the tension of the current rally. These are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Situation {
    #[serde(rename = "tipo")]
    pub kind: SituationKind,
    #[serde(rename = "jugador")]
    pub player: Option<Side>,
}

impl Situation {
    pub fn deuce() -> Self {
        Self { kind: SituationKind::Deuce, player: None }
    }

    pub fn set_point(player: Side) -> Self {
        Self { kind: SituationKind::SetPoint, player: Some(player) }
    }

    pub fn match_point(player: Side) -> Self {
        Self { kind: SituationKind::MatchPoint, player: Some(player) }
    }
}

/// Who serves next, given the current-set score.
///
/// The serve alternates every two points until both players reach [`DEUCE_SERVE_THRESHOLD`], after which it
/// alternates every point.
pub fn serving_side(first_server: Side, points_a: u32, points_b: u32) -> Side {
    let total = points_a + points_b;
    let switch_every =
        if points_a >= DEUCE_SERVE_THRESHOLD && points_b >= DEUCE_SERVE_THRESHOLD { 1 } else { 2 };
    if (total / switch_every) % 2 == 0 {
        first_server
    } else {
        first_server.opponent()
    }
}

/// Returns the winner of the set if the score closes it: the leader has at least `points_per_set` points and leads
/// by at least `min_win_margin`.
pub fn set_winner(points_a: u32, points_b: u32, points_per_set: u32, min_win_margin: u32) -> Option<Side> {
    let (leader, lead, trail) = match points_a.cmp(&points_b) {
        std::cmp::Ordering::Greater => (Side::A, points_a, points_b),
        std::cmp::Ordering::Less => (Side::B, points_b, points_a),
        std::cmp::Ordering::Equal => return None,
    };
    (lead >= points_per_set && lead - trail >= min_win_margin).then_some(leader)
}

/// Computes the situational flags for the snapshot as it stands. A finished match has none.
pub fn situation(snapshot: &MatchSnapshot, sets_to_win: u32) -> Vec<Situation> {
    let mut result = Vec::new();
    if snapshot.state == MatchState::Finished {
        return result;
    }
    let (a, b) = (snapshot.points_a, snapshot.points_b);
    if a == b && a >= snapshot.points_per_set.saturating_sub(1) {
        result.push(Situation::deuce());
    }
    for side in [Side::A, Side::B] {
        let own = snapshot.points(side);
        let other = snapshot.points(side.opponent());
        if own <= other {
            continue;
        }
        let (next_a, next_b) = match side {
            Side::A => (own + 1, other),
            Side::B => (other, own + 1),
        };
        if set_winner(next_a, next_b, snapshot.points_per_set, snapshot.min_win_margin).is_some() {
            if snapshot.sets(side) + 1 >= sets_to_win {
                result.push(Situation::match_point(side));
            } else {
                result.push(Situation::set_point(side));
            }
        }
    }
    result
}
