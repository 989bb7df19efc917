//! # Match scoring
//!
//! Pure decision logic for a live table-tennis match. Nothing in this module performs I/O: the
//! [`MatchStateMachine`] takes the current [`MatchSnapshot`](crate::db_types::MatchSnapshot) and a [`MatchAction`]
//! and returns a [`Transition`] holding the next snapshot and the situational flags (set point, match point, deuce)
//! that go out with the broadcast.
//!
//! Persisting the new snapshot and fanning it out to connected clients is the job of the caller (see
//! [`LiveMatchApi`](crate::LiveMatchApi)).
mod errors;
mod situation;
mod state_machine;

pub use errors::ScoringError;
pub use situation::{serving_side, set_winner, situation, Situation, SituationKind, DEUCE_SERVE_THRESHOLD};
pub use state_machine::{MatchAction, MatchStateMachine, PointOutcome, Transition, TransitionKind};
