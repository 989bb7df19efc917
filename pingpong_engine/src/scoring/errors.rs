use thiserror::Error;

use crate::db_types::MatchState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("Cannot {action} a match that is {state}")]
    InvalidState { action: &'static str, state: MatchState },
    #[error("There are no points to undo")]
    NothingToUndo,
}
