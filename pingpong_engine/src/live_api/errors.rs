use thiserror::Error;

use crate::{
    db_types::MatchId,
    scoring::ScoringError,
    traits::MatchStoreError,
};

#[derive(Debug, Clone, Error)]
pub enum LiveMatchError {
    #[error("Match {0} was not found")]
    MatchNotFound(MatchId),
    #[error("{0}")]
    Scoring(#[from] ScoringError),
    #[error("Could not save the match. {0}")]
    PersistenceError(#[from] MatchStoreError),
}

impl LiveMatchError {
    /// Validation errors are caused by the request (unknown match, action not legal right now). They are reported to
    /// the requesting client and leave the stored match untouched. Everything else is a backend failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, LiveMatchError::MatchNotFound(_) | LiveMatchError::Scoring(_))
    }
}
