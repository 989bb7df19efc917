use thiserror::Error;

use crate::db_types::{MatchId, MatchSnapshot};

#[derive(Debug, Clone, Error)]
pub enum MatchStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Stored match document could not be decoded: {0}")]
    DecodeError(String),
    #[error("Match {0} does not exist")]
    MatchNotFound(MatchId),
}

impl From<sqlx::Error> for MatchStoreError {
    fn from(e: sqlx::Error) -> Self {
        MatchStoreError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for MatchStoreError {
    fn from(e: serde_json::Error) -> Self {
        MatchStoreError::DecodeError(e.to_string())
    }
}

/// The `MatchStore` trait defines the persistence contract for match documents.
///
/// The live engine only ever reads a snapshot, hands it to the state machine and writes the result back. Creating
/// matches, editing their rules and deleting them are administrative concerns that live outside this trait.
#[allow(async_fn_in_trait)]
pub trait MatchStore {
    /// Fetches the current snapshot for the given match. If the match does not exist, `None` is returned.
    async fn fetch_match(&self, match_id: &MatchId) -> Result<Option<MatchSnapshot>, MatchStoreError>;

    /// Overwrites the live fields of an existing match with those in `snapshot`. Saving a match that does not exist
    /// is an error.
    async fn save_match(&self, snapshot: &MatchSnapshot) -> Result<(), MatchStoreError>;

    /// Fetches every match that is currently being played or is paused.
    async fn fetch_active_matches(&self) -> Result<Vec<MatchSnapshot>, MatchStoreError>;
}
