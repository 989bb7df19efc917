use thiserror::Error;

use crate::db_types::{PlayerId, PlayerProfile};

#[derive(Debug, Clone, Error)]
pub enum PlayerDirectoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for PlayerDirectoryError {
    fn from(e: sqlx::Error) -> Self {
        PlayerDirectoryError::DatabaseError(e.to_string())
    }
}

/// Read-only lookup of player display data, used to enrich match snapshots before they are broadcast.
#[allow(async_fn_in_trait)]
pub trait PlayerDirectory {
    async fn fetch_player(&self, player_id: &PlayerId) -> Result<Option<PlayerProfile>, PlayerDirectoryError>;
}
