//! `SqliteDatabase` is a concrete implementation of a live match engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, migrate::MigrateError, SqlitePool};

use super::db::{matches, new_pool, players};
use crate::{
    db_types::{MatchId, MatchSnapshot, MatchState, PlayerId, PlayerProfile},
    traits::{MatchStore, MatchStoreError, PlayerDirectory, PlayerDirectoryError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl MatchStore for SqliteDatabase {
    async fn fetch_match(&self, match_id: &MatchId) -> Result<Option<MatchSnapshot>, MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::fetch_match(match_id, &mut conn).await
    }

    async fn save_match(&self, snapshot: &MatchSnapshot) -> Result<(), MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::update_match(snapshot, &mut conn).await
    }

    async fn fetch_active_matches(&self) -> Result<Vec<MatchSnapshot>, MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::fetch_matches_in_states(&[MatchState::InProgress, MatchState::Paused], &mut conn).await
    }
}

impl PlayerDirectory for SqliteDatabase {
    async fn fetch_player(&self, player_id: &PlayerId) -> Result<Option<PlayerProfile>, PlayerDirectoryError> {
        let mut conn = self.pool.acquire().await?;
        players::fetch_player(player_id, &mut conn).await
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }

    /// Stores a new match document. Returns `false` if a match with the same id already exists.
    pub async fn insert_match(&self, snapshot: &MatchSnapshot) -> Result<bool, MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::insert_match(snapshot, &mut conn).await
    }

    pub async fn upsert_player(&self, player: &PlayerProfile) -> Result<(), PlayerDirectoryError> {
        let mut conn = self.pool.acquire().await?;
        players::upsert_player(player, &mut conn).await
    }
}
