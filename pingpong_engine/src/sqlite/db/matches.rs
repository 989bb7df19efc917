//! Match documents are stored as a JSON snapshot, with the identity and state columns pulled out so that they can be
//! indexed and filtered on.
use log::*;
use sqlx::{Row, SqliteConnection};

use crate::{
    db_types::{MatchId, MatchSnapshot, MatchState},
    traits::MatchStoreError,
};

pub async fn fetch_match(
    match_id: &MatchId,
    conn: &mut SqliteConnection,
) -> Result<Option<MatchSnapshot>, MatchStoreError> {
    let row = sqlx::query("SELECT snapshot FROM matches WHERE match_id = $1")
        .bind(match_id.as_str())
        .fetch_optional(conn)
        .await?;
    match row {
        Some(row) => {
            let json: String = row.try_get("snapshot")?;
            let snapshot = serde_json::from_str(&json)?;
            Ok(Some(snapshot))
        },
        None => Ok(None),
    }
}

/// Inserts a new match. If a match with the same id already exists, it is left untouched and `false` is returned.
pub async fn insert_match(snapshot: &MatchSnapshot, conn: &mut SqliteConnection) -> Result<bool, MatchStoreError> {
    let json = serde_json::to_string(snapshot)?;
    let result = sqlx::query(
        r#"
            INSERT INTO matches (match_id, player_a_id, player_b_id, state, snapshot)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (match_id) DO NOTHING
        "#,
    )
    .bind(snapshot.match_id.as_str())
    .bind(snapshot.player_a_id.as_str())
    .bind(snapshot.player_b_id.as_str())
    .bind(snapshot.state.to_string())
    .bind(json)
    .execute(conn)
    .await?;
    let inserted = result.rows_affected() > 0;
    if inserted {
        debug!("🗃️ Match {} has been saved in the DB", snapshot.match_id);
    } else {
        debug!("🗃️ Match {} already exists. Nothing inserted", snapshot.match_id);
    }
    Ok(inserted)
}

pub async fn update_match(snapshot: &MatchSnapshot, conn: &mut SqliteConnection) -> Result<(), MatchStoreError> {
    let json = serde_json::to_string(snapshot)?;
    let result = sqlx::query(
        r#"
            UPDATE matches SET
                state = $1,
                snapshot = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE match_id = $3
        "#,
    )
    .bind(snapshot.state.to_string())
    .bind(json)
    .bind(snapshot.match_id.as_str())
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(MatchStoreError::MatchNotFound(snapshot.match_id.clone()));
    }
    trace!("🗃️ Match {} updated. State: {}", snapshot.match_id, snapshot.state);
    Ok(())
}

pub async fn fetch_matches_in_states(
    states: &[MatchState],
    conn: &mut SqliteConnection,
) -> Result<Vec<MatchSnapshot>, MatchStoreError> {
    let mut builder = sqlx::QueryBuilder::<sqlx::Sqlite>::new("SELECT snapshot FROM matches WHERE state IN (");
    let mut separated = builder.separated(", ");
    for state in states {
        separated.push_bind(state.to_string());
    }
    separated.push_unseparated(") ORDER BY updated_at DESC, match_id ASC");
    let rows = builder.build().fetch_all(conn).await?;
    rows.into_iter()
        .map(|row| {
            let json: String = row.try_get("snapshot")?;
            serde_json::from_str(&json).map_err(MatchStoreError::from)
        })
        .collect()
}
