use sqlx::SqliteConnection;

use crate::{
    db_types::{PlayerId, PlayerProfile},
    traits::PlayerDirectoryError,
};

pub async fn fetch_player(
    player_id: &PlayerId,
    conn: &mut SqliteConnection,
) -> Result<Option<PlayerProfile>, PlayerDirectoryError> {
    let player = sqlx::query_as::<_, PlayerProfile>(
        "SELECT id, name, nickname, photo_url, rating FROM players WHERE id = $1",
    )
    .bind(player_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(player)
}

pub async fn upsert_player(player: &PlayerProfile, conn: &mut SqliteConnection) -> Result<(), PlayerDirectoryError> {
    sqlx::query(
        r#"
            INSERT INTO players (id, name, nickname, photo_url, rating) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                nickname = excluded.nickname,
                photo_url = excluded.photo_url,
                rating = excluded.rating,
                updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(player.id.as_str())
    .bind(&player.name)
    .bind(&player.nickname)
    .bind(&player.photo_url)
    .bind(player.rating)
    .execute(conn)
    .await?;
    Ok(())
}
