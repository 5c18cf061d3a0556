use sqlx::SqliteConnection;

use crate::db_types::{UserId, UserInfo};

pub async fn fetch_user(
    id: UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<UserInfo>, sqlx::Error> {
    sqlx::query_as("SELECT id, role, email, name FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// The seller a client is routed to, if the back office has assigned one.
pub async fn assigned_seller_of(
    client_id: UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<UserId>, sqlx::Error> {
    let seller: Option<(Option<UserId>,)> =
        sqlx::query_as("SELECT assigned_seller_id FROM users WHERE id = $1")
            .bind(client_id)
            .fetch_optional(conn)
            .await?;
    Ok(seller.and_then(|(s,)| s))
}
