use sqlx::SqliteConnection;

/// Allocates the next value of a named sequential counter. Runs inside the
/// caller's transaction so a rolled-back submission does not burn a number
/// under concurrent writers.
pub async fn next_value(name: &str, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let (value,): (i64,) = sqlx::query_as(
        r#"
            INSERT INTO counters (name, value) VALUES ($1, 1)
            ON CONFLICT (name) DO UPDATE SET value = value + 1
            RETURNING value;
        "#,
    )
    .bind(name)
    .fetch_one(conn)
    .await?;
    Ok(value)
}
