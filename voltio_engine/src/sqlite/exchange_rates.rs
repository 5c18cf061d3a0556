use sqlx::SqliteConnection;

use crate::db_types::{Currency, ExchangeRate};

pub async fn fetch_last_rate(
    currency: Currency,
    conn: &mut SqliteConnection,
) -> Result<Option<ExchangeRate>, sqlx::Error> {
    sqlx::query_as(
        "SELECT base_currency, buy, sell, source, updated_at FROM exchange_rates \
         WHERE base_currency = $1 ORDER BY updated_at DESC LIMIT 1",
    )
    .bind(currency)
    .fetch_optional(conn)
    .await
}

pub async fn set_rate(rate: &ExchangeRate, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO exchange_rates (base_currency, buy, sell, source, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (base_currency, source) DO UPDATE SET
                buy = excluded.buy,
                sell = excluded.sell,
                updated_at = excluded.updated_at;
        "#,
    )
    .bind(rate.base_currency)
    .bind(rate.buy)
    .bind(rate.sell)
    .bind(&rate.source)
    .bind(rate.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}
