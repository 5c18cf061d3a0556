use sqlx::SqliteConnection;

use crate::db_types::{CatalogProduct, ProductId};

/// Fetches an active catalog product. Inactive products are invisible to the
/// cart and order flow.
pub async fn fetch_product(
    id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<CatalogProduct>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, name, sku, price_base, currency, tax_rate_bp, stock, is_active FROM products \
         WHERE id = $1 AND is_active",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Decrements stock at submission time. Stock may go negative; back-orders
/// are reconciled manually by the back office.
pub async fn decrement_stock(
    id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(quantity)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
