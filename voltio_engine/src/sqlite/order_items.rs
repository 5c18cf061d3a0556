use sqlx::SqliteConnection;
use voltio_common::Money;

use crate::{
    aggregation::LineSnapshot,
    db_types::{OrderId, OrderItem, ProductId, QuoteLine},
};

pub async fn items_for_order(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

pub async fn find_item(
    order_id: OrderId,
    item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 AND id = $2")
        .bind(order_id)
        .bind(item_id)
        .fetch_optional(conn)
        .await
}

pub async fn find_item_for_product(
    order_id: OrderId,
    product_id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 AND product_id = $2")
        .bind(order_id)
        .bind(product_id)
        .fetch_optional(conn)
        .await
}

/// Writes a priced line snapshot as a new item row. Item rows are immutable;
/// merges and quantity edits delete the old row and insert through here.
pub async fn insert_snapshot(
    order_id: OrderId,
    product_id: Option<ProductId>,
    snapshot: &LineSnapshot,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, name, sku, quantity, unit_price, tax_rate_bp, subtotal)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .bind(&snapshot.name)
    .bind(&snapshot.sku)
    .bind(snapshot.quantity)
    .bind(snapshot.unit_price)
    .bind(snapshot.tax_rate_bp)
    .bind(snapshot.subtotal)
    .fetch_one(conn)
    .await
}

/// Re-inserts an existing snapshot with a new quantity. Prices carry over
/// unchanged; only the quantity and the extended subtotal differ.
pub async fn insert_replacement(
    item: &OrderItem,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    let subtotal: Option<Money> = item.unit_price.map(|p| p * quantity);
    sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, name, sku, quantity, unit_price, tax_rate_bp, subtotal)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(item.order_id)
    .bind(item.product_id)
    .bind(&item.name)
    .bind(&item.sku)
    .bind(quantity)
    .bind(item.unit_price)
    .bind(item.tax_rate_bp)
    .bind(subtotal)
    .fetch_one(conn)
    .await
}

/// Writes an unpriced guest quote line.
pub async fn insert_quote_line(
    order_id: OrderId,
    line: &QuoteLine,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, name, sku, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(line.product_id)
    .bind(&line.name)
    .bind(&line.sku)
    .bind(line.quantity.max(1))
    .fetch_one(conn)
    .await
}

pub async fn delete_item(item_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM order_items WHERE id = $1").bind(item_id).execute(conn).await?;
    Ok(())
}

pub async fn clear_items(order_id: OrderId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(order_id).execute(conn).await?;
    Ok(())
}
