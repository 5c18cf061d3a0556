use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    aggregation::OrderTotals,
    api::order_objects::OrderQueryFilter,
    db_types::{Order, OrderCode, OrderId, OrderStatus, QuoteContact, UserId},
};

/// Creates the implicit draft order for a client. The assigned seller, when
/// the client has one, is recorded on the order immediately so it is already
/// routed when submitted.
pub async fn insert_draft(
    client_id: UserId,
    seller_id: Option<UserId>,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (order_type, status, currency, client_id, seller_id)
            VALUES ('ORDER', 'DRAFT', 'ARS', $1, $2)
            RETURNING *;
        "#,
    )
    .bind(client_id)
    .bind(seller_id)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

/// The client's current draft order, if one exists. At most one draft per
/// client is maintained by construction: drafts are only created here when
/// none exists.
pub async fn fetch_draft(
    client_id: UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE client_id = $1 AND status = 'DRAFT' ORDER BY id LIMIT 1")
        .bind(client_id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

/// The compare-and-swap status write. Returns `None` when the row no longer
/// carries `from` — the caller decides between "not found" and "conflict".
pub async fn update_status_cas(
    id: OrderId,
    from: OrderStatus,
    to: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(to)
    .bind(id)
    .bind(from)
    .fetch_optional(conn)
    .await
}

/// The submission write: freezes the computed totals, stamps the code and the
/// submission time, and flips `DRAFT → SUBMITTED`, all guarded by the same
/// status CAS as every other transition.
pub async fn finalize_submission(
    id: OrderId,
    totals: &OrderTotals,
    code: &OrderCode,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET
                status = 'SUBMITTED',
                code = $1,
                subtotal = $2,
                tax_total = $3,
                total = $4,
                submitted_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $5 AND status = 'DRAFT'
            RETURNING *;
        "#,
    )
    .bind(code)
    .bind(totals.subtotal)
    .bind(totals.tax_total)
    .bind(totals.total)
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// CAS variant that records the seller along with the status change.
pub async fn assign_cas(
    id: OrderId,
    from: OrderStatus,
    to: OrderStatus,
    seller_id: UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, seller_id = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND status = $4
            RETURNING *;
        "#,
    )
    .bind(to)
    .bind(seller_id)
    .bind(id)
    .bind(from)
    .fetch_optional(conn)
    .await
}

/// Stores a guest quote request. Quotes skip the draft stage entirely and
/// enter as `SUBMITTED`.
pub async fn insert_quote_order(
    contact: &QuoteContact,
    code: &OrderCode,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO orders (
                code,
                order_type,
                status,
                currency,
                contact_name,
                contact_email,
                contact_phone,
                contact_message,
                submitted_at
            ) VALUES ($1, 'QUOTE', 'SUBMITTED', 'ARS', $2, $3, $4, $5, CURRENT_TIMESTAMP)
            RETURNING *;
        "#,
    )
    .bind(code)
    .bind(&contact.name)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.message)
    .fetch_one(conn)
    .await
}

pub async fn touch(id: OrderId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET updated_at = CURRENT_TIMESTAMP WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Fetches orders matching the filter, oldest first.
pub async fn search_orders(
    filter: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(client_id) = filter.client_id {
        where_clause.push("client_id = ");
        where_clause.push_bind_unseparated(client_id);
    }
    if let Some(seller_id) = filter.seller_id {
        where_clause.push("seller_id = ");
        where_clause.push_bind_unseparated(seller_id);
    }
    if let Some(order_type) = filter.order_type {
        where_clause.push("order_type = ");
        where_clause.push_bind_unseparated(order_type.to_string());
    }
    if !filter.status.is_empty() {
        let statuses =
            filter.status.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    if let Some(since) = filter.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = filter.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    query.fetch_all(conn).await
}
