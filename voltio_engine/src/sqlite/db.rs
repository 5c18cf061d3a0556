use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{counters, exchange_rates, new_pool, order_items, orders, products, users};
use crate::{
    aggregation,
    api::{errors::OrderFlowError, order_objects::OrderQueryFilter},
    db_types::{
        CatalogProduct, Currency, ExchangeRate, Order, OrderCode, OrderId, OrderStatus,
        OrderWithItems, ProductId, QuoteContact, QuoteLine, UserId, UserInfo,
    },
    traits::{ExchangeRateError, ExchangeRates, StorefrontDatabase},
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

impl SqliteDatabase {
    /// Creates a new database API object using `VOLTIO_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = super::db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl StorefrontDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(id, &mut conn).await?)
    }

    async fn fetch_order_with_items(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithItems>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = match orders::fetch_order(id, &mut conn).await? {
            Some(order) => order,
            None => return Ok(None),
        };
        let items = order_items::items_for_order(order.id, &mut conn).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    async fn fetch_draft_order(
        &self,
        client_id: UserId,
    ) -> Result<Option<OrderWithItems>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = match orders::fetch_draft(client_id, &mut conn).await? {
            Some(order) => order,
            None => return Ok(None),
        };
        let items = order_items::items_for_order(order.id, &mut conn).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<CatalogProduct>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::fetch_product(id, &mut conn).await?)
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<UserInfo>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user(id, &mut conn).await?)
    }

    async fn upsert_draft_line(
        &self,
        client: &UserInfo,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<OrderWithItems, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let product = products::fetch_product(product_id, &mut tx)
            .await?
            .ok_or(OrderFlowError::ProductNotAvailable(product_id))?;
        let draft = match orders::fetch_draft(client.id, &mut tx).await? {
            Some(draft) => draft,
            None => {
                let seller = users::assigned_seller_of(client.id, &mut tx).await?;
                let draft = orders::insert_draft(client.id, seller, &mut tx).await?;
                debug!("🗃️ Draft order {} opened for client #{}", draft.id, client.id);
                draft
            },
        };
        let rate = if product.currency == Currency::Usd {
            exchange_rates::fetch_last_rate(Currency::Usd, &mut tx).await?
        } else {
            None
        };
        // merge-by-product: the old row goes away, a fresh snapshot row with
        // the summed quantity replaces it
        let merged_quantity =
            match order_items::find_item_for_product(draft.id, product.id, &mut tx).await? {
                Some(existing) => {
                    order_items::delete_item(existing.id, &mut tx).await?;
                    existing.quantity + quantity
                },
                None => quantity,
            };
        let snapshot = aggregation::snapshot_line(&product, merged_quantity, rate.as_ref())?;
        order_items::insert_snapshot(draft.id, Some(product.id), &snapshot, &mut tx).await?;
        orders::touch(draft.id, &mut tx).await?;
        let items = order_items::items_for_order(draft.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Draft {} now carries {merged_quantity} x product {product_id}", draft.id);
        Ok(OrderWithItems { order: draft, items })
    }

    async fn replace_draft_item(
        &self,
        client_id: UserId,
        item_id: i64,
        quantity: i64,
    ) -> Result<OrderWithItems, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let draft =
            orders::fetch_draft(client_id, &mut tx).await?.ok_or(OrderFlowError::NoDraftOrder)?;
        let item = order_items::find_item(draft.id, item_id, &mut tx)
            .await?
            .ok_or(OrderFlowError::ItemNotFound(item_id))?;
        order_items::delete_item(item.id, &mut tx).await?;
        order_items::insert_replacement(&item, quantity, &mut tx).await?;
        orders::touch(draft.id, &mut tx).await?;
        let items = order_items::items_for_order(draft.id, &mut tx).await?;
        tx.commit().await?;
        Ok(OrderWithItems { order: draft, items })
    }

    async fn remove_draft_item(
        &self,
        client_id: UserId,
        item_id: i64,
    ) -> Result<OrderWithItems, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let draft =
            orders::fetch_draft(client_id, &mut tx).await?.ok_or(OrderFlowError::NoDraftOrder)?;
        let item = order_items::find_item(draft.id, item_id, &mut tx)
            .await?
            .ok_or(OrderFlowError::ItemNotFound(item_id))?;
        order_items::delete_item(item.id, &mut tx).await?;
        orders::touch(draft.id, &mut tx).await?;
        let items = order_items::items_for_order(draft.id, &mut tx).await?;
        tx.commit().await?;
        Ok(OrderWithItems { order: draft, items })
    }

    async fn clear_draft(&self, client_id: UserId) -> Result<(), OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        if let Some(draft) = orders::fetch_draft(client_id, &mut tx).await? {
            order_items::clear_items(draft.id, &mut tx).await?;
            orders::touch(draft.id, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// The submission pipeline, in one transaction: totals freeze, code
    /// allocation, stock decrement, and the `DRAFT → SUBMITTED` CAS.
    async fn submit_draft(&self, client: &UserInfo) -> Result<OrderWithItems, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let draft =
            orders::fetch_draft(client.id, &mut tx).await?.ok_or(OrderFlowError::NoDraftOrder)?;
        let items = order_items::items_for_order(draft.id, &mut tx).await?;
        if items.is_empty() {
            return Err(OrderFlowError::EmptyOrder);
        }
        let totals = aggregation::order_totals(&items);
        let seq = counters::next_value("order", &mut tx).await?;
        let code = OrderCode(format!("ORD-{seq}"));
        for item in &items {
            if let Some(product_id) = item.product_id {
                products::decrement_stock(product_id, item.quantity, &mut tx).await?;
            }
        }
        let order = orders::finalize_submission(draft.id, &totals, &code, &mut tx)
            .await?
            .ok_or(OrderFlowError::Conflict { order_id: draft.id, expected: OrderStatus::Draft })?;
        tx.commit().await?;
        info!("🗃️ Order {} ({code}) submitted: total {}", order.id, order.total);
        Ok(OrderWithItems { order, items })
    }

    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        match orders::update_status_cas(id, from, to, &mut conn).await? {
            Some(order) => {
                debug!("🗃️ Order {id} moved {from} -> {to}");
                Ok(order)
            },
            None => match orders::fetch_order(id, &mut conn).await? {
                Some(_) => Err(OrderFlowError::Conflict { order_id: id, expected: from }),
                None => Err(OrderFlowError::OrderNotFound(id)),
            },
        }
    }

    async fn assign_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        seller_id: UserId,
    ) -> Result<Order, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        match orders::assign_cas(id, from, OrderStatus::Assigned, seller_id, &mut conn).await? {
            Some(order) => Ok(order),
            None => match orders::fetch_order(id, &mut conn).await? {
                Some(_) => Err(OrderFlowError::Conflict { order_id: id, expected: from }),
                None => Err(OrderFlowError::OrderNotFound(id)),
            },
        }
    }

    async fn insert_quote(
        &self,
        contact: &QuoteContact,
        lines: &[QuoteLine],
    ) -> Result<OrderWithItems, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let seq = counters::next_value("quote", &mut tx).await?;
        let code = OrderCode(format!("COT-{seq}"));
        let order = orders::insert_quote_order(contact, &code, &mut tx).await?;
        for line in lines {
            order_items::insert_quote_line(order.id, line, &mut tx).await?;
        }
        let items = order_items::items_for_order(order.id, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Quote {} ({code}) stored for {}", order.id, contact.email);
        Ok(OrderWithItems { order, items })
    }

    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::search_orders(filter, &mut conn).await?)
    }

    async fn close(&mut self) -> Result<(), OrderFlowError> {
        self.pool.close().await;
        Ok(())
    }
}

impl ExchangeRates for SqliteDatabase {
    async fn fetch_last_rate(&self, currency: Currency) -> Result<ExchangeRate, ExchangeRateError> {
        let mut conn =
            self.pool.acquire().await.map_err(|e| ExchangeRateError::DatabaseError(e.to_string()))?;
        exchange_rates::fetch_last_rate(currency, &mut conn)
            .await
            .map_err(|e| ExchangeRateError::DatabaseError(e.to_string()))?
            .ok_or(ExchangeRateError::RateDoesNotExist(currency))
    }

    async fn set_exchange_rate(&self, rate: &ExchangeRate) -> Result<(), ExchangeRateError> {
        let mut conn =
            self.pool.acquire().await.map_err(|e| ExchangeRateError::DatabaseError(e.to_string()))?;
        exchange_rates::set_rate(rate, &mut conn)
            .await
            .map_err(|e| ExchangeRateError::DatabaseError(e.to_string()))
    }
}
