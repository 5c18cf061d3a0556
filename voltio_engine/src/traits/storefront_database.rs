use crate::{
    api::errors::OrderFlowError,
    api::order_objects::OrderQueryFilter,
    db_types::{
        CatalogProduct, Order, OrderId, OrderStatus, OrderWithItems, ProductId, QuoteContact,
        QuoteLine, UserId, UserInfo,
    },
};

/// The storage behaviour the order engine requires of a backend.
///
/// Everything mutating an order's status funnels through
/// [`Self::transition_order`] (or the submission/assignment variants), each of
/// which performs a single compare-and-swap write: the new status is only
/// written if the row still carries the status the caller read. A lost race
/// surfaces as [`OrderFlowError::Conflict`] — callers refetch before retrying.
#[allow(async_fn_in_trait)]
pub trait StorefrontDatabase {
    /// The URL of the database.
    fn url(&self) -> &str;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, OrderFlowError>;

    async fn fetch_order_with_items(&self, id: OrderId)
        -> Result<Option<OrderWithItems>, OrderFlowError>;

    /// The client's current draft order, if one exists. The draft *is* the
    /// server-side cart.
    async fn fetch_draft_order(&self, client_id: UserId)
        -> Result<Option<OrderWithItems>, OrderFlowError>;

    async fn fetch_product(&self, id: ProductId) -> Result<Option<CatalogProduct>, OrderFlowError>;

    async fn fetch_user(&self, id: UserId) -> Result<Option<UserInfo>, OrderFlowError>;

    /// Adds a product to the client's draft order, creating the draft
    /// implicitly when none exists, and merging into an existing line for the
    /// same product by summing quantities. The line snapshots the product's
    /// current name, sku, price (ARS, converting USD at the stored sell rate)
    /// and tax rate.
    async fn upsert_draft_line(
        &self,
        client: &UserInfo,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<OrderWithItems, OrderFlowError>;

    /// Sets a draft line's quantity by replacing the item row (snapshots are
    /// immutable; edits produce a fresh row, never an in-place patch).
    async fn replace_draft_item(
        &self,
        client_id: UserId,
        item_id: i64,
        quantity: i64,
    ) -> Result<OrderWithItems, OrderFlowError>;

    async fn remove_draft_item(
        &self,
        client_id: UserId,
        item_id: i64,
    ) -> Result<OrderWithItems, OrderFlowError>;

    async fn clear_draft(&self, client_id: UserId) -> Result<(), OrderFlowError>;

    /// Submits the client's draft in one atomic transaction: computes and
    /// freezes the totals, allocates the sequential order code, decrements
    /// product stock, and moves `DRAFT → SUBMITTED` with a compare-and-swap
    /// on the status.
    async fn submit_draft(&self, client: &UserInfo) -> Result<OrderWithItems, OrderFlowError>;

    /// Compare-and-swap status transition: writes `to` only if the row still
    /// has status `from`.
    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, OrderFlowError>;

    /// Assignment variant of the CAS transition: also records the seller.
    async fn assign_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        seller_id: UserId,
    ) -> Result<Order, OrderFlowError>;

    /// Stores a guest quote request: a `QUOTE` order in `SUBMITTED` status
    /// with unpriced items and the guest's contact details.
    async fn insert_quote(
        &self,
        contact: &QuoteContact,
        lines: &[QuoteLine],
    ) -> Result<OrderWithItems, OrderFlowError>;

    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderFlowError> {
        Ok(())
    }
}
