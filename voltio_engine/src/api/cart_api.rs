use std::fmt::Debug;

use log::*;

use crate::{
    api::errors::OrderFlowError,
    db_types::{OrderWithItems, ProductId, Role, UserId, UserInfo},
    lifecycle::Denial,
    traits::StorefrontDatabase,
};

/// The server side of the cart contract: the authenticated client's cart is
/// their `DRAFT` order, and every operation here is one mutation of it. The
/// draft is created implicitly by the first [`Self::add_item`]; quantity
/// edits replace item rows rather than patching them.
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CartApi<B>
where B: StorefrontDatabase
{
    /// The client's current draft order, if any. `None` both when the client
    /// has never added anything and after a submission.
    pub async fn current_cart(&self, client_id: UserId) -> Result<Option<OrderWithItems>, OrderFlowError> {
        self.db.fetch_draft_order(client_id).await
    }

    pub async fn add_item(
        &self,
        actor: &UserInfo,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<OrderWithItems, OrderFlowError> {
        if actor.role != Role::Client {
            return Err(OrderFlowError::Unauthorized(Denial::ClientsOnly));
        }
        let quantity = quantity.max(1);
        let cart = self.db.upsert_draft_line(actor, product_id, quantity).await?;
        trace!("🛒️ Client #{} added {quantity} x product {product_id}", actor.id);
        Ok(cart)
    }

    /// Sets an item's quantity. Values below 1 have already been clamped by
    /// the normalizer; the clamp is repeated here so the invariant holds for
    /// every caller. Removal is [`Self::remove_item`], never quantity 0.
    pub async fn update_quantity(
        &self,
        actor: &UserInfo,
        item_id: i64,
        quantity: i64,
    ) -> Result<OrderWithItems, OrderFlowError> {
        let quantity = quantity.max(1);
        let cart = self.db.replace_draft_item(actor.id, item_id, quantity).await?;
        trace!("🛒️ Client #{} set item {item_id} to {quantity}", actor.id);
        Ok(cart)
    }

    pub async fn remove_item(
        &self,
        actor: &UserInfo,
        item_id: i64,
    ) -> Result<OrderWithItems, OrderFlowError> {
        let cart = self.db.remove_draft_item(actor.id, item_id).await?;
        trace!("🛒️ Client #{} removed item {item_id}", actor.id);
        Ok(cart)
    }

    pub async fn clear(&self, actor: &UserInfo) -> Result<(), OrderFlowError> {
        self.db.clear_draft(actor.id).await?;
        debug!("🛒️ Client #{} cleared their cart", actor.id);
        Ok(())
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
