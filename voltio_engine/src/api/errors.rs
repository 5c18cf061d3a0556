use thiserror::Error;

use crate::{
    aggregation::SnapshotError,
    db_types::{OrderId, OrderStatus, ProductId},
    lifecycle::{Denial, LifecycleAction},
};

/// Everything that can go wrong in the order/cart flow, split along the lines
/// the HTTP layer needs: validation, authorization, conflict, not-found and
/// backend failures map to distinct response codes.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Product {0} does not exist or is inactive")]
    ProductNotAvailable(ProductId),
    #[error("Order item {0} does not exist on the draft order")]
    ItemNotFound(i64),
    #[error("There is no draft order for this client")]
    NoDraftOrder,
    #[error("The draft order has no items")]
    EmptyOrder,
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// The CAS write found a different status than the one the caller read.
    /// The transition was not applied; refetch before retrying.
    #[error("Order {order_id} is no longer in {expected} status; the transition was not applied")]
    Conflict { order_id: OrderId, expected: OrderStatus },
    #[error("No {action} transition exists from status {from}")]
    TransitionForbidden { action: LifecycleAction, from: OrderStatus },
    #[error("Not permitted: {0}")]
    Unauthorized(Denial),
    #[error("Invalid request: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
