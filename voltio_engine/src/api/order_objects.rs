use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatus, OrderType, UserId};

/// Search criteria for order listings. Empty filter means "everything".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub client_id: Option<UserId>,
    pub seller_id: Option<UserId>,
    pub order_type: Option<OrderType>,
    #[serde(default)]
    pub status: Vec<OrderStatus>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn is_empty(&self) -> bool {
        self.client_id.is_none()
            && self.seller_id.is_none()
            && self.order_type.is_none()
            && self.status.is_empty()
            && self.since.is_none()
            && self.until.is_none()
    }

    pub fn for_client(mut self, client_id: UserId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn for_seller(mut self, seller_id: UserId) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn with_type(mut self, order_type: OrderType) -> Self {
        self.order_type = Some(order_type);
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status.push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }
}

/// A listing page returned by the search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub total_orders: usize,
    pub orders: Vec<Order>,
}
