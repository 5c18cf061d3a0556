use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatus};

/// What happened to the order, from the customer's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationEvent {
    Submitted,
    Approved,
    Rejected,
    Canceled,
}

impl Display for NotificationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationEvent::Submitted => "submitted",
            NotificationEvent::Approved => "approved",
            NotificationEvent::Rejected => "rejected",
            NotificationEvent::Canceled => "canceled",
        };
        write!(f, "{s}")
    }
}

/// The payload handed to the notification collaborator. Delivery (e-mail,
/// whatever else) happens outside the engine and may fail freely; the
/// transition that produced this payload has already committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// The human order code, or `#id` for orders not yet coded.
    pub order_code: String,
    pub client_name: String,
    pub client_email: Option<String>,
    pub event: NotificationEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmittedEvent {
    pub order: Order,
    pub notification: NotificationPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub previous: OrderStatus,
    pub notification: NotificationPayload,
}
