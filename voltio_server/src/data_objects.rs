use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use voltio_common::normalize;
use voltio_engine::{
    db_types::{OrderId, OrderStatus, OrderType, ProductId, QuoteContact, QuoteLine, UserId},
    order_objects::OrderQueryFilter,
};

/// The `PATCH /orders` body: one cart mutation, discriminated by `action`.
///
/// Quantities arrive as raw JSON values on purpose — clients send numbers,
/// locale-formatted strings, or nothing, and the normalizer sorts it out
/// (unparseable input degrades to a quantity of 1, never an error).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CartPatchRequest {
    #[serde(rename_all = "camelCase")]
    AddItem {
        product_id: ProductId,
        #[serde(default)]
        quantity: Value,
    },
    #[serde(rename_all = "camelCase")]
    UpdateQty {
        item_id: i64,
        #[serde(default)]
        quantity: Value,
    },
    #[serde(rename_all = "camelCase")]
    RemoveItem { item_id: i64 },
    Submit,
}

/// A guest quote submission: contact details plus best-effort item
/// references.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub contact: QuoteContact,
    pub items: Vec<QuoteLineRequest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLineRequest {
    pub product_id: Option<ProductId>,
    pub sku: Option<String>,
    pub name: String,
    #[serde(default)]
    pub qty: Value,
}

impl QuoteRequest {
    pub fn into_parts(self) -> (QuoteContact, Vec<QuoteLine>) {
        let lines = self
            .items
            .into_iter()
            .map(|item| QuoteLine {
                product_id: item.product_id,
                sku: item.sku,
                name: item.name,
                quantity: normalize::to_quantity(&item.qty),
            })
            .collect();
        (self.contact, lines)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub seller_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub order_id: OrderId,
}

/// Query string for the staff order listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSearchQuery {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
}

impl OrderSearchQuery {
    pub fn into_filter(self) -> OrderQueryFilter {
        let mut filter = OrderQueryFilter::default();
        if let Some(status) = self.status {
            filter = filter.with_status(status);
        }
        if let Some(order_type) = self.order_type {
            filter = filter.with_type(order_type);
        }
        filter
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
