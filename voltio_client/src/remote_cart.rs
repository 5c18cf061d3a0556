//! The authenticated cart: every operation is a round-trip against the
//! user's server-side draft order.
//!
//! There is no local caching — each read re-fetches `GET /orders`. A failed
//! probe does not raise: to the caller, an unreachable server cart is
//! indistinguishable from "not logged in", which is exactly what sends the
//! storefront back to the local cart.
use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client, StatusCode,
};
use serde_json::{json, Value};
use voltio_engine::{
    db_types::{ExchangeRate, OrderWithItems, ProductId},
    traits::{totals_of, CartError, CartLine, CartLineView, CartStore, CartTotals, LineKey},
};

use crate::config::ClientConfig;

#[derive(Clone)]
pub struct RemoteCart {
    client: Arc<Client>,
    base_url: String,
}

impl std::fmt::Debug for RemoteCart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RemoteCart ({})", self.base_url)
    }
}

impl RemoteCart {
    pub fn new(config: &ClientConfig) -> Result<Self, CartError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.access_token.reveal());
        let value =
            HeaderValue::from_str(&bearer).map_err(|e| CartError::Transport(e.to_string()))?;
        headers.insert(AUTHORIZATION, value);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| CartError::Transport(e.to_string()))?;
        Ok(Self { client: Arc::new(client), base_url: config.base_url.clone() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Fetches the current draft order. Any failure — transport, auth, server
    /// trouble — reads as "no server cart" so callers fall back to the local
    /// variant instead of surfacing a hard error.
    pub async fn probe(&self) -> Option<OrderWithItems> {
        let response = match self.client.get(self.url("/orders")).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("🛒️ Server cart unreachable: {e}. Treating the cart as absent.");
                return None;
            },
        };
        if !response.status().is_success() {
            debug!("🛒️ Server cart probe got {}. Treating the cart as absent.", response.status());
            return None;
        }
        match response.json::<Option<OrderWithItems>>().await {
            Ok(cart) => cart,
            Err(e) => {
                warn!("🛒️ Server cart payload unreadable: {e}. Treating the cart as absent.");
                None
            },
        }
    }

    /// One `PATCH /orders` mutation with an action discriminator.
    async fn patch(&self, body: Value) -> Result<OrderWithItems, CartError> {
        let response = self
            .client
            .patch(self.url("/orders"))
            .json(&body)
            .send()
            .await
            .map_err(|e| CartError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            response.json::<OrderWithItems>().await.map_err(|e| CartError::Transport(e.to_string()))
        } else {
            Err(rejection(status, response.text().await.unwrap_or_default()))
        }
    }

    pub async fn add_item(&self, product_id: ProductId, quantity: i64) -> Result<OrderWithItems, CartError> {
        self.patch(json!({ "action": "addItem", "productId": product_id, "quantity": quantity })).await
    }

    /// Submits the draft. The server freezes totals, allocates the code and
    /// flips the order to SUBMITTED; afterwards `probe` returns `None` again.
    pub async fn submit(&self) -> Result<OrderWithItems, CartError> {
        self.patch(json!({ "action": "submit" })).await
    }

    fn item_key(key: &LineKey) -> Result<i64, CartError> {
        match key {
            LineKey::Item(id) => Ok(*id),
            LineKey::Product(_) => Err(CartError::LineNotFound(*key)),
        }
    }
}

impl CartStore for RemoteCart {
    async fn lines(&mut self) -> Result<Vec<CartLineView>, CartError> {
        let views = self
            .probe()
            .await
            .map(|cart| {
                cart.items
                    .into_iter()
                    .map(|item| CartLineView {
                        key: LineKey::Item(item.id),
                        product_id: item.product_id,
                        name: item.name,
                        sku: item.sku,
                        unit_price: item.unit_price.unwrap_or_default(),
                        currency: cart.order.currency,
                        quantity: item.quantity,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(views)
    }

    async fn add_line(&mut self, line: &CartLine) -> Result<(), CartError> {
        self.add_item(line.product_id, line.quantity).await?;
        Ok(())
    }

    async fn set_quantity(&mut self, key: &LineKey, quantity: i64) -> Result<(), CartError> {
        let item_id = Self::item_key(key)?;
        self.patch(json!({ "action": "updateQty", "itemId": item_id, "quantity": quantity })).await?;
        Ok(())
    }

    async fn remove_line(&mut self, key: &LineKey) -> Result<(), CartError> {
        let item_id = Self::item_key(key)?;
        self.patch(json!({ "action": "removeItem", "itemId": item_id })).await?;
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), CartError> {
        // the server has no bulk clear; removing each line keeps the same
        // draft order open
        let lines = self.lines().await?;
        for line in lines {
            self.remove_line(&line.key).await?;
        }
        Ok(())
    }

    async fn totals(&mut self, rate: Option<&ExchangeRate>) -> Result<CartTotals, CartError> {
        let lines = self.lines().await?;
        Ok(totals_of(&lines, rate))
    }
}

/// Maps a structured server error to the cart error taxonomy.
fn rejection(status: StatusCode, body: String) -> CartError {
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| format!("status {status}"));
    CartError::Rejected(message)
}
