use serde::{Deserialize, Serialize};
use thiserror::Error;
use voltio_common::Money;

use crate::db_types::{Currency, ExchangeRate, ProductId};

//--------------------------------------      CartLine       ---------------------------------------------------------
/// One product entry in a locally persisted cart. The serialized form is the
/// storage layout of the local cart entry, so the field names are stable:
/// `{productId, name, sku, price, currency, qty}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub sku: Option<String>,
    #[serde(rename = "price")]
    pub unit_price: Money,
    pub currency: Currency,
    #[serde(rename = "qty")]
    pub quantity: i64,
}

//--------------------------------------      LineKey        ---------------------------------------------------------
/// How a cart line is addressed. Local carts key lines by product; the
/// server-backed cart keys them by the server-issued item id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKey {
    Product(ProductId),
    Item(i64),
}

//--------------------------------------    CartLineView     ---------------------------------------------------------
/// A read-model row returned by [`CartStore::lines`], uniform across both
/// cart variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineView {
    pub key: LineKey,
    pub product_id: Option<ProductId>,
    pub name: String,
    pub sku: Option<String>,
    pub unit_price: Money,
    pub currency: Currency,
    pub quantity: i64,
}

impl CartLineView {
    /// The ARS display value of this line's unit price. USD lines need a sell
    /// rate; without one there is no ARS equivalent (and never a fabricated
    /// zero).
    pub fn ars_unit_price(&self, rate: Option<&ExchangeRate>) -> Option<Money> {
        match self.currency {
            Currency::Ars => Some(self.unit_price),
            Currency::Usd => rate.map(|r| r.convert_to_ars(self.unit_price)),
        }
    }
}

//--------------------------------------     CartTotals      ---------------------------------------------------------
/// Cart-level totals: a plain Σ unit_price × quantity. Tax enters the picture
/// only when the order aggregator runs at submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// ARS subtotal, including USD lines converted at the supplied rate.
    pub subtotal: Money,
    /// USD subtotal of lines that could not be converted (no rate available).
    pub unconverted_usd: Money,
}

//--------------------------------------      CartError      ---------------------------------------------------------
#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("Cart storage unavailable: {0}")]
    Storage(String),
    #[error("Could not reach the server cart: {0}")]
    Transport(String),
    #[error("No cart line matches {0:?}")]
    LineNotFound(LineKey),
    #[error("The server rejected the cart operation: {0}")]
    Rejected(String),
}

//--------------------------------------      CartStore      ---------------------------------------------------------
/// The contract both cart variants implement: one interface, two backings
/// (a local persisted list and the server-side draft order). Quantities
/// below 1 are clamped, never stored: removing a line is always an explicit
/// [`CartStore::remove_line`] call.
#[allow(async_fn_in_trait)]
pub trait CartStore {
    /// The current lines, freshly read from the backing store.
    async fn lines(&mut self) -> Result<Vec<CartLineView>, CartError>;

    /// Adds `quantity` of a product, merging into an existing line for the
    /// same product by summing quantities.
    async fn add_line(&mut self, line: &CartLine) -> Result<(), CartError>;

    /// Sets a line's quantity. Values below 1 clamp to 1.
    async fn set_quantity(&mut self, key: &LineKey, quantity: i64) -> Result<(), CartError>;

    async fn remove_line(&mut self, key: &LineKey) -> Result<(), CartError>;

    async fn clear(&mut self) -> Result<(), CartError>;

    /// Subtotal over all lines, converting USD lines at `rate` when given.
    async fn totals(&mut self, rate: Option<&ExchangeRate>) -> Result<CartTotals, CartError>;
}

/// Folds a set of line views into [`CartTotals`]. Shared by both variants.
pub fn totals_of(lines: &[CartLineView], rate: Option<&ExchangeRate>) -> CartTotals {
    let mut totals = CartTotals::default();
    for line in lines {
        let extended = line.unit_price * line.quantity;
        match (line.currency, rate) {
            (Currency::Ars, _) => totals.subtotal += extended,
            (Currency::Usd, Some(rate)) => totals.subtotal += rate.convert_to_ars(extended),
            (Currency::Usd, None) => totals.unconverted_usd += extended,
        }
    }
    totals
}
