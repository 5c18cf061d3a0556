//! The seams of the engine.
//!
//! Backends implement [`StorefrontDatabase`] and [`ExchangeRates`]; cart
//! frontends (local file store, server round-trip store) implement
//! [`CartStore`]. The public APIs in [`crate::api`] are generic over these
//! traits so tests can substitute mocks for the SQLite backend.
mod cart;
mod exchange_rates;
mod storefront_database;

pub use cart::{totals_of, CartError, CartLine, CartLineView, CartStore, CartTotals, LineKey};
pub use exchange_rates::{ExchangeRateError, ExchangeRates};
pub use storefront_database::StorefrontDatabase;
