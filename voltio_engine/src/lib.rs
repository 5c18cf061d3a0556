//! Voltio Order Engine
//!
//! The core of the Voltio B2B storefront: everything that turns a cart into a
//! submitted order and walks that order through approval, fulfilment or
//! cancellation. Catalog CRUD, session issuance, image storage and e-mail
//! delivery are external collaborators; this crate only consumes their
//! interfaces.
//!
//! The crate is divided into:
//! 1. Domain types ([`db_types`]) shared across the workspace.
//! 2. The state machine ([`lifecycle`]): one transition table and one
//!    authorization function, used by every handler. Status writes are
//!    compare-and-swap, so concurrent transitions cannot interleave into an
//!    invalid state.
//! 3. The aggregator ([`aggregation`]): computes an order's totals once, at
//!    submission, after which they are frozen.
//! 4. The public APIs ([`OrderFlowApi`], [`CartApi`], [`ExchangeRateApi`]),
//!    generic over backend traits so they can be tested against mocks.
//! 5. The SQLite backend behind those traits.
//! 6. An event hook system ([`events`]) through which the notification
//!    collaborator hears about submissions and status changes without being
//!    able to block them.
pub mod aggregation;
mod api;
pub mod db_types;
pub mod events;
pub mod lifecycle;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    cart_api::CartApi,
    errors::OrderFlowError,
    exchange_rate_api::ExchangeRateApi,
    order_flow_api::OrderFlowApi,
    order_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
