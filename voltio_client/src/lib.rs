//! Storefront-side plumbing for the Voltio API.
//!
//! This crate is the "browser half" of the cart design: two interchangeable
//! implementations of the engine's `CartStore` contract, plus the logic that
//! picks between them.
//!
//! * [`LocalCartStore`] — an anonymous cart persisted to a single namespaced
//!   JSON entry on disk. Survives restarts, degrades to empty when the
//!   storage is unusable, and notifies listeners after every mutation.
//! * [`RemoteCart`] — the authenticated cart, which is nothing more than the
//!   user's server-side draft order; every operation is a round-trip.
//! * [`resolver`] — the probe-first selection policy: try the server cart,
//!   fall back to local. Re-evaluated on every page load, never cached.
//! * [`RateGateway`] — fetches the USD sell rate once per session and caches
//!   it; when the fetch fails USD prices simply stay in USD.
pub mod config;
pub mod local_cart;
pub mod rates;
pub mod remote_cart;
pub mod resolver;

pub use config::ClientConfig;
pub use local_cart::LocalCartStore;
pub use rates::RateGateway;
pub use remote_cart::RemoteCart;
pub use resolver::{migrate_local_cart, resolve_active_cart, ActiveCart};
