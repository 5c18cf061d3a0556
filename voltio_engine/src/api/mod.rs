//! The engine's public API surface.
//!
//! The server crate talks to these types, never to the SQLite helpers
//! directly. Each API is generic over the backend trait it needs so endpoint
//! tests can run against mocks.
pub mod cart_api;
pub mod errors;
pub mod exchange_rate_api;
pub mod order_flow_api;
pub mod order_objects;
