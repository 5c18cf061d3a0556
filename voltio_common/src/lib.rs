//! Primitives shared by every crate in the Voltio workspace.
//!
//! The storefront deals with money in two currencies (ARS and USD) and with
//! quantities typed in by humans, pasted from spreadsheets, or read back from
//! half-trusted JSON. Everything here exists to make those two things safe to
//! pass around:
//!
//! * [`Money`] — an exact minor-unit (centavo/cent) amount. No floats anywhere
//!   near a price.
//! * [`normalize`] — the permissive parser that turns whatever a form field or
//!   legacy record contains into a [`Money`] or a quantity. It never fails;
//!   garbage degrades to zero (and quantities clamp to one).
//! * [`Secret`] — a wrapper that keeps credentials out of debug output.
mod money;
pub mod normalize;
pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError};
pub use secret::Secret;
