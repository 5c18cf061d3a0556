use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use voltio_common::Money;

#[derive(Debug, Clone, Error)]
#[error("Invalid {0}: {1}")]
pub struct ConversionError(pub &'static str, pub String);

//--------------------------------------      Currency       ---------------------------------------------------------
/// The two currencies the catalog prices in. Orders always settle in ARS;
/// USD-priced lines are converted at the stored sell rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ars,
    Usd,
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Currency::Ars => write!(f, "ARS"),
            Currency::Usd => write!(f, "USD"),
        }
    }
}

impl FromStr for Currency {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ARS" => Ok(Self::Ars),
            "USD" => Ok(Self::Usd),
            s => Err(ConversionError("currency", s.to_string())),
        }
    }
}

//--------------------------------------        Role         ---------------------------------------------------------
/// The back-office role carried in the session claims supplied by the
/// external auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Seller,
    Client,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Seller => write!(f, "SELLER"),
            Role::Client => write!(f, "CLIENT"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "SELLER" => Ok(Self::Seller),
            "CLIENT" => Ok(Self::Client),
            s => Err(ConversionError("role", s.to_string())),
        }
    }
}

//--------------------------------------    Id newtypes      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UserId(pub i64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct ProductId(pub i64);

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProductId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub i64);

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// The human-facing sequential code (`ORD-17`, `COT-4`), allocated when an
/// order is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderCode(pub String);

impl Display for OrderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     OrderType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// A quote request: may carry unpriced items and guest contact details.
    Quote,
    /// A priced client order with frozen totals.
    Order,
}

impl Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Quote => write!(f, "QUOTE"),
            OrderType::Order => write!(f, "ORDER"),
        }
    }
}

impl FromStr for OrderType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUOTE" => Ok(Self::Quote),
            "ORDER" => Ok(Self::Order),
            s => Err(ConversionError("order type", s.to_string())),
        }
    }
}

//--------------------------------------    OrderStatus      ---------------------------------------------------------
/// The order state machine's states. Transitions between them are defined in
/// one place only: [`crate::lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// The in-progress cart of an authenticated client. The only re-enterable
    /// state; item edits keep an order here.
    Draft,
    /// Submitted by the client; totals are frozen from this point on.
    Submitted,
    /// Confirmed by an admin or the assigned seller.
    Approved,
    /// A seller has been assigned for fulfilment.
    Assigned,
    Fulfilled,
    Shipped,
    Delivered,
    Canceled,
    /// Turned down by an admin or the assigned seller.
    Rejected,
}

impl OrderStatus {
    /// Terminal states admit no outgoing transition at all.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Canceled | OrderStatus::Delivered | OrderStatus::Rejected)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Draft => "DRAFT",
            OrderStatus::Submitted => "SUBMITTED",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Assigned => "ASSIGNED",
            OrderStatus::Fulfilled => "FULFILLED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Rejected => "REJECTED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "SUBMITTED" => Ok(Self::Submitted),
            "APPROVED" => Ok(Self::Approved),
            "ASSIGNED" => Ok(Self::Assigned),
            "FULFILLED" => Ok(Self::Fulfilled),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELED" => Ok(Self::Canceled),
            "REJECTED" => Ok(Self::Rejected),
            s => Err(ConversionError("order status", s.to_string())),
        }
    }
}

//--------------------------------------       Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Allocated at submission; drafts have no code yet.
    pub code: Option<OrderCode>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub currency: Currency,
    pub subtotal: Money,
    pub tax_total: Money,
    pub total: Money,
    pub client_id: Option<UserId>,
    pub seller_id: Option<UserId>,
    /// Guest quote contact details; empty for client orders.
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

//--------------------------------------     OrderItem       ---------------------------------------------------------
/// An immutable snapshot of one cart line, taken when the line entered the
/// order. Edits on a draft replace the row; nothing patches it in place.
/// Prices are nullable because guest quote requests carry unpriced items.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub name: String,
    pub sku: Option<String>,
    pub quantity: i64,
    pub unit_price: Option<Money>,
    pub tax_rate_bp: Option<i64>,
    pub subtotal: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

//--------------------------------------   CatalogProduct    ---------------------------------------------------------
/// The slice of the product catalog this engine consumes. Catalog CRUD lives
/// elsewhere; the engine only reads prices, tax rates and stock.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub sku: Option<String>,
    pub price_base: Money,
    pub currency: Currency,
    /// Basis points; `None` means the system default applies at snapshot time.
    pub tax_rate_bp: Option<i64>,
    pub stock: i64,
    pub is_active: bool,
}

//--------------------------------------      UserInfo       ---------------------------------------------------------
/// The acting user, as supplied by the external session collaborator.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub role: Role,
    pub email: String,
    pub name: String,
}

//--------------------------------------   Quote requests    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
}

/// One requested line on a guest quote. Guests send whatever they have; the
/// product reference is best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub product_id: Option<ProductId>,
    pub sku: Option<String>,
    pub name: String,
    pub quantity: i64,
}

//--------------------------------------    ExchangeRate     ---------------------------------------------------------
/// A USD→ARS quote from the configured source. `buy` and `sell` are ARS minor
/// units per one USD. Only the sell rate is applied to prices.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub base_currency: Currency,
    pub buy: Money,
    pub sell: Money,
    pub source: String,
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn new(base_currency: Currency, buy: Money, sell: Money, source: &str) -> Self {
        Self { base_currency, buy, sell, source: source.to_string(), updated_at: Utc::now() }
    }

    /// Converts a USD amount into ARS at the sell rate, rounding half away
    /// from zero to the centavo.
    pub fn convert_to_ars(&self, usd: Money) -> Money {
        let numerator = usd.value() * self.sell.value();
        let quotient = numerator / 100;
        let remainder = numerator % 100;
        if remainder.abs() * 2 >= 100 {
            Money::from(quotient + numerator.signum())
        } else {
            Money::from(quotient)
        }
    }
}

impl Display for ExchangeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "1 {} => {} / {} ({})", self.base_currency, self.buy, self.sell, self.source)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sell_rate_conversion_is_multiplicative() {
        // sell rate: ARS 1000.00 per USD
        let rate =
            ExchangeRate::new(Currency::Usd, Money::from_units(980), Money::from_units(1000), "BNA");
        // USD 10.00 => ARS 10,000.00
        assert_eq!(rate.convert_to_ars(Money::from_units(10)), Money::from_units(10_000));
        // USD 0.01 => ARS 10.00
        assert_eq!(rate.convert_to_ars(Money::from(1)), Money::from(1_000));
    }

    #[test]
    fn fractional_conversion_rounds_to_the_centavo() {
        // sell rate: ARS 1372.53 per USD
        let rate = ExchangeRate::new(Currency::Usd, Money::from(135_000), Money::from(137_253), "BNA");
        // USD 0.01 => 1372.53 / 100 = 13.7253 => ARS 13.73
        assert_eq!(rate.convert_to_ars(Money::from(1)), Money::from(1_373));
    }

    #[test]
    fn statuses_round_trip_and_terminals_are_fixed() {
        for s in [
            OrderStatus::Draft,
            OrderStatus::Submitted,
            OrderStatus::Approved,
            OrderStatus::Assigned,
            OrderStatus::Fulfilled,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Canceled,
            OrderStatus::Rejected,
        ] {
            assert_eq!(s.to_string().parse::<OrderStatus>().unwrap(), s);
        }
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(!OrderStatus::Draft.is_terminal());
    }
}
