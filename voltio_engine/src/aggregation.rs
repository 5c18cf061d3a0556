//! Order totals computation.
//!
//! These functions run exactly once per order, inside the submission
//! transaction. The resulting `subtotal`/`tax_total`/`total` are written onto
//! the order row and never recomputed afterwards: a submitted order keeps its
//! numbers even if the catalog reprices. Display code that wants to back a
//! tax amount out of `total` is making an approximation, not reading the
//! authoritative figures.
use voltio_common::Money;

use crate::db_types::{CatalogProduct, Currency, ExchangeRate, OrderItem};

/// Applied when the product carries no explicit tax rate (21% IVA).
pub const DEFAULT_TAX_RATE_BP: i64 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax_total: Money,
    pub total: Money,
}

/// A priced line snapshot, ready to be written as an order item. Always
/// ARS-denominated: USD catalog prices are converted here, at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSnapshot {
    pub name: String,
    pub sku: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub tax_rate_bp: i64,
    pub subtotal: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// A USD-priced line cannot settle in ARS without a rate. The rate is
    /// never invented; the caller surfaces this as a validation error.
    #[error("No USD exchange rate is available to price product '{0}'")]
    RateUnavailable(String),
}

/// Snapshots one cart line against the product's current catalog entry.
pub fn snapshot_line(
    product: &CatalogProduct,
    quantity: i64,
    rate: Option<&ExchangeRate>,
) -> Result<LineSnapshot, SnapshotError> {
    let unit_price = match product.currency {
        Currency::Ars => product.price_base,
        Currency::Usd => match rate {
            Some(rate) => rate.convert_to_ars(product.price_base),
            None => return Err(SnapshotError::RateUnavailable(product.name.clone())),
        },
    };
    let tax_rate_bp = product.tax_rate_bp.unwrap_or(DEFAULT_TAX_RATE_BP);
    Ok(LineSnapshot {
        name: product.name.clone(),
        sku: product.sku.clone(),
        quantity,
        unit_price,
        tax_rate_bp,
        subtotal: unit_price * quantity,
    })
}

/// Computes the frozen totals from item snapshots.
///
/// `subtotal = Σ item.subtotal`, `tax_total = Σ item.subtotal × rate`,
/// `total = subtotal + tax_total`. Tax is computed per line and rounded to
/// the centavo half away from zero. Unpriced items (guest quote lines)
/// contribute nothing.
pub fn order_totals(items: &[OrderItem]) -> OrderTotals {
    let mut totals = OrderTotals::default();
    for item in items {
        let line_subtotal = match item.subtotal.or_else(|| item.unit_price.map(|p| p * item.quantity)) {
            Some(s) => s,
            None => continue,
        };
        let rate_bp = item.tax_rate_bp.unwrap_or(DEFAULT_TAX_RATE_BP);
        totals.subtotal += line_subtotal;
        totals.tax_total += line_subtotal.scale_bp(rate_bp);
    }
    totals.total = totals.subtotal + totals.tax_total;
    totals
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::{OrderId, ProductId};

    fn item(quantity: i64, unit_price: i64, tax_rate_bp: Option<i64>) -> OrderItem {
        OrderItem {
            id: 0,
            order_id: OrderId(1),
            product_id: Some(ProductId(1)),
            name: "Cable unipolar 2.5mm".into(),
            sku: Some("CAB-25".into()),
            quantity,
            unit_price: Some(Money::from(unit_price)),
            tax_rate_bp,
            subtotal: Some(Money::from(unit_price) * quantity),
        }
    }

    #[test]
    fn two_units_at_100_with_21_percent() {
        // the canonical round-trip: 2 × ARS 100.00 @ 21%
        let totals = order_totals(&[item(2, 10_000, Some(2100))]);
        assert_eq!(totals.subtotal, Money::from_units(200));
        assert_eq!(totals.tax_total, Money::from_units(42));
        assert_eq!(totals.total, Money::from_units(242));
    }

    #[test]
    fn missing_tax_rate_defaults_to_21_percent() {
        let totals = order_totals(&[item(1, 10_000, None)]);
        assert_eq!(totals.tax_total, Money::from_units(21));
    }

    #[test]
    fn tax_is_computed_per_line() {
        // 10.5% and 21% lines must not share a rounding step
        let totals = order_totals(&[item(1, 999, Some(1050)), item(1, 999, Some(2100))]);
        // 9.99 × 10.5% = 1.04895 -> 1.05; 9.99 × 21% = 2.0979 -> 2.10
        assert_eq!(totals.tax_total, Money::from(105 + 210));
        assert_eq!(totals.subtotal, Money::from(1_998));
        assert_eq!(totals.total, Money::from(1_998 + 315));
    }

    #[test]
    fn unpriced_quote_lines_contribute_nothing() {
        let mut unpriced = item(5, 0, None);
        unpriced.unit_price = None;
        unpriced.subtotal = None;
        let totals = order_totals(&[unpriced, item(2, 10_000, Some(2100))]);
        assert_eq!(totals.subtotal, Money::from_units(200));
        assert_eq!(totals.total, Money::from_units(242));
    }

    #[test]
    fn usd_products_convert_at_snapshot_time() {
        let product = CatalogProduct {
            id: ProductId(7),
            name: "Breaker importado".into(),
            sku: Some("BRK-USD".into()),
            price_base: Money::from_units(10),
            currency: Currency::Usd,
            tax_rate_bp: Some(2100),
            stock: 50,
            is_active: true,
        };
        let rate = ExchangeRate::new(
            Currency::Usd,
            Money::from_units(980),
            Money::from_units(1000),
            "BNA",
        );
        let snap = snapshot_line(&product, 3, Some(&rate)).unwrap();
        assert_eq!(snap.unit_price, Money::from_units(10_000));
        assert_eq!(snap.subtotal, Money::from_units(30_000));

        // without a rate the snapshot refuses rather than inventing one
        let err = snapshot_line(&product, 3, None).unwrap_err();
        assert_eq!(err, SnapshotError::RateUnavailable("Breaker importado".into()));
    }

    #[test]
    fn rerunning_the_aggregator_reproduces_frozen_totals() {
        // the freeze law: totals derive from the snapshots alone, so a later
        // catalog price change cannot alter them
        let items = vec![item(2, 10_000, Some(2100)), item(1, 55_000, Some(1050))];
        let first = order_totals(&items);
        let second = order_totals(&items);
        assert_eq!(first, second);
    }
}
