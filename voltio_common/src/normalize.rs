//! Permissive money and quantity parsing.
//!
//! Prices and quantities reach the storefront from form fields, spreadsheet
//! imports and legacy records, formatted either the Argentine way
//! (`"1.234,56"`) or the plain way (`"1234.56"`). The policy here is to never
//! reject input: anything unparseable becomes a zero amount, and quantities
//! always come out at one or more. Callers that need "delete this line"
//! semantics must say so explicitly; a quantity can never normalize to zero.
use serde_json::Value;

use crate::Money;

/// Coerces a JSON value into an exact monetary amount.
///
/// Finite numbers pass through directly; everything else is parsed from its
/// string form. Unparseable input yields `$0.00`, never an error.
pub fn to_amount(value: &Value) -> Money {
    match value {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()).map(minor_units).unwrap_or(Money::ZERO),
        Value::String(s) => amount_from_str(s),
        _ => Money::ZERO,
    }
}

/// Coerces a JSON value into a positive line quantity.
///
/// The decimal value is floored to an integer and clamped to a minimum of 1.
/// Setting a quantity to zero is not expressible; line removal is a separate
/// operation.
pub fn to_quantity(value: &Value) -> i64 {
    let qty = match value {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()).map(|x| x.floor() as i64).unwrap_or(0),
        Value::String(s) => amount_from_str(s).value().div_euclid(100),
        _ => 0,
    };
    qty.max(1)
}

/// Parses a human-formatted amount string into minor units.
///
/// All characters except digits, `.`, `,` and `-` are stripped first. If a
/// comma appears after the last dot the string is read as comma-decimal with
/// dot thousands separators; otherwise it is read as dot-decimal (with any
/// commas as thousands separators).
pub fn amount_from_str(raw: &str) -> Money {
    let filtered: String =
        raw.chars().filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-')).collect();
    let canonical = match (filtered.rfind(','), filtered.rfind('.')) {
        (Some(comma), dot) if dot.map_or(true, |d| comma > d) => {
            filtered.replace('.', "").replace(',', ".")
        },
        (Some(_), _) => filtered.replace(',', ""),
        (None, _) => filtered,
    };
    parse_canonical(&canonical).unwrap_or(Money::ZERO)
}

/// Parses a `-?digits[.digits]` string into minor units, rounding digits past
/// the second decimal half away from zero.
fn parse_canonical(s: &str) -> Option<Money> {
    let (sign, s) = match s.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, s),
    };
    if s.is_empty() || s.contains('-') {
        return None;
    }
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if frac_part.contains('.') || !int_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let units: i64 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
    let mut cents = 0i64;
    let mut digits = frac_part.chars();
    for place in [10, 1] {
        if let Some(d) = digits.next() {
            cents += place * i64::from(d.to_digit(10)?);
        }
    }
    if let Some(d) = digits.next() {
        if d.to_digit(10)? >= 5 {
            cents += 1;
        }
    }
    Some(Money::from(sign * (units * 100 + cents)))
}

/// Rounds a float to minor units, half away from zero.
fn minor_units(x: f64) -> Money {
    Money::from((x * 100.0).round() as i64)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_pass_through() {
        assert_eq!(to_amount(&json!(1234.56)), Money::from(123_456));
        assert_eq!(to_amount(&json!(100)), Money::from(10_000));
        assert_eq!(to_amount(&json!(-0.005)), Money::from(-1));
    }

    #[test]
    fn argentine_format_disambiguates_on_last_separator() {
        assert_eq!(to_amount(&json!("1.234,56")), Money::from(123_456));
        assert_eq!(to_amount(&json!("1,5")), Money::from(150));
        assert_eq!(to_amount(&json!("1,234.56")), Money::from(123_456));
        assert_eq!(to_amount(&json!("1234.56")), Money::from(123_456));
        assert_eq!(to_amount(&json!("1.234")), Money::from(123));
    }

    #[test]
    fn junk_is_stripped_before_parsing() {
        assert_eq!(to_amount(&json!("$ 1.234,56 ARS")), Money::from(123_456));
        assert_eq!(to_amount(&json!("  -12,50")), Money::from(-1_250));
    }

    #[test]
    fn unparseable_input_degrades_to_zero() {
        assert_eq!(to_amount(&json!(null)), Money::ZERO);
        assert_eq!(to_amount(&json!("")), Money::ZERO);
        assert_eq!(to_amount(&json!("abc")), Money::ZERO);
        assert_eq!(to_amount(&json!("1.2.3,4,5")), Money::ZERO);
        assert_eq!(to_amount(&json!({"price": 10})), Money::ZERO);
    }

    #[test]
    fn third_decimal_rounds_half_away_from_zero() {
        assert_eq!(to_amount(&json!("0.005")), Money::from(1));
        assert_eq!(to_amount(&json!("0.004")), Money::ZERO);
        assert_eq!(to_amount(&json!("-0.005")), Money::from(-1));
    }

    #[test]
    fn quantities_floor_and_clamp_to_one() {
        assert_eq!(to_quantity(&json!(3)), 3);
        assert_eq!(to_quantity(&json!(2.9)), 2);
        assert_eq!(to_quantity(&json!("4")), 4);
        assert_eq!(to_quantity(&json!(0)), 1);
        assert_eq!(to_quantity(&json!(-7)), 1);
        assert_eq!(to_quantity(&json!(null)), 1);
        assert_eq!(to_quantity(&json!("not a number")), 1);
    }
}
