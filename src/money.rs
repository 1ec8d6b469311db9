//! Monetary constants and display helpers.
//!
//! Amounts are kept as exact [`Decimal`] values throughout the ledger; rounding
//! to two places only happens when a value is turned into text.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Goods and services tax applied to every invoice subtotal.
pub const GST_RATE: Decimal = dec!(0.18);

/// Largest unit price accepted by the ledger.
pub const MAX_UNIT_PRICE: Decimal = dec!(1000000000000);

/// Rounds an amount to two decimal places, with midpoints rounded away from zero.
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount with exactly two decimal places and no digit grouping.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round_amount(amount))
}

/// Formats an amount prefixed with a currency label, e.g. `INR 41.00`.
pub fn format_currency(currency: &str, amount: Decimal) -> String {
    if currency.is_empty() {
        format_amount(amount)
    } else {
        format!("{} {}", currency, format_amount(amount))
    }
}

/// Label for the tax line, e.g. `GST (18%)`.
pub fn gst_label() -> String {
    format!("GST ({}%)", (GST_RATE * dec!(100)).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_two_decimals() {
        assert_eq!(format_amount(dec!(41)), "41.00");
        assert_eq!(format_amount(dec!(7.38)), "7.38");
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(1234567.5)), "1234567.50");
    }

    #[test]
    fn rounds_midpoints_away_from_zero() {
        assert_eq!(format_amount(dec!(0.125)), "0.13");
        assert_eq!(format_amount(dec!(2.675)), "2.68");
        assert_eq!(format_amount(dec!(2.674)), "2.67");
    }

    #[test]
    fn currency_prefix_is_optional() {
        assert_eq!(format_currency("INR", dec!(48.38)), "INR 48.38");
        assert_eq!(format_currency("", dec!(48.38)), "48.38");
    }

    #[test]
    fn gst_label_uses_rate() {
        assert_eq!(gst_label(), "GST (18%)");
    }
}
