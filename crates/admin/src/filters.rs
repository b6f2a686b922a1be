//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Currency symbol shown in front of amounts.
pub const CURRENCY_SYMBOL: &str = "R";

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats an amount as currency with two decimals.
///
/// Usage in templates: `{{ product.price|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_money(&value.to_string()))
}

/// Format a decimal string as `R 1234.50`. Non-numeric input is shown as-is.
#[must_use]
pub fn format_money(amount: &str) -> String {
    Decimal::from_str(amount.trim()).map_or_else(
        |_| format!("{CURRENCY_SYMBOL} {amount}"),
        |d| format!("{CURRENCY_SYMBOL} {:.2}", d.round_dp(2)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_amounts_with_two_decimals() {
        assert_eq!(format_money("45.5"), "R 45.50");
        assert_eq!(format_money("136.50"), "R 136.50");
        assert_eq!(format_money("7"), "R 7.00");
        assert_eq!(format_money("n/a"), "R n/a");
    }
}
