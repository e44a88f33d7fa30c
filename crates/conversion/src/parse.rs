//! User input parsing

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a user-entered amount in major units
///
/// Returns `None` for empty, non-numeric and non-finite input
/// (`NaN`, `inf`). Sign is preserved; callers decide what a
/// non-positive amount means.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_valid() {
        assert_eq!(parse_amount("100"), Some(dec!(100)));
        assert_eq!(parse_amount(" 12.50 "), Some(dec!(12.50)));
        assert_eq!(parse_amount("-3"), Some(dec!(-3)));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("1,000"), None);
    }
}
