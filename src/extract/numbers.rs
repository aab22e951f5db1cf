use std::sync::LazyLock;

use regex::Regex;

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(?:\d+\.?\d*|\.\d+)").expect("number pattern is valid"));

/// Parse a decimal out of an exchange value such as "1,645.2INJ", "+90.354 USDT" or "$12".
/// Returns None for placeholders like "--" and for cells without a leading number.
pub fn parse_decimal(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '+' | '$'))
        .collect();

    let found = LEADING_NUMBER.find(&cleaned)?;
    let n = found.as_str().parse::<f64>().ok()?;
    n.is_finite().then_some(n)
}

/// Strip thousands separators from a regex capture before parsing
pub fn parse_captured(value: &str) -> Option<f64> {
    let cleaned: String = value.chars().filter(|c| *c != ',' && *c != '+').collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_with_units() {
        assert_eq!(parse_decimal("1645.2INJ"), Some(1645.2));
        assert_eq!(parse_decimal("-90.354USDT"), Some(-90.354));
        assert_eq!(parse_decimal("0.1119 BTC"), Some(0.1119));
    }

    #[test]
    fn test_parse_decimal_separators_and_signs() {
        assert_eq!(parse_decimal("50,000.5"), Some(50000.5));
        assert_eq!(parse_decimal("+12.5"), Some(12.5));
        assert_eq!(parse_decimal("$ 7"), Some(7.0));
    }

    #[test]
    fn test_parse_decimal_placeholders() {
        assert_eq!(parse_decimal("--"), None);
        assert_eq!(parse_decimal("Market"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn test_parse_captured() {
        assert_eq!(parse_captured("51,000.25"), Some(51000.25));
        assert_eq!(parse_captured("+3.5"), Some(3.5));
        assert_eq!(parse_captured("abc"), None);
    }
}
