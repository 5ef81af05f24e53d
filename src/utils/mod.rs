//! Utility functions and helpers.

pub mod http;
pub mod retry;

use std::sync::LazyLock;

use regex::Regex;

static LEADING_NUMBER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^-?\d+(?:\.\d+)?").ok());

static LEADING_INTEGER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^-?\d+").ok());

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse the number at the start of a scraped text such as `"32㎍/㎥"` or `"-3.5°"`.
pub fn parse_leading_number(text: &str) -> Option<f64> {
    find_leading(&LEADING_NUMBER, text)
}

/// Parse only the integer part at the start of a scraped text; `"30.7㎍/㎥"` gives 30.
pub fn parse_leading_integer(text: &str) -> Option<f64> {
    find_leading(&LEADING_INTEGER, text)
}

fn find_leading(pattern: &LazyLock<Option<Regex>>, text: &str) -> Option<f64> {
    let cleaned = text.trim().replace('\u{2212}', "-");
    let regex = pattern.as_ref()?;
    regex
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  중구 \n  측정소 "), "중구 측정소");
    }

    #[test]
    fn test_parse_leading_number() {
        assert_eq!(parse_leading_number("32"), Some(32.0));
        assert_eq!(parse_leading_number(" 18㎍/㎥"), Some(18.0));
        assert_eq!(parse_leading_number("12.5 µg"), Some(12.5));
        assert_eq!(parse_leading_number("−3°"), Some(-3.0));
        assert_eq!(parse_leading_number("-"), None);
        assert_eq!(parse_leading_number("점검중"), None);
        assert_eq!(parse_leading_number(""), None);
    }

    #[test]
    fn test_parse_leading_integer_truncates() {
        assert_eq!(parse_leading_integer("30.7"), Some(30.0));
        assert_eq!(parse_leading_integer("15.4㎍/㎥"), Some(15.0));
        assert_eq!(parse_leading_integer("−3.9"), Some(-3.0));
        assert_eq!(parse_leading_integer(".5"), None);
    }
}
