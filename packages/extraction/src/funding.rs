//! Parses funding strings like `$1.2M`, `€800K`, `$3B` into a numeric
//! USD-equivalent.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FUNDING_RE: Regex =
        Regex::new(r"(?i)^[^\d]*([0-9]+(?:[.,][0-9]+)?)\s*([kmb])?[^0-9]*$").unwrap();
}

fn suffix_multiplier(suffix: Option<&str>) -> f64 {
    match suffix.map(|s| s.to_lowercase()).as_deref() {
        Some("k") => 1e3,
        Some("m") => 1e6,
        Some("b") => 1e9,
        _ => 1.0,
    }
}

/// Parse a funding amount string into a USD-equivalent number.
/// Unparseable input (e.g. `"tbd"`) returns `None`.
pub fn parse_funding_usd(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let captures = FUNDING_RE.captures(trimmed)?;
    let number_str = captures.get(1)?.as_str().replace(',', "");
    let number: f64 = number_str.parse().ok()?;
    let suffix = captures.get(2).map(|m| m.as_str());
    Some(number * suffix_multiplier(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_billions() {
        assert_eq!(parse_funding_usd("$2.5B"), Some(2_500_000_000.0));
    }

    #[test]
    fn parses_euros_with_k_suffix() {
        assert_eq!(parse_funding_usd("€800K"), Some(800_000.0));
    }

    #[test]
    fn parses_millions_lowercase_suffix() {
        assert_eq!(parse_funding_usd("$1.2m"), Some(1_200_000.0));
    }

    #[test]
    fn unparseable_input_returns_none() {
        assert_eq!(parse_funding_usd("tbd"), None);
        assert_eq!(parse_funding_usd(""), None);
        assert_eq!(parse_funding_usd("undisclosed"), None);
    }

    #[test]
    fn parses_plain_number_without_suffix() {
        assert_eq!(parse_funding_usd("$500000"), Some(500_000.0));
    }
}
