// Input checks applied before any request leaves the process or any file is touched.
use regex::Regex;
use std::sync::OnceLock;

fn market_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z]{3,4}-[A-Z]{3,4}$").unwrap())
}

fn file_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\w\-. ]+$").unwrap())
}

/// Base-quote pair such as `BTC-GBP` or `USDC-EUR`.
pub fn is_valid_market(market: &str) -> bool {
    market_pattern().is_match(market)
}

/// A bare file name: word characters, dashes, dots and spaces only.
/// Names made only of dots (`.`, `..`) would resolve to directories and are refused.
pub fn is_safe_filename(name: &str) -> bool {
    file_name_pattern().is_match(name) && !name.chars().all(|c| c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_markets() {
        for market in ["BTC-GBP", "ETH-USD", "USDC-EUR", "LINK-USDT"] {
            assert!(is_valid_market(market), "{} rejected", market);
        }
    }

    #[test]
    fn test_invalid_markets() {
        for market in ["", "btc-gbp", "BTCGBP", "BT-GBP", "BTCXX-GBP", "BTC-GBPXX", "BTC_GBP", " BTC-GBP", "BTC-GBP\n", "BTC-GB1"] {
            assert!(!is_valid_market(market), "{:?} accepted", market);
        }
    }

    #[test]
    fn test_safe_filenames() {
        for name in ["cbpGetHistoricRates.csv", "btc gbp-1h.csv", "out_2024.csv", ".hidden"] {
            assert!(is_safe_filename(name), "{} rejected", name);
        }
    }

    #[test]
    fn test_unsafe_filenames() {
        for name in ["", ".", "..", "../x.csv", "dir/x.csv", "/etc/passwd", "a\\b.csv", "x.csv;rm", "x\0.csv"] {
            assert!(!is_safe_filename(name), "{:?} accepted", name);
        }
    }
}
