// Validated provider request and the capability trait behind which the transport sits.
use chrono::{DateTime, SecondsFormat, Utc};
use shared::models::Granularity;
use shared::utils::is_valid_market;
use std::future::Future;

use crate::error::{EngineError, Result};
use crate::models::CandleSeries;

/// One provider call: a market, a candle width and a half-open time window.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    market: String,
    granularity: Granularity,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl FetchRequest {
    /// Rejects bad input before any network I/O happens.
    pub fn new(market: &str, granularity_secs: u32, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if !is_valid_market(market) {
            return Err(EngineError::InvalidMarket(market.to_string()));
        }
        let granularity = Granularity::from_seconds(granularity_secs)
            .ok_or(EngineError::InvalidGranularity(granularity_secs))?;
        if start >= end {
            return Err(EngineError::InvalidRange {
                start: iso8601(start),
                end: iso8601(end),
            });
        }
        Ok(Self {
            market: market.to_string(),
            granularity,
            start,
            end,
        })
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn iso_start(&self) -> String {
        iso8601(self.start)
    }

    pub fn iso_end(&self) -> String {
        iso8601(self.end)
    }
}

pub fn iso8601(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Anything able to answer a [`FetchRequest`] with a normalized series.
///
/// Implementations surface provider failures as errors and never retry;
/// retry policy belongs to the pipeline.
pub trait CandleSource {
    fn fetch_window(&self, request: &FetchRequest) -> impl Future<Output = Result<CandleSeries>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hours: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + hours * 3600, 0).unwrap()
    }

    #[test]
    fn test_every_provider_granularity_accepted() {
        for g in [60, 300, 900, 3600, 21600, 86400] {
            let request = FetchRequest::new("BTC-GBP", g, at(0), at(1)).unwrap();
            assert_eq!(request.granularity().seconds(), g);
        }
    }

    #[test]
    fn test_other_granularities_rejected() {
        for g in [0, 30, 59, 61, 600, 1800, 3599, 7200, 43200, 604800] {
            let err = FetchRequest::new("BTC-GBP", g, at(0), at(1)).unwrap_err();
            assert!(matches!(err, EngineError::InvalidGranularity(v) if v == g));
        }
    }

    #[test]
    fn test_bad_market_rejected() {
        for market in ["btc-gbp", "BTCGBP", "BITCOIN-GBP", "B-G", "BTC-GBP-X", ""] {
            let err = FetchRequest::new(market, 3600, at(0), at(1)).unwrap_err();
            assert!(matches!(err, EngineError::InvalidMarket(_)), "{} accepted", market);
        }
    }

    #[test]
    fn test_empty_or_reversed_range_rejected() {
        assert!(matches!(
            FetchRequest::new("BTC-GBP", 3600, at(1), at(1)),
            Err(EngineError::InvalidRange { .. })
        ));
        assert!(matches!(
            FetchRequest::new("BTC-GBP", 3600, at(2), at(1)),
            Err(EngineError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_iso_formatting() {
        let request = FetchRequest::new("ETH-USD", 3600, at(0), at(300)).unwrap();
        assert_eq!(request.iso_start(), "2023-11-14T22:13:20Z");
        assert_eq!(request.iso_end(), "2023-11-27T10:13:20Z");
    }
}
