// Coinbase Pro REST client for historic rates
use chrono::DateTime;
use serde::Deserialize;
use shared::models::Candle;
use std::time::Duration;
use tracing::{debug, instrument};

use super::request::{CandleSource, FetchRequest};
use crate::error::{EngineError, Result};
use crate::models::CandleSeries;

const USER_AGENT: &str = concat!("candle-extract/", env!("CARGO_PKG_VERSION"));

/// `[time, low, high, open, close, volume]` as sent by the provider.
#[derive(Debug, Deserialize)]
struct RawCandle(i64, f64, f64, f64, f64, f64);

/// Decodes a candles response body (newest-first) into an oldest-first series.
pub fn parse_candles(body: &str) -> Result<CandleSeries> {
    let raw: Vec<RawCandle> = serde_json::from_str(body).map_err(|e| EngineError::Decode(e.to_string()))?;
    let candles = raw
        .into_iter()
        .map(|RawCandle(time, low, high, open, close, volume)| {
            let timestamp = DateTime::from_timestamp(time, 0)
                .ok_or_else(|| EngineError::Decode(format!("timestamp {} out of range", time)))?;
            Ok(Candle { timestamp, open, high, low, close, volume })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CandleSeries::from_unordered(candles))
}

#[derive(Clone)]
pub struct CoinbaseClient {
    base_url: String,
    client: reqwest::Client,
}

impl CoinbaseClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        debug!(base_url, "CoinbaseClient initialised");

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn candles_url(&self, market: &str) -> String {
        format!("{}/products/{}/candles", self.base_url, market)
    }
}

impl CandleSource for CoinbaseClient {
    #[instrument(skip(self, request), name = "coinbase::fetch_window", fields(market = request.market()))]
    async fn fetch_window(&self, request: &FetchRequest) -> Result<CandleSeries> {
        let resp = self
            .client
            .get(self.candles_url(request.market()))
            .query(&[
                ("granularity", request.granularity().seconds().to_string()),
                ("start", request.iso_start()),
                ("end", request.iso_end()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let endpoint = resp.url().to_string();
        if !status.is_success() {
            return Err(EngineError::Upstream { status: status.as_u16(), endpoint });
        }

        let body = resp.text().await?;
        let series = parse_candles(&body)?;
        debug!(%endpoint, candles = series.len(), "fetched window");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_candles_reverses_provider_order() {
        let body = "[[1700007200, 9.0, 11.0, 10.0, 10.5, 3.2], [1700003600, 8.0, 10.0, 9.0, 10.0, 1.5]]";
        let series = parse_candles(body).unwrap();
        assert_eq!(series.len(), 2);
        let first = &series.candles()[0];
        assert_eq!(first.timestamp.timestamp(), 1_700_003_600);
        assert_eq!((first.low, first.high, first.open, first.close, first.volume), (8.0, 10.0, 9.0, 10.0, 1.5));
        assert_eq!(series.candles()[1].close, 10.5);
    }

    #[test]
    fn test_parse_candles_empty_window() {
        assert!(parse_candles("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_candles_rejects_error_body() {
        let err = parse_candles(r#"{"message":"granularity too small for the requested time range"}"#).unwrap_err();
        assert!(matches!(err, EngineError::Decode(_)));
    }

    #[test]
    fn test_candles_url_trims_trailing_slash() {
        let client = CoinbaseClient::new("https://api.pro.coinbase.com/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.candles_url("BTC-GBP"), "https://api.pro.coinbase.com/products/BTC-GBP/candles");
    }

    #[tokio::test]
    async fn test_fetch_window_surfaces_transport_failure() {
        // Nothing listens on port 9 of the loopback interface.
        let client = CoinbaseClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let end = DateTime::from_timestamp(1_700_036_000, 0).unwrap();
        let request = FetchRequest::new("BTC-GBP", 3600, start, end).unwrap();
        let err = client.fetch_window(&request).await.unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {}", err);
    }
}
