// Chronologically ordered candle series built on top of `shared::models::Candle`.
use chrono::{DateTime, Utc};
use shared::models::Candle;

/// Candles ordered oldest-first with strictly increasing timestamps.
///
/// The provider answers newest-first and may repeat a candle on window
/// boundaries, so every series is normalized on construction. Indicators are
/// causal and rely on this ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Sorts ascending by timestamp and keeps the first candle seen for each timestamp.
    pub fn from_unordered(mut candles: Vec<Candle>) -> Self {
        // Stable sort keeps provider order among equal timestamps.
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);
        CandleSeries { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.candles.last().map(|c| c.timestamp)
    }

    /// The candles strictly newer than `cutoff`.
    pub fn after(&self, cutoff: DateTime<Utc>) -> CandleSeries {
        let start = self.candles.partition_point(|c| c.timestamp <= cutoff);
        CandleSeries { candles: self.candles[start..].to_vec() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(ts: i64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.timestamp_opt(ts, 0).unwrap(),
            open: close, high: close, low: close, close,
            volume: 1.0,
        }
    }

    #[test]
    fn test_newest_first_input_is_reversed() {
        let series = CandleSeries::from_unordered(vec![candle(7200, 3.0), candle(3600, 2.0), candle(0, 1.0)]);
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
        assert_eq!(series.candles()[0].timestamp.timestamp(), 0);
        assert_eq!(series.last_timestamp().unwrap().timestamp(), 7200);
    }

    #[test]
    fn test_duplicate_timestamps_dropped() {
        let series = CandleSeries::from_unordered(vec![candle(3600, 2.0), candle(3600, 9.0), candle(0, 1.0)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_after_excludes_cutoff() {
        let series = CandleSeries::from_unordered(vec![candle(0, 1.0), candle(3600, 2.0), candle(7200, 3.0)]);
        let newer = series.after(Utc.timestamp_opt(3600, 0).unwrap());
        assert_eq!(newer.closes(), vec![3.0]);
        assert!(series.after(Utc.timestamp_opt(7200, 0).unwrap()).is_empty());
        assert_eq!(series.after(Utc.timestamp_opt(-1, 0).unwrap()).len(), 3);
    }

    #[test]
    fn test_inconsistent_ohlc_kept_as_is() {
        let bad = Candle { low: 10.0, high: 1.0, ..candle(0, 5.0) };
        let series = CandleSeries::from_unordered(vec![bad.clone()]);
        assert_eq!(series.candles()[0], bad);
    }
}
