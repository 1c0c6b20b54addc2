// Indicator state carried across consecutive pieces of one series
use shared::models::{Candle, IndicatorRow};

use super::enrich::{check_closes, RSI_INTERVAL, RSI_NEUTRAL, SIGNAL_SPAN};
use super::{CumulativeMean, ExponentialMean, RelativeStrength, TrailingMean};
use crate::error::{EngineError, Result};
use crate::models::CandleSeries;

/// Running state of every indicator column.
///
/// Extending piece by piece yields the same rows as one `enrich` over the
/// concatenated series, while holding only the trailing 200 closes.
#[derive(Debug, Clone)]
pub struct IndicatorStream {
    cma: CumulativeMean,
    ema12: ExponentialMean,
    ema26: ExponentialMean,
    sma20: TrailingMean,
    sma50: TrailingMean,
    sma200: TrailingMean,
    rsi14: RelativeStrength,
    signal: ExponentialMean,
    seen: usize,
}

impl Default for IndicatorStream {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorStream {
    pub fn new() -> Self {
        Self {
            cma: CumulativeMean::default(),
            ema12: ExponentialMean::new(12),
            ema26: ExponentialMean::new(26),
            sma20: TrailingMean::new(20),
            sma50: TrailingMean::new(50),
            sma200: TrailingMean::new(200),
            rsi14: RelativeStrength::new(RSI_INTERVAL),
            signal: ExponentialMean::new(SIGNAL_SPAN),
            seen: 0,
        }
    }

    /// Candles consumed so far.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Rows for `series`, which must follow everything consumed before.
    /// On error nothing is consumed.
    pub fn extend(&mut self, series: &CandleSeries) -> Result<Vec<IndicatorRow>> {
        check_closes(&series.closes())?;
        let total = self.seen + series.len();
        if total < RSI_INTERVAL {
            return Err(EngineError::Bounds { len: total, interval: RSI_INTERVAL });
        }

        let rows = series.candles().iter().map(|candle| self.push(candle)).collect();
        self.seen = total;
        Ok(rows)
    }

    fn push(&mut self, candle: &Candle) -> IndicatorRow {
        let close = candle.close;
        let ema12 = self.ema12.next(close);
        let ema26 = self.ema26.next(close);
        let macd = ema12 - ema26;
        IndicatorRow {
            candle: candle.clone(),
            cma: self.cma.next(close),
            ema12,
            ema26,
            sma20: self.sma20.next(close),
            sma50: self.sma50.next(close),
            sma200: self.sma200.next(close),
            rsi14: self.rsi14.next(close).unwrap_or(RSI_NEUTRAL),
            macd,
            signal: self.signal.next(macd),
        }
    }
}
