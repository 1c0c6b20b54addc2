// Relative Strength Index (RSI) indicator implementation
use crate::error::{EngineError, Result};

/// Bias-adjusted exponential mean with `alpha = 1 / interval` (center of mass
/// `interval - 1`), one value per input once `interval` observations have been seen.
#[derive(Debug, Clone)]
struct AdjustedMean {
    decay: f64,
    numerator: f64,
    denominator: f64,
}

impl AdjustedMean {
    fn new(interval: usize) -> Self {
        Self {
            decay: 1.0 - 1.0 / interval as f64,
            numerator: 0.0,
            denominator: 0.0,
        }
    }

    fn next(&mut self, value: f64) -> f64 {
        self.numerator = value + self.decay * self.numerator;
        self.denominator = 1.0 + self.decay * self.denominator;
        self.numerator / self.denominator
    }
}

/// Running RSI state: the previous close and the smoothed gains and losses.
#[derive(Debug, Clone)]
pub struct RelativeStrength {
    interval: usize,
    previous_close: Option<f64>,
    changes: usize,
    gains: AdjustedMean,
    losses: AdjustedMean,
}

impl RelativeStrength {
    /// `interval` must be positive.
    pub fn new(interval: usize) -> Self {
        Self {
            interval,
            previous_close: None,
            changes: 0,
            gains: AdjustedMean::new(interval),
            losses: AdjustedMean::new(interval),
        }
    }

    pub fn next(&mut self, close: f64) -> Option<f64> {
        let previous = self.previous_close.replace(close)?;
        let change = close - previous;
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { change } else { 0.0 };

        let avg_gain = self.gains.next(gain);
        let avg_loss = self.losses.next(loss);
        self.changes += 1;
        if self.changes < self.interval {
            return None;
        }

        let rs = (avg_gain / avg_loss).abs();
        let rsi = 100.0 - 100.0 / (1.0 + rs);
        if rsi.is_nan() {
            None
        } else {
            Some(rsi)
        }
    }
}

/// RSI over a close-price series.
///
/// Returns one entry per input. Index 0 has no difference, the first `interval`
/// entries are warm-up, and a window with neither gains nor losses has no
/// defined ratio; all of those are `None`. A window with gains and no losses
/// yields an infinite ratio, which maps to exactly 100.
pub fn calculate_rsi(values: &[f64], interval: usize) -> Result<Vec<Option<f64>>> {
    if interval == 0 {
        return Err(EngineError::InvalidInput("RSI interval must be positive".to_string()));
    }
    if values.len() < interval {
        return Err(EngineError::Bounds { len: values.len(), interval });
    }

    let mut rsi = RelativeStrength::new(interval);
    Ok(values.iter().map(|v| rsi.next(*v)).collect())
}
