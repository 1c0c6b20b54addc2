// Simple Moving Average (SMA) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;
use std::collections::VecDeque;

/// Trailing mean over `window` values; the first points average whatever is available.
///
/// Holds at most `window` values, however many have been pushed.
#[derive(Debug, Clone)]
pub struct TrailingMean {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl TrailingMean {
    pub fn new(window: usize) -> Self {
        Self { window, values: VecDeque::new(), sum: 0.0 }
    }

    pub fn next(&mut self, value: f64) -> f64 {
        self.sum += value;
        self.values.push_back(value);
        if self.values.len() > self.window {
            if let Some(oldest) = self.values.pop_front() {
                self.sum -= oldest;
            }
        }
        self.sum / self.values.len() as f64
    }
}

pub fn trailing_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut mean = TrailingMean::new(window);
    values.iter().map(|v| mean.next(*v)).collect()
}

pub struct Sma {
    name: String,
    window: usize,
}

impl Sma {
    pub fn new(window: usize) -> Self {
        Self {
            name: format!("SMA({})", window),
            window,
        }
    }
}

impl IndicatorCalculator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "window": self.window })
    }

    fn calculate(&self, values: &[f64]) -> Vec<Option<f64>> {
        if self.window == 0 {
            return vec![None; values.len()];
        }
        trailing_mean(values, self.window).into_iter().map(Some).collect()
    }
}
