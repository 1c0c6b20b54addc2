// Exponential Moving Average (EMA) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;

/// EMA seeded with the first value, smoothing factor `2 / (span + 1)`, no bias adjustment.
#[derive(Debug, Clone)]
pub struct ExponentialMean {
    multiplier: f64,
    previous_ema: Option<f64>,
}

impl ExponentialMean {
    pub fn new(span: usize) -> Self {
        Self {
            multiplier: 2.0 / (span as f64 + 1.0),
            previous_ema: None,
        }
    }

    pub fn next(&mut self, value: f64) -> f64 {
        let ema = match self.previous_ema {
            Some(previous) => (value - previous) * self.multiplier + previous,
            None => value,
        };
        self.previous_ema = Some(ema);
        ema
    }
}

pub fn exponential_mean(values: &[f64], span: usize) -> Vec<f64> {
    let mut ema = ExponentialMean::new(span);
    values.iter().map(|v| ema.next(*v)).collect()
}

pub struct Ema {
    name: String,
    span: usize,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Self {
            name: format!("EMA({})", span),
            span,
        }
    }
}

impl IndicatorCalculator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "span": self.span })
    }

    fn calculate(&self, values: &[f64]) -> Vec<Option<f64>> {
        if self.span == 0 {
            return vec![None; values.len()];
        }
        exponential_mean(values, self.span).into_iter().map(Some).collect()
    }
}
