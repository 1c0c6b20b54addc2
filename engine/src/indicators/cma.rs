// Cumulative Moving Average (CMA) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;

/// Running mean of every value pushed so far.
#[derive(Debug, Clone, Default)]
pub struct CumulativeMean {
    sum: f64,
    count: usize,
}

impl CumulativeMean {
    pub fn next(&mut self, value: f64) -> f64 {
        self.sum += value;
        self.count += 1;
        self.sum / self.count as f64
    }
}

/// Mean of every value from the start of the series up to each point.
pub fn cumulative_mean(values: &[f64]) -> Vec<f64> {
    let mut mean = CumulativeMean::default();
    values.iter().map(|v| mean.next(*v)).collect()
}

pub struct Cma;

impl IndicatorCalculator for Cma {
    fn name(&self) -> &str {
        "CMA"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({})
    }

    fn calculate(&self, values: &[f64]) -> Vec<Option<f64>> {
        cumulative_mean(values).into_iter().map(Some).collect()
    }
}
