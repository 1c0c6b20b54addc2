// Technical indicators module
pub mod cma;
pub mod ema;
pub mod enrich;
pub mod frame;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stream;

pub use cma::{Cma, CumulativeMean};
pub use ema::{Ema, ExponentialMean};
pub use enrich::{add_momentum_indicators, add_moving_averages, enrich};
pub use frame::{Column, IndicatorFrame};
pub use rsi::{calculate_rsi, RelativeStrength};
pub use sma::{Sma, TrailingMean};
pub use stream::IndicatorStream;

use serde_json::Value;

// Common trait for all indicators computed over a close-price series
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value; // Parameters used for this indicator instance
    fn calculate(&self, values: &[f64]) -> Vec<Option<f64>>; // None where the indicator is undefined (e.g. warm-up)
}
