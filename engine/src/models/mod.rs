// Engine-side models. Candle, Granularity and IndicatorRow live in `shared::models`.
pub mod candle;

pub use candle::CandleSeries;
