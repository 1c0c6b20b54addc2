use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One OHLCV observation as returned by the market-data provider.
///
/// OHLC consistency (`low <= open, close <= high`) is not checked anywhere;
/// inconsistent candles flow through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Candle widths accepted by the provider, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Granularity {
    Minute1,
    Minute5,
    Minute15,
    Hour1,
    Hour6,
    Day1,
}

impl Granularity {
    pub const ALL: [Granularity; 6] = [
        Granularity::Minute1,
        Granularity::Minute5,
        Granularity::Minute15,
        Granularity::Hour1,
        Granularity::Hour6,
        Granularity::Day1,
    ];

    pub fn from_seconds(seconds: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.seconds() == seconds)
    }

    pub fn seconds(self) -> u32 {
        match self {
            Granularity::Minute1 => 60,
            Granularity::Minute5 => 300,
            Granularity::Minute15 => 900,
            Granularity::Hour1 => 3600,
            Granularity::Hour6 => 21600,
            Granularity::Day1 => 86400,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::from_secs(u64::from(self.seconds()))
    }
}

/// A candle with every derived indicator attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub candle: Candle,
    pub cma: f64,
    pub ema12: f64,
    pub ema26: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub sma200: f64,
    pub rsi14: f64,
    pub macd: f64,
    pub signal: f64,
}
