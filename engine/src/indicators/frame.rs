// Column store for indicator values computed over one candle series.
use shared::models::{Candle, IndicatorRow};
use std::collections::BTreeMap;

use crate::error::{EngineError, Result};
use crate::models::CandleSeries;

/// Derived columns, declared in the order they are added: moving averages
/// first, then the momentum columns that depend on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Cma,
    Ema12,
    Ema26,
    Sma20,
    Sma50,
    Sma200,
    Rsi14,
    Macd,
    Signal,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Cma,
        Column::Ema12,
        Column::Ema26,
        Column::Sma20,
        Column::Sma50,
        Column::Sma200,
        Column::Rsi14,
        Column::Macd,
        Column::Signal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Cma => "cma",
            Column::Ema12 => "ema12",
            Column::Ema26 => "ema26",
            Column::Sma20 => "sma20",
            Column::Sma50 => "sma50",
            Column::Sma200 => "sma200",
            Column::Rsi14 => "rsi14",
            Column::Macd => "macd",
            Column::Signal => "signal",
        }
    }
}

/// Candles plus the derived columns computed so far.
///
/// Frames are never mutated through a shared reference: each indicator step
/// returns a new frame with its columns added. Raw candle fields are never
/// overwritten by derived values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorFrame {
    candles: Vec<Candle>,
    columns: BTreeMap<Column, Vec<f64>>,
}

impl IndicatorFrame {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles, columns: BTreeMap::new() }
    }

    pub fn from_series(series: &CandleSeries) -> Self {
        Self::new(series.candles().to_vec())
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn column(&self, column: Column) -> Option<&[f64]> {
        self.columns.get(&column).map(Vec::as_slice)
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains_key(&column)
    }

    pub fn require(&self, column: Column) -> Result<&[f64]> {
        self.column(column).ok_or(EngineError::MissingColumn(column.name()))
    }

    pub(crate) fn with_column(mut self, column: Column, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), self.candles.len(), "column {} length mismatch", column.name());
        self.columns.insert(column, values);
        self
    }

    /// Zips candles and columns into rows; every column must be present.
    pub fn into_rows(self) -> Result<Vec<IndicatorRow>> {
        for column in Column::ALL {
            self.require(column)?;
        }
        let IndicatorFrame { candles, columns } = self;
        let value = |column: Column, i: usize| columns[&column][i];

        Ok(candles
            .into_iter()
            .enumerate()
            .map(|(i, candle)| IndicatorRow {
                candle,
                cma: value(Column::Cma, i),
                ema12: value(Column::Ema12, i),
                ema26: value(Column::Ema26, i),
                sma20: value(Column::Sma20, i),
                sma50: value(Column::Sma50, i),
                sma200: value(Column::Sma200, i),
                rsi14: value(Column::Rsi14, i),
                macd: value(Column::Macd, i),
                signal: value(Column::Signal, i),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_candle(close: f64) -> Candle {
        Candle {
            timestamp: Utc::now(),
            open: close, high: close, low: close, close,
            volume: 0.0,
        }
    }

    #[test]
    fn test_require_names_missing_column() {
        let frame = IndicatorFrame::new(vec![create_candle(1.0)]);
        let err = frame.require(Column::Ema26).unwrap_err();
        assert!(matches!(err, EngineError::MissingColumn("ema26")));
    }

    #[test]
    fn test_into_rows_requires_every_column() {
        let frame = IndicatorFrame::new(vec![create_candle(1.0)]).with_column(Column::Cma, vec![1.0]);
        assert!(matches!(frame.into_rows(), Err(EngineError::MissingColumn("ema12"))));
    }

    #[test]
    fn test_into_rows_zips_columns() {
        let mut frame = IndicatorFrame::new(vec![create_candle(1.0), create_candle(2.0)]);
        for (n, column) in Column::ALL.into_iter().enumerate() {
            frame = frame.with_column(column, vec![n as f64, n as f64 + 0.5]);
        }
        let rows = frame.into_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].candle.close, 2.0);
        assert_eq!(rows[0].cma, 0.0);
        assert_eq!(rows[1].signal, 8.5);
    }
}
