// Attaches the full indicator set to a candle series
use shared::models::IndicatorRow;

use super::frame::{Column, IndicatorFrame};
use super::macd::{macd_line, signal_line};
use super::rsi::calculate_rsi;
use super::{Cma, Ema, IndicatorCalculator, Sma};
use crate::error::{EngineError, Result};
use crate::models::CandleSeries;

pub const RSI_INTERVAL: usize = 14;
pub const SIGNAL_SPAN: usize = 9;
/// Midpoint substituted for RSI entries that are undefined (warm-up, flat windows).
pub const RSI_NEUTRAL: f64 = 50.0;

pub(crate) fn check_closes(closes: &[f64]) -> Result<()> {
    if closes.is_empty() {
        return Err(EngineError::InvalidInput("close column is empty".to_string()));
    }
    if let Some(i) = closes.iter().position(|c| !c.is_finite()) {
        return Err(EngineError::InvalidInput(format!(
            "close column holds non-numeric value {} at row {}",
            closes[i], i
        )));
    }
    Ok(())
}

fn checked_closes(frame: &IndicatorFrame) -> Result<Vec<f64>> {
    let closes = frame.closes();
    check_closes(&closes)?;
    Ok(closes)
}

/// Adds cma, ema12, ema26, sma20, sma50 and sma200.
pub fn add_moving_averages(frame: &IndicatorFrame) -> Result<IndicatorFrame> {
    let closes = checked_closes(frame)?;

    let calculators: [(Column, Box<dyn IndicatorCalculator>); 6] = [
        (Column::Cma, Box::new(Cma)),
        (Column::Ema12, Box::new(Ema::new(12))),
        (Column::Ema26, Box::new(Ema::new(26))),
        (Column::Sma20, Box::new(Sma::new(20))),
        (Column::Sma50, Box::new(Sma::new(50))),
        (Column::Sma200, Box::new(Sma::new(200))),
    ];

    let mut enriched = frame.clone();
    for (column, calculator) in calculators {
        tracing::trace!(indicator = calculator.name(), parameters = %calculator.parameters(), rows = closes.len(), "computing");
        let values = calculator
            .calculate(&closes)
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        enriched = enriched.with_column(column, values);
    }
    Ok(enriched)
}

/// Adds rsi14, macd and signal. Needs the ema12 and ema26 columns.
pub fn add_momentum_indicators(frame: &IndicatorFrame) -> Result<IndicatorFrame> {
    let ema12 = frame.require(Column::Ema12)?;
    let ema26 = frame.require(Column::Ema26)?;
    let closes = checked_closes(frame)?;

    let rsi14: Vec<f64> = calculate_rsi(&closes, RSI_INTERVAL)?
        .into_iter()
        .map(|v| v.unwrap_or(RSI_NEUTRAL))
        .collect();
    let macd = macd_line(ema12, ema26);
    let signal = signal_line(&macd, SIGNAL_SPAN);

    Ok(frame
        .clone()
        .with_column(Column::Rsi14, rsi14)
        .with_column(Column::Macd, macd)
        .with_column(Column::Signal, signal))
}

/// Moving averages, then momentum, as finished rows.
pub fn enrich(series: &CandleSeries) -> Result<Vec<IndicatorRow>> {
    let frame = IndicatorFrame::from_series(series);
    let frame = add_moving_averages(&frame)?;
    let frame = add_momentum_indicators(&frame)?;
    frame.into_rows()
}
