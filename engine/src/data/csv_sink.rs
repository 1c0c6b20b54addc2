// Append-only CSV storage for enriched candles
use serde::{Deserialize, Serialize};
use shared::models::IndicatorRow;
use shared::utils::is_safe_filename;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{EngineError, Result};

/// Column order of every file written by [`CsvSink`].
pub const HEADER: [&str; 16] = [
    "iso8601", "datetime", "low", "high", "open", "close", "volume", "cma", "ema12", "ema26", "sma20", "sma50",
    "sma200", "rsi14", "macd", "signal",
];

/// Persistent destination for enriched rows.
pub trait CandleSink {
    /// Creates or truncates the destination, then writes the header and `rows`.
    fn init_write(&mut self, file_name: &str, rows: &[IndicatorRow]) -> Result<usize>;

    /// Adds `rows` after whatever the destination already holds. A header is
    /// written only when the destination is missing or empty.
    fn append_write(&mut self, file_name: &str, rows: &[IndicatorRow]) -> Result<usize>;
}

/// One CSV line; field order matches [`HEADER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvRecord {
    pub iso8601: i64,
    pub datetime: String,
    pub low: f64,
    pub high: f64,
    pub open: f64,
    pub close: f64,
    pub volume: f64,
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

impl From<&IndicatorRow> for CsvRecord {
    fn from(row: &IndicatorRow) -> Self {
        let candle = &row.candle;
        CsvRecord {
            iso8601: candle.timestamp.timestamp(),
            datetime: candle.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            low: candle.low,
            high: candle.high,
            open: candle.open,
            close: candle.close,
            volume: candle.volume,
            cma: row.cma,
            ema12: row.ema12,
            ema26: row.ema26,
            sma20: row.sma20,
            sma50: row.sma50,
            sma200: row.sma200,
            rsi14: row.rsi14,
            macd: row.macd,
            signal: row.signal,
        }
    }
}

/// Writes CSV files inside a fixed directory.
#[derive(Debug, Clone)]
pub struct CsvSink {
    directory: PathBuf,
}

impl CsvSink {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// Only bare, safe file names are accepted; they resolve inside the sink directory.
    pub fn destination(&self, file_name: &str) -> Result<PathBuf> {
        if !is_safe_filename(file_name) {
            return Err(EngineError::InvalidPath(file_name.to_string()));
        }
        Ok(self.directory.join(file_name))
    }

    fn write_rows(file: File, rows: &[IndicatorRow], with_header: bool) -> Result<usize> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if with_header {
            writer.write_record(HEADER)?;
        }
        for row in rows {
            writer.serialize(CsvRecord::from(row))?;
        }
        writer.flush()?;
        Ok(rows.len())
    }
}

impl CandleSink for CsvSink {
    fn init_write(&mut self, file_name: &str, rows: &[IndicatorRow]) -> Result<usize> {
        let path = self.destination(file_name)?;
        let file = File::create(&path)?;
        let written = Self::write_rows(file, rows, true)?;
        debug!(path = %path.display(), rows = written, "created csv");
        Ok(written)
    }

    fn append_write(&mut self, file_name: &str, rows: &[IndicatorRow]) -> Result<usize> {
        let path = self.destination(file_name)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        // The append cursor is the end of file; an empty file still needs its header.
        let with_header = file.metadata()?.len() == 0;
        let written = Self::write_rows(file, rows, with_header)?;
        debug!(path = %path.display(), rows = written, header = with_header, "appended csv");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shared::models::Candle;
    use tempfile::tempdir;

    fn rows(start_hour: i64, count: usize) -> Vec<IndicatorRow> {
        (0..count)
            .map(|i| {
                let close = 100.0 + i as f64;
                IndicatorRow {
                    candle: Candle {
                        timestamp: Utc.timestamp_opt((start_hour + i as i64) * 3600, 0).unwrap(),
                        open: close, high: close + 1.0, low: close - 1.0, close,
                        volume: 2.5,
                    },
                    cma: close, ema12: close, ema26: close,
                    sma20: close, sma50: close, sma200: close,
                    rsi14: 50.0, macd: 0.0, signal: 0.0,
                }
            })
            .collect()
    }

    fn read_back(path: &Path) -> (Vec<String>, Vec<CsvRecord>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers = reader.headers().unwrap().iter().map(str::to_string).collect();
        let records = reader.deserialize().map(|r| r.unwrap()).collect();
        (headers, records)
    }

    #[test]
    fn test_init_write_round_trip() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path());
        assert_eq!(sink.init_write("out.csv", &rows(0, 5)).unwrap(), 5);

        let (headers, records) = read_back(&dir.path().join("out.csv"));
        assert_eq!(headers, HEADER);
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].iso8601, 0);
        assert_eq!(records[0].datetime, "1970-01-01 00:00:00");
        assert_eq!(records[4].close, 104.0);
        assert_eq!(records[4].low, 103.0);
    }

    #[test]
    fn test_init_write_truncates() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path());
        sink.init_write("out.csv", &rows(0, 5)).unwrap();
        sink.init_write("out.csv", &rows(10, 2)).unwrap();

        let (_, records) = read_back(&dir.path().join("out.csv"));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].iso8601, 10 * 3600);
    }

    #[test]
    fn test_append_twice_on_fresh_file_writes_one_header() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path());
        sink.append_write("out.csv", &rows(0, 3)).unwrap();
        sink.append_write("out.csv", &rows(3, 4)).unwrap();

        let content = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert_eq!(content.matches("iso8601").count(), 1);
        assert!(content.starts_with("iso8601,datetime,"));

        let (_, records) = read_back(&dir.path().join("out.csv"));
        let stamps: Vec<i64> = records.iter().map(|r| r.iso8601 / 3600).collect();
        assert_eq!(stamps, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_append_after_init_keeps_prior_rows() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path());
        sink.init_write("out.csv", &rows(0, 2)).unwrap();
        sink.append_write("out.csv", &rows(2, 2)).unwrap();

        let (_, records) = read_back(&dir.path().join("out.csv"));
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn test_unsafe_name_rejected() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path());
        for name in ["../escape.csv", "sub/out.csv", "..", ""] {
            assert!(matches!(sink.append_write(name, &rows(0, 1)), Err(EngineError::InvalidPath(_))));
            assert!(matches!(sink.init_write(name, &rows(0, 1)), Err(EngineError::InvalidPath(_))));
        }
    }

    #[test]
    fn test_unwritable_destination_is_storage_error() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path().join("missing-dir"));
        let err = sink.append_write("out.csv", &rows(0, 1)).unwrap_err();
        assert!(matches!(err, EngineError::Storage(_)));
    }
}
