// Engine settings, loaded from a JSON file or taken from defaults
use anyhow::Context;
use serde::Deserialize;
use shared::models::Granularity;
use shared::utils::{is_safe_filename, is_valid_market};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::indicators::enrich::RSI_INTERVAL;

/// Provider cap on candles returned by a single request.
pub const MAX_CANDLES_PER_REQUEST: u64 = 300;

/// Upper bound on `total_hours` and `chunk_hours` (ten years).
pub const MAX_SPAN_HOURS: i64 = 24 * 365 * 10;

/// What the pipeline does when a chunk cannot be written.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoragePolicy {
    /// Log a warning and move on to the next chunk.
    #[default]
    BestEffort,
    /// Abort the run with the storage error.
    Strict,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            max_attempts: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
        }
    }
}

impl RetrySettings {
    /// Delay before retry number `attempt` (1-based): doubles each time, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let ms = self.initial_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub market: String,
    /// Candle width in seconds.
    pub granularity: u32,
    /// Span to extract, ending now.
    pub total_hours: i64,
    /// Span covered by one provider request.
    pub chunk_hours: i64,
    pub courtesy_delay_ms: u64,
    pub output_dir: PathBuf,
    pub output_file: String,
    /// Truncate the output and write a fresh header on the first chunk.
    pub overwrite_existing: bool,
    /// Compute each chunk's indicators over everything fetched so far.
    pub carry_history: bool,
    pub storage_policy: StoragePolicy,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub retry: RetrySettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            market: "BTC-GBP".to_string(),
            granularity: 3600,
            total_hours: 24 * 365 * 2,
            chunk_hours: 300,
            courtesy_delay_ms: 5_000,
            output_dir: PathBuf::from("."),
            output_file: "cbpGetHistoricRates.csv".to_string(),
            overwrite_existing: false,
            carry_history: false,
            storage_policy: StoragePolicy::BestEffort,
            base_url: "https://api.pro.coinbase.com".to_string(),
            request_timeout_secs: 10,
            retry: RetrySettings::default(),
        }
    }
}

impl EngineSettings {
    /// Reads settings from a JSON file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file '{}'", path.display()))?;
        let settings: EngineSettings = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file '{}'", path.display()))?;
        Ok(settings)
    }

    pub fn courtesy_delay(&self) -> Duration {
        Duration::from_millis(self.courtesy_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<Granularity> {
        if !is_valid_market(&self.market) {
            return Err(EngineError::InvalidMarket(self.market.clone()));
        }
        let granularity = Granularity::from_seconds(self.granularity)
            .ok_or(EngineError::InvalidGranularity(self.granularity))?;
        if !is_safe_filename(&self.output_file) {
            return Err(EngineError::InvalidPath(self.output_file.clone()));
        }
        for (name, hours) in [("total_hours", self.total_hours), ("chunk_hours", self.chunk_hours)] {
            if hours <= 0 || hours > MAX_SPAN_HOURS {
                return Err(EngineError::Config(format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_SPAN_HOURS, hours
                )));
            }
        }

        let candles_per_chunk = candles_in(self.chunk_hours, granularity)?;
        if candles_per_chunk > MAX_CANDLES_PER_REQUEST {
            return Err(EngineError::Config(format!(
                "chunk_hours {} spans {} candles at {}s granularity; the provider returns at most {}",
                self.chunk_hours,
                candles_per_chunk,
                granularity.seconds(),
                MAX_CANDLES_PER_REQUEST
            )));
        }
        // The first window has no earlier candles to warm RSI up with.
        let first_window = candles_in(self.total_hours.min(self.chunk_hours), granularity)?;
        if first_window < RSI_INTERVAL as u64 {
            return Err(EngineError::Config(format!(
                "first window spans {} candles at {}s granularity; RSI needs at least {}",
                first_window,
                granularity.seconds(),
                RSI_INTERVAL
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(EngineError::Config("retry.max_attempts must be at least 1".to_string()));
        }
        Ok(granularity)
    }
}

fn candles_in(hours: i64, granularity: Granularity) -> Result<u64> {
    let seconds = u64::try_from(hours)
        .ok()
        .and_then(|h| h.checked_mul(3600))
        .ok_or_else(|| EngineError::Config(format!("{} hours is out of range", hours)))?;
    Ok(seconds / u64::from(granularity.seconds()))
}
