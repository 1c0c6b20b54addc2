// Splits a historical span ending now into provider-sized windows.
use chrono::{DateTime, Duration, Utc};
use shared::models::Granularity;

use crate::config::MAX_CANDLES_PER_REQUEST;
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlanner {
    total_hours: i64,
    chunk_hours: i64,
    /// Widest span the provider serves in one request.
    max_window: Duration,
}

fn hours(value: i64) -> Result<Duration> {
    Duration::try_hours(value).ok_or_else(|| EngineError::Config(format!("{} hours is out of range", value)))
}

impl ChunkPlanner {
    pub fn new(total_hours: i64, chunk_hours: i64, granularity: Granularity) -> Result<Self> {
        if total_hours <= 0 || chunk_hours <= 0 {
            return Err(EngineError::Config(format!(
                "total_hours ({}) and chunk_hours ({}) must be positive",
                total_hours, chunk_hours
            )));
        }
        let max_window = Duration::seconds(MAX_CANDLES_PER_REQUEST as i64 * i64::from(granularity.seconds()));
        Ok(Self { total_hours, chunk_hours, max_window })
    }

    pub fn chunk_hours(&self) -> i64 {
        self.chunk_hours
    }

    /// Number of windows needed to cover the whole span.
    pub fn chunk_count(&self) -> usize {
        let full = self.total_hours / self.chunk_hours;
        (full + i64::from(self.total_hours % self.chunk_hours != 0)) as usize
    }

    /// The next window to fetch with `remaining_hours` still uncovered.
    ///
    /// `cursor` is where the previous window ended; the first window starts
    /// at `now - remaining_hours`. The last window ends at `now` as read by
    /// the caller, not at `start + chunk_hours`, so time spent fetching the
    /// earlier windows leaves no gap at the recent end.
    pub fn next_window(
        &self,
        remaining_hours: i64,
        cursor: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<TimeWindow> {
        let start = match cursor {
            Some(cursor) => cursor,
            None => now
                .checked_sub_signed(hours(remaining_hours)?)
                .ok_or_else(|| EngineError::Config(format!("{} hours before {} is out of range", remaining_hours, now)))?,
        };
        let end = if remaining_hours <= self.chunk_hours {
            now
        } else {
            start
                .checked_add_signed(hours(self.chunk_hours)?)
                .ok_or_else(|| EngineError::Config(format!("{} hours after {} is out of range", self.chunk_hours, start)))?
        };
        Ok(TimeWindow { start, end })
    }

    /// True when `window` spans more candles than the provider serves in
    /// one request. Only the last window can, by the time spent fetching
    /// the earlier ones.
    pub fn exceeds_provider_limit(&self, window: &TimeWindow) -> bool {
        window.end - window.start > self.max_window
    }
}
