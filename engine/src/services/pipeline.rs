// Drives fetch -> indicators -> sink, one provider window at a time.
use chrono::{DateTime, Utc};
use shared::models::{Granularity, IndicatorRow};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::clock::Clock;
use crate::config::{EngineSettings, StoragePolicy};
use crate::data::{CandleSink, CandleSource, ChunkPlanner, FetchRequest};
use crate::error::{EngineError, Result};
use crate::indicators::{enrich, IndicatorStream};
use crate::models::CandleSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending { remaining_hours: i64 },
    Done,
}

/// Outcome of a single window.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkReport {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub fetched: usize,
    pub written: usize,
    pub storage_failed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub chunks: usize,
    pub rows_written: usize,
    pub storage_failures: usize,
    pub skipped_empty: usize,
}

/// Owns the countdown over the requested span and the collaborators used to cover it.
///
/// Indicators are computed per window unless `carry_history` is set, in which
/// case each window continues the indicator state left by the one before it.
/// A step that fails leaves the countdown where it was.
pub struct Pipeline<S, K, C> {
    settings: EngineSettings,
    granularity: Granularity,
    planner: ChunkPlanner,
    source: S,
    sink: K,
    clock: C,
    remaining_hours: i64,
    cursor: Option<DateTime<Utc>>,
    last_emitted: Option<DateTime<Utc>>,
    stream: IndicatorStream,
    started_output: bool,
    report: PipelineReport,
}

impl<S, K, C> Pipeline<S, K, C>
where
    S: CandleSource,
    K: CandleSink,
    C: Clock,
{
    pub fn new(settings: EngineSettings, source: S, sink: K, clock: C) -> Result<Self> {
        let granularity = settings.validate()?;
        let planner = ChunkPlanner::new(settings.total_hours, settings.chunk_hours, granularity)?;
        Ok(Self {
            remaining_hours: settings.total_hours,
            settings,
            granularity,
            planner,
            source,
            sink,
            clock,
            cursor: None,
            last_emitted: None,
            stream: IndicatorStream::new(),
            started_output: false,
            report: PipelineReport::default(),
        })
    }

    pub fn state(&self) -> PipelineState {
        if self.remaining_hours > 0 {
            PipelineState::Pending { remaining_hours: self.remaining_hours }
        } else {
            PipelineState::Done
        }
    }

    pub fn report(&self) -> &PipelineReport {
        &self.report
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Processes windows until the span is covered. Validation and upstream
    /// errors stop the run; storage errors follow the configured policy.
    #[instrument(skip(self), fields(market = %self.settings.market, total_hours = self.settings.total_hours))]
    pub async fn run(&mut self) -> Result<PipelineReport> {
        info!(
            chunks = self.planner.chunk_count(),
            granularity = self.granularity.seconds(),
            "starting extraction"
        );
        while let Some(chunk) = self.step().await? {
            info!(
                start = %chunk.start,
                end = %chunk.end,
                fetched = chunk.fetched,
                written = chunk.written,
                remaining_hours = self.remaining_hours,
                "chunk done"
            );
            if self.state() != PipelineState::Done {
                pause(self.settings.courtesy_delay()).await;
            }
        }
        info!(rows = self.report.rows_written, storage_failures = self.report.storage_failures, "extraction finished");
        Ok(self.report.clone())
    }

    /// Handles one window; `None` once the span is covered.
    pub async fn step(&mut self) -> Result<Option<ChunkReport>> {
        if self.state() == PipelineState::Done {
            return Ok(None);
        }

        let window = self.planner.next_window(self.remaining_hours, self.cursor, self.clock.now())?;
        if self.planner.exceeds_provider_limit(&window) {
            warn!(start = %window.start, end = %window.end, "window spans more candles than the provider serves");
        }
        let request = FetchRequest::new(&self.settings.market, self.granularity.seconds(), window.start, window.end)?;
        let fetched = self.fetch_with_retry(&request).await?;

        // Windows share their boundary instant; a candle may come back twice.
        let fresh = match self.last_emitted {
            Some(cutoff) => fetched.after(cutoff),
            None => fetched.clone(),
        };

        let mut chunk = ChunkReport {
            start: window.start,
            end: window.end,
            fetched: fetched.len(),
            written: 0,
            storage_failed: false,
        };

        if fresh.is_empty() {
            debug!(start = %window.start, end = %window.end, "window returned no new candles");
            self.report.skipped_empty += 1;
        } else {
            let (rows, stream) = self.indicator_rows(&fresh)?;
            match self.persist(&rows)? {
                Some(written) => chunk.written = written,
                None => chunk.storage_failed = true,
            }
            if let Some(stream) = stream {
                self.stream = stream;
            }
            self.last_emitted = fresh.last_timestamp();
        }

        self.cursor = Some(window.end);
        self.remaining_hours -= self.planner.chunk_hours();
        self.report.chunks += 1;
        Ok(Some(chunk))
    }

    async fn fetch_with_retry(&self, request: &FetchRequest) -> Result<CandleSeries> {
        let retry = &self.settings.retry;
        let mut attempt = 1;
        loop {
            match self.source.fetch_window(request).await {
                Ok(series) => return Ok(series),
                Err(err) if err.is_retryable() => {
                    if attempt >= retry.max_attempts {
                        return Err(EngineError::RetryExhausted {
                            attempts: attempt,
                            last_error: Box::new(err),
                        });
                    }
                    let delay = retry.backoff(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "fetch failed, retrying");
                    pause(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Rows for `fresh`, plus the advanced indicator state when history is carried.
    fn indicator_rows(&self, fresh: &CandleSeries) -> Result<(Vec<IndicatorRow>, Option<IndicatorStream>)> {
        if !self.settings.carry_history {
            return Ok((enrich(fresh)?, None));
        }
        let mut stream = self.stream.clone();
        let rows = stream.extend(fresh)?;
        Ok((rows, Some(stream)))
    }

    /// `Some(rows written)`, or `None` when a storage failure was tolerated.
    fn persist(&mut self, rows: &[IndicatorRow]) -> Result<Option<usize>> {
        let file_name = self.settings.output_file.as_str();
        let result = if self.settings.overwrite_existing && !self.started_output {
            self.sink.init_write(file_name, rows)
        } else {
            self.sink.append_write(file_name, rows)
        };

        match result {
            Ok(written) => {
                self.started_output = true;
                self.report.rows_written += written;
                Ok(Some(written))
            }
            Err(err @ EngineError::Storage(_)) if self.settings.storage_policy == StoragePolicy::BestEffort => {
                warn!(file = file_name, rows = rows.len(), error = %err, "Unable to save chunk, continuing");
                self.started_output = true;
                self.report.storage_failures += 1;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
