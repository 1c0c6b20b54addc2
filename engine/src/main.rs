// Engine main entry point
use anyhow::Context;
use engine::config::EngineSettings;
use engine::data::{CoinbaseClient, CsvSink};
use engine::services::{Pipeline, SystemClock};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "CANDLE_EXTRACT_CONFIG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default `info` level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .map(PathBuf::from);
    let settings = match &config_path {
        Some(path) => EngineSettings::load(path)?,
        None => EngineSettings::default(),
    };
    info!(
        config = ?config_path,
        market = %settings.market,
        granularity = settings.granularity,
        total_hours = settings.total_hours,
        output = %settings.output_dir.join(&settings.output_file).display(),
        "Starting candle extraction"
    );

    let source = CoinbaseClient::new(&settings.base_url, settings.request_timeout())
        .context("Failed to build HTTP client")?;
    let sink = CsvSink::new(&settings.output_dir);
    let mut pipeline = Pipeline::new(settings, source, sink, SystemClock)?;

    let report = pipeline.run().await?;
    info!(
        chunks = report.chunks,
        rows = report.rows_written,
        storage_failures = report.storage_failures,
        empty_windows = report.skipped_empty,
        "Extraction complete"
    );
    Ok(())
}
