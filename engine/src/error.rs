use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid market '{0}': expected a base-quote pair such as BTC-GBP")]
    InvalidMarket(String),

    #[error("Invalid granularity {0}s: options are 60, 300, 900, 3600, 21600, 86400")]
    InvalidGranularity(u32),

    #[error("Invalid time range: start {start} is not before end {end}")]
    InvalidRange { start: String, end: String },

    #[error("Invalid file name '{0}'")]
    InvalidPath(String),

    #[error("Invalid indicator input: {0}")]
    InvalidInput(String),

    #[error("Series of length {len} is shorter than interval {interval}")]
    Bounds { len: usize, interval: usize },

    #[error("Column '{0}' required")]
    MissingColumn(&'static str),

    #[error("GET {endpoint} {status}")]
    Upstream { status: u16, endpoint: String },

    #[error("Transport error: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    #[error("Could not decode provider response: {0}")]
    Decode(String),

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetryExhausted {
        attempts: u32,
        last_error: Box<EngineError>,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    /// Errors the caller must fix; retrying the same call cannot succeed.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidMarket(_)
                | EngineError::InvalidGranularity(_)
                | EngineError::InvalidRange { .. }
                | EngineError::InvalidPath(_)
                | EngineError::InvalidInput(_)
        )
    }

    /// Provider-side failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Upstream { .. } | EngineError::Transport { .. } | EngineError::Decode(_)
        )
    }
}

impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        EngineError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Storage(err.to_string())
    }
}
