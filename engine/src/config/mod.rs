pub mod settings;

pub use settings::{EngineSettings, RetrySettings, StoragePolicy, MAX_CANDLES_PER_REQUEST, MAX_SPAN_HOURS};
