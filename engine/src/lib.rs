// Engine library root: historical candle extraction with indicator enrichment.

pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod models;
pub mod services;

pub use error::{EngineError, Result};
