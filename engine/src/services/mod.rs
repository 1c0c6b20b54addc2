// Orchestration of fetch, indicator and sink stages
pub mod clock;
pub mod pipeline;

pub use clock::{Clock, SystemClock};
pub use pipeline::{ChunkReport, Pipeline, PipelineReport, PipelineState};
