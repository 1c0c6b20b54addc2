// Retrieval from the market-data provider and persistence of enriched rows
pub mod coinbase;
pub mod csv_sink;
pub mod request;
pub mod window;

pub use coinbase::CoinbaseClient;
pub use csv_sink::{CandleSink, CsvSink};
pub use request::{CandleSource, FetchRequest};
pub use window::{ChunkPlanner, TimeWindow};
