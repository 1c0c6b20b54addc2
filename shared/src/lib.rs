pub mod models;
pub mod utils;

// Data models and input checks shared by the engine and any future consumer.
