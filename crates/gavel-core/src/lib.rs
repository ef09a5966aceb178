// Shared building blocks for the auction console: configuration, the auction
// data model, view protocol messages, summary statistics and CSV export.

pub mod config;
pub mod export;
pub mod model;
pub mod protocol;
pub mod stats;
