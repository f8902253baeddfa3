//! Batch ingestion of statement files: scans a directory, runs each file
//! through extract -> parse -> normalize -> persist, and reports per-run
//! statistics. A failing file never takes the run down with it.

mod sink;
mod stats;

pub use sink::{Sink, SinkOptions};
pub use stats::Stats;
