//! Log collection and latency analysis.

pub mod analyzer;
pub mod collector;

pub use analyzer::{analyze_dir, LatencyAnalyzer, LatencyReport};
pub use collector::LogCollector;
