pub mod config;
pub mod host;
pub mod params;

pub use config::{BackoffStrategy, ReadinessSettings, Settings};
pub use host::{Host, PlacementDomain};
pub use params::BenchParameters;
