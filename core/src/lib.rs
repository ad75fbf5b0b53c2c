//! Benchrig core: distributed benchmark orchestration.
//!
//! Selects hosts across placement domains, generates and pushes per-node
//! configuration, launches detached benchmark processes, pulls their logs and
//! reports stage latencies.

pub mod bench;
pub mod error;
pub mod infrastructure;
pub mod logs;
pub mod rig;
pub mod settings;
pub mod types;

pub use error::{BenchError, RigError};
