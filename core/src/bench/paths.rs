//! Names of every file a run produces, locally and on the hosts.

use std::path::{Path, PathBuf};

use crate::types::params::BenchParameters;

pub const COMMITTEE_FILE: &str = "committee.json";
pub const IP_FILE: &str = "ip_file";
pub const SYNCER_FILE: &str = "syncer";
pub const REMOTE_LOG_DIR: &str = "logs";
/// Remote directory that receives configuration files (the user's home).
pub const REMOTE_DIR: &str = ".";
pub const RUNS_DIR: &str = "runs";
pub const LOCAL_LOG_DIR: &str = "logs";

pub fn key_file(index: usize) -> String {
    format!("node-{}.json", index)
}

pub fn input_file(index: usize) -> String {
    format!("input_{}.txt", index)
}

/// Aggregator log on the host that runs it.
pub fn syncer_log_file(index: usize) -> String {
    format!("{}/syncer-{}.log", REMOTE_LOG_DIR, index)
}

/// Primary (client-facing) process log on its host.
pub fn client_log_file(index: usize) -> String {
    format!("{}/client-{}.log", REMOTE_LOG_DIR, index)
}

fn parameter_suffix(params: &BenchParameters) -> String {
    format!(
        "{}-{}-{}-{}",
        params.nodes[0], params.num_messages, params.batch_size, params.compression_factor
    )
}

/// Local name of the downloaded aggregator log.
pub fn syncer_local_log_file(log_dir: &Path, params: &BenchParameters) -> PathBuf {
    log_dir.join(format!("syncer-{}.log", parameter_suffix(params)))
}

/// Local name of a downloaded client log.
pub fn client_local_log_file(log_dir: &Path, index: usize, params: &BenchParameters) -> PathBuf {
    log_dir.join(format!("client-{}-{}.log", index, parameter_suffix(params)))
}

pub fn run_dir(workdir: &Path, run_id: &str) -> PathBuf {
    workdir.join(RUNS_DIR).join(run_id)
}
