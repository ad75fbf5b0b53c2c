//! Log download from the hosts.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::bench::paths;
use crate::error::RigError;
use crate::rig::remote::RemoteExecutor;
use crate::types::host::Host;
use crate::types::params::BenchParameters;


/// Downloads run logs into one local directory.
pub struct LogCollector<'a> {
    executor: &'a dyn RemoteExecutor,
    log_dir: PathBuf,
}

impl<'a> LogCollector<'a> {
    pub fn new(executor: &'a dyn RemoteExecutor, log_dir: &Path) -> Self {
        LogCollector {
            executor,
            log_dir: log_dir.to_path_buf(),
        }
    }

    /// Empty the local log directory, creating it if needed.
    pub fn purge(&self) -> Result<(), RigError> {
        if self.log_dir.exists() {
            std::fs::remove_dir_all(&self.log_dir)?;
        }
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }

    /// Fetch the aggregator log and the client log of node 0. Other hosts are
    /// not contacted. Returns the local files written.
    pub fn collect(&self, hosts: &[Host], params: &BenchParameters) -> Result<Vec<PathBuf>, RigError> {
        self.purge()?;
        let first = match hosts.first() {
            Some(host) => host,
            None => return Ok(Vec::new()),
        };

        let downloads = [
            (
                paths::syncer_log_file(0),
                paths::syncer_local_log_file(&self.log_dir, params),
            ),
            (
                paths::client_log_file(0),
                paths::client_local_log_file(&self.log_dir, 0, params),
            ),
        ];
        let mut fetched = Vec::with_capacity(downloads.len());
        for (remote, local) in downloads {
            info!(host = %first.address, file = %remote, "downloading log");
            self.executor.get(&first.address, &remote, &local)?;
            fetched.push(local);
        }
        Ok(fetched)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::mock::{Call, RecordingExecutor};

    fn hosts() -> Vec<Host> {
        vec![Host::new("10.0.0.1", "a"), Host::new("10.0.1.1", "b")]
    }

    fn params() -> BenchParameters {
        BenchParameters::new(vec![2], 0, 1000, 50, 1.5).unwrap()
    }

    #[test]
    fn collects_from_node_zero_only() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let exec = RecordingExecutor::new();
        exec.set_remote_file("10.0.0.1", "logs/syncer-0.log", "with latency [1], status {\"recv\"}\n");

        let files = LogCollector::new(&exec, &log_dir).collect(&hosts(), &params()).unwrap();
        assert_eq!(
            files,
            vec![
                log_dir.join("syncer-2-1000-50-1.5.log"),
                log_dir.join("client-0-2-1000-50-1.5.log"),
            ]
        );
        assert!(exec.calls().iter().all(|c| c.host() == Some("10.0.0.1")));
        assert!(std::fs::read_to_string(&files[0]).unwrap().contains("recv"));
    }

    #[test]
    fn purges_stale_logs_first() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        std::fs::create_dir_all(&log_dir).unwrap();
        std::fs::write(log_dir.join("syncer-old.log"), "stale").unwrap();

        let exec = RecordingExecutor::new();
        LogCollector::new(&exec, &log_dir).collect(&hosts(), &params()).unwrap();
        assert!(!log_dir.join("syncer-old.log").exists());
    }

    #[test]
    fn download_failure_stops_collection() {
        let dir = tempfile::tempdir().unwrap();
        let exec = RecordingExecutor::new();
        exec.fail_on(None, "syncer-0.log", "scp: logs/syncer-0.log: No such file or directory");
        let err = LogCollector::new(&exec, &dir.path().join("logs"))
            .collect(&hosts(), &params())
            .unwrap_err();
        assert!(err.is_remote());
        assert_eq!(exec.calls().len(), 1);
        assert!(matches!(exec.calls()[0], Call::Get { .. }));
    }
}
