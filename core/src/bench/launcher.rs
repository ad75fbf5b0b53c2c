//! Detached process launch on remote hosts.

use tracing::{debug, info};

use crate::error::RigError;
use crate::infrastructure::tmux::{session_name, TmuxCommandBuilder};
use crate::rig::remote::RemoteExecutor;
use crate::rig::retry::{retry, RetryPolicy};
use crate::types::params::BenchParameters;

use super::commands;
use super::committee::NodeAssignment;
use super::paths;


/// Starts benchmark processes in tmux sessions named after their log files.
pub struct ProcessLauncher<'a> {
    executor: &'a dyn RemoteExecutor,
    binary: &'a str,
    tmux: TmuxCommandBuilder,
}

impl<'a> ProcessLauncher<'a> {
    pub fn new(executor: &'a dyn RemoteExecutor, binary: &'a str) -> Self {
        ProcessLauncher {
            executor,
            binary,
            tmux: TmuxCommandBuilder::new(),
        }
    }

    /// Run `command` on `host` in a detached session, teeing both output
    /// streams into `log_file`. Any stderr output from the launch fails it.
    pub fn background_run(&self, host: &str, command: &str, log_file: &str) -> Result<(), RigError> {
        let name = session_name(log_file);
        let cmd = format!(
            "mkdir -p {} && {}",
            paths::REMOTE_LOG_DIR,
            self.tmux.new_detached(&name, command, log_file)
        );
        debug!(host = %host, session = %name, "starting session");
        self.executor.run_checked(host, &cmd).map(|_| ())
    }

    /// Start the aggregator on `node`. Returns its session name.
    pub fn launch_syncer(&self, node: &NodeAssignment, params: &BenchParameters) -> Result<String, RigError> {
        let log_file = paths::syncer_log_file(node.index);
        let cmd = commands::run_syncer(
            self.binary,
            &node.key_file,
            params.num_messages,
            params.batch_size,
            params.compression_factor,
        );
        info!(host = %node.host.address, node = node.index, "launching syncer");
        self.background_run(&node.host.address, &cmd, &log_file)?;
        Ok(session_name(&log_file))
    }

    pub fn launch_primary(&self, node: &NodeAssignment, params: &BenchParameters) -> Result<String, RigError> {
        let log_file = paths::client_log_file(node.index);
        let cmd = commands::run_primary(
            self.binary,
            &node.key_file,
            params.num_messages,
            params.batch_size,
            params.compression_factor,
        );
        info!(host = %node.host.address, node = node.index, "launching primary");
        self.background_run(&node.host.address, &cmd, &log_file)?;
        Ok(session_name(&log_file))
    }

    /// Poll until the process in `session` accepts connections on `port` of
    /// `host`. A session that has exited fails every attempt. Returns the
    /// attempts used.
    pub fn wait_until_serving(
        &self,
        host: &str,
        session: &str,
        port: u16,
        policy: &RetryPolicy,
    ) -> Result<u32, RigError> {
        let cmd = format!("{} && {}", self.tmux.has_session(session), commands::port_open(port));
        debug!(host = %host, session = %session, port, "waiting for the process to serve");
        retry(policy, |_| self.executor.run(host, &cmd).map(|_| ()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::mock::RecordingExecutor;
    use crate::types::config::BackoffStrategy;
    use crate::types::host::Host;

    fn node(index: usize) -> NodeAssignment {
        NodeAssignment {
            index,
            host: Host::new("10.0.0.1", "us-east-1"),
            port: 8500 + index as u16,
            client_port: 9000 + index as u16,
            key_file: paths::key_file(index),
            input_file: paths::input_file(index),
        }
    }

    fn params() -> BenchParameters {
        BenchParameters::new(vec![4], 0, 1000, 100, 1.5).unwrap()
    }

    #[test]
    fn background_run_names_session_after_log() {
        let exec = RecordingExecutor::new();
        let launcher = ProcessLauncher::new(&exec, "node");
        launcher.background_run("h1", "./node --x", "logs/client-3.log").unwrap();
        assert_eq!(
            exec.commands_on("h1"),
            vec!["mkdir -p logs && tmux new-session -d -s client-3 './node --x 2>&1 | tee logs/client-3.log'"]
        );
    }

    #[test]
    fn syncer_and_primary_use_their_own_logs() {
        let exec = RecordingExecutor::new();
        let launcher = ProcessLauncher::new(&exec, "node");
        assert_eq!(launcher.launch_syncer(&node(0), &params()).unwrap(), "syncer-0");
        assert_eq!(launcher.launch_primary(&node(0), &params()).unwrap(), "client-0");
        let cmds = exec.commands_on("10.0.0.1");
        assert!(cmds[0].contains("--syncer syncer 2>&1 | tee logs/syncer-0.log"));
        assert!(cmds[1].contains("--compression 1.5 2>&1 | tee logs/client-0.log"));
    }

    #[test]
    fn launch_failure_is_remote_error() {
        let exec = RecordingExecutor::new();
        exec.fail_on(Some("10.0.0.1"), "new-session", "duplicate session: client-0");
        let launcher = ProcessLauncher::new(&exec, "node");
        let err = launcher.launch_primary(&node(0), &params()).unwrap_err();
        assert!(err.is_remote());
    }

    #[test]
    fn wait_until_serving_retries_until_port_opens() {
        let exec = RecordingExecutor::new();
        exec.fail_times(None, "nc -z", "nc: connect to 127.0.0.1 port 9500 (tcp) failed: Connection refused", 2);
        let launcher = ProcessLauncher::new(&exec, "node");
        let policy = RetryPolicy::new(5, BackoffStrategy::Fixed, 0);
        assert_eq!(launcher.wait_until_serving("h1", "syncer-0", 9500, &policy).unwrap(), 3);
        assert_eq!(
            exec.commands_on("h1"),
            vec!["tmux has-session -t syncer-0 && nc -z 127.0.0.1 9500"; 3]
        );
    }

    #[test]
    fn exited_session_exhausts_all_attempts() {
        let exec = RecordingExecutor::new();
        exec.fail_on(None, "has-session", "can't find session: syncer-0");
        let launcher = ProcessLauncher::new(&exec, "node");
        let policy = RetryPolicy::new(3, BackoffStrategy::Fixed, 0);
        let err = launcher.wait_until_serving("h1", "syncer-0", 9500, &policy).unwrap_err();
        assert!(err.is_remote());
        assert_eq!(exec.commands_on("h1").len(), 3);
    }
}
