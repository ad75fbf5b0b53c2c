//! Remote command execution and file transfer.
//!
//! `RemoteExecutor` is the seam between the coordinator and the machines: run
//! a command on one host, on a group of hosts in parallel, and copy files in
//! either direction. `SshExecutor` implements it with `ssh`/`scp` command
//! lines handed to a `CommandRunner`.

use std::path::Path;

use tracing::debug;

use crate::error::{GroupFailure, RigError};
use crate::infrastructure::runner::{CommandOutput, CommandRunner};
use crate::infrastructure::tmux::shell_escape;

use super::connection::ConnectionContext;


// ---------------------------------------------------------------------------
// RemoteExecutor
// ---------------------------------------------------------------------------

/// Runs commands on hosts and moves files to and from them.
///
/// Every call blocks until the command or transfer finishes.
pub trait RemoteExecutor: Sync {
    /// Run `command` on one host.
    fn run(&self, host: &str, command: &str) -> Result<CommandOutput, RigError>;

    /// Copy a local file into `remote_dir` on the host.
    fn put(&self, host: &str, local: &Path, remote_dir: &str) -> Result<(), RigError>;

    /// Copy `remote_path` from the host to a local file.
    fn get(&self, host: &str, remote_path: &str, local: &Path) -> Result<(), RigError>;

    /// Run `command` on one host and treat any stderr output as a failure.
    fn run_checked(&self, host: &str, command: &str) -> Result<String, RigError> {
        let output = self.run(host, command)?;
        if !output.stderr.trim().is_empty() {
            return Err(RigError::Remote {
                host: host.to_string(),
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// Run `command` on every host in parallel. Succeeds only if every host
    /// succeeds; otherwise reports each failing host.
    fn run_group(&self, hosts: &[String], command: &str) -> Result<(), RigError> {
        let results: Vec<(&String, Result<CommandOutput, RigError>)> = std::thread::scope(|scope| {
            let handles: Vec<_> = hosts
                .iter()
                .map(|host| (host, scope.spawn(move || self.run(host, command))))
                .collect();
            handles
                .into_iter()
                .map(|(host, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        Err(RigError::Remote {
                            host: host.clone(),
                            message: "executor thread panicked".into(),
                        })
                    });
                    (host, result)
                })
                .collect()
        });

        let mut failure = GroupFailure::new();
        for (host, result) in results {
            if let Err(e) = result {
                failure.record(host, &failure_message(&e));
            }
        }
        if failure.is_empty() {
            Ok(())
        } else {
            Err(RigError::Group(failure))
        }
    }
}

/// The bare message of a per-host error, without the host prefix.
pub fn failure_message(err: &RigError) -> String {
    match err {
        RigError::Remote { message, .. } | RigError::Transfer { message, .. } => message.clone(),
        other => other.to_string(),
    }
}


// ---------------------------------------------------------------------------
// SshExecutor
// ---------------------------------------------------------------------------

/// `RemoteExecutor` over `ssh` and `scp`.
pub struct SshExecutor<R: CommandRunner> {
    context: ConnectionContext,
    runner: R,
}

impl<R: CommandRunner> SshExecutor<R> {
    pub fn new(context: ConnectionContext, runner: R) -> Self {
        SshExecutor { context, runner }
    }

    /// The full `ssh` command line for running `command` on `host`.
    pub fn ssh_command(&self, host: &str, command: &str) -> String {
        let args: Vec<String> = self
            .context
            .ssh_args(host)
            .iter()
            .map(|a| shell_escape(a))
            .collect();
        format!("ssh {} {}", args.join(" "), shell_escape(command))
    }

    fn scp_command(&self, from: &str, to: &str) -> String {
        let args: Vec<String> = self
            .context
            .scp_args()
            .iter()
            .map(|a| shell_escape(a))
            .collect();
        format!("scp {} {} {}", args.join(" "), shell_escape(from), shell_escape(to))
    }

    fn remote_target(&self, host: &str, path: &str) -> String {
        format!("{}:{}", self.context.user_at_host(host), path)
    }
}

impl<R: CommandRunner> RemoteExecutor for SshExecutor<R> {
    fn run(&self, host: &str, command: &str) -> Result<CommandOutput, RigError> {
        debug!(host = %host, command = %command, "running remote command");
        self.runner
            .run(&self.ssh_command(host, command))
            .map_err(|e| RigError::Remote {
                host: host.to_string(),
                message: e.trim().to_string(),
            })
    }

    fn put(&self, host: &str, local: &Path, remote_dir: &str) -> Result<(), RigError> {
        let local_str = local.display().to_string();
        debug!(host = %host, file = %local_str, "uploading");
        let cmd = self.scp_command(&local_str, &self.remote_target(host, remote_dir));
        self.runner
            .run(&cmd)
            .map(|_| ())
            .map_err(|e| RigError::Transfer {
                host: host.to_string(),
                path: local_str,
                message: e.trim().to_string(),
            })
    }

    fn get(&self, host: &str, remote_path: &str, local: &Path) -> Result<(), RigError> {
        debug!(host = %host, file = %remote_path, "downloading");
        let cmd = self.scp_command(
            &self.remote_target(host, remote_path),
            &local.display().to_string(),
        );
        self.runner
            .run(&cmd)
            .map(|_| ())
            .map_err(|e| RigError::Transfer {
                host: host.to_string(),
                path: remote_path.to_string(),
                message: e.trim().to_string(),
            })
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
