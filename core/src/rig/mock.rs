//! Recording `RemoteExecutor` for tests.
//!
//! Every call is appended to a shared trace, so a clone handed to the
//! coordinator can be inspected afterwards. Failures are injected per host and
//! command substring.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{GroupFailure, RigError};
use crate::infrastructure::runner::CommandOutput;

use super::remote::RemoteExecutor;


/// One recorded executor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Run { host: String, command: String },
    Group { hosts: Vec<String>, command: String },
    Put { host: String, local: PathBuf, remote_dir: String },
    Get { host: String, remote_path: String, local: PathBuf },
}

impl Call {
    pub fn host(&self) -> Option<&str> {
        match self {
            Call::Run { host, .. } | Call::Put { host, .. } | Call::Get { host, .. } => Some(host),
            Call::Group { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
struct FailRule {
    host: Option<String>,
    needle: String,
    message: String,
    /// `None` fails forever.
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    rules: Vec<FailRule>,
    remote_files: HashMap<(String, String), String>,
}

/// `RemoteExecutor` that records calls instead of touching the network.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    state: Arc<Mutex<State>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call on `host` (any host if `None`) whose command or path
    /// contains `needle`.
    pub fn fail_on(&self, host: Option<&str>, needle: &str, message: &str) {
        self.add_rule(host, needle, message, None);
    }

    /// Like `fail_on`, but only for the first `times` matching calls.
    pub fn fail_times(&self, host: Option<&str>, needle: &str, message: &str, times: usize) {
        self.add_rule(host, needle, message, Some(times));
    }

    /// Content written locally when `remote_path` is downloaded from `host`.
    pub fn set_remote_file(&self, host: &str, remote_path: &str, content: &str) {
        if let Ok(mut state) = self.state.lock() {
            state
                .remote_files
                .insert((host.to_string(), remote_path.to_string()), content.to_string());
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Commands run on `host` through single-host calls, in order.
    pub fn commands_on(&self, host: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Run { host: h, command } if h == host => Some(command),
                _ => None,
            })
            .collect()
    }

    fn add_rule(&self, host: Option<&str>, needle: &str, message: &str, remaining: Option<usize>) {
        if let Ok(mut state) = self.state.lock() {
            state.rules.push(FailRule {
                host: host.map(str::to_string),
                needle: needle.to_string(),
                message: message.to_string(),
                remaining,
            });
        }
    }

    /// Record `call` and return the injected failure for it, if any.
    fn record(&self, call: Call, host: &str, subject: &str) -> Option<String> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.calls.push(call);
        check_rules(&mut state.rules, host, subject)
    }
}

fn check_rules(rules: &mut [FailRule], host: &str, subject: &str) -> Option<String> {
    for rule in rules.iter_mut() {
        let host_matches = rule.host.as_deref().map_or(true, |h| h == host);
        if !host_matches || !subject.contains(&rule.needle) {
            continue;
        }
        match rule.remaining {
            Some(0) => continue,
            Some(ref mut n) => *n -= 1,
            None => {}
        }
        return Some(rule.message.clone());
    }
    None
}

impl RemoteExecutor for RecordingExecutor {
    fn run(&self, host: &str, command: &str) -> Result<CommandOutput, RigError> {
        let call = Call::Run {
            host: host.to_string(),
            command: command.to_string(),
        };
        match self.record(call, host, command) {
            Some(message) => Err(RigError::Remote {
                host: host.to_string(),
                message,
            }),
            None => Ok(CommandOutput::default()),
        }
    }

    fn put(&self, host: &str, local: &Path, remote_dir: &str) -> Result<(), RigError> {
        let path = local.display().to_string();
        let call = Call::Put {
            host: host.to_string(),
            local: local.to_path_buf(),
            remote_dir: remote_dir.to_string(),
        };
        match self.record(call, host, &path) {
            Some(message) => Err(RigError::Transfer {
                host: host.to_string(),
                path,
                message,
            }),
            None => Ok(()),
        }
    }

    fn get(&self, host: &str, remote_path: &str, local: &Path) -> Result<(), RigError> {
        let call = Call::Get {
            host: host.to_string(),
            remote_path: remote_path.to_string(),
            local: local.to_path_buf(),
        };
        if let Some(message) = self.record(call, host, remote_path) {
            return Err(RigError::Transfer {
                host: host.to_string(),
                path: remote_path.to_string(),
                message,
            });
        }
        let content = self
            .state
            .lock()
            .ok()
            .and_then(|s| {
                s.remote_files
                    .get(&(host.to_string(), remote_path.to_string()))
                    .cloned()
            })
            .unwrap_or_default();
        std::fs::write(local, content)?;
        Ok(())
    }

    /// Recorded as a single call; failures are evaluated per host in order.
    fn run_group(&self, hosts: &[String], command: &str) -> Result<(), RigError> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.calls.push(Call::Group {
            hosts: hosts.to_vec(),
            command: command.to_string(),
        });
        let mut failure = GroupFailure::new();
        for host in hosts {
            if let Some(message) = check_rules(&mut state.rules, host, command) {
                failure.record(host, &message);
            }
        }
        if failure.is_empty() {
            Ok(())
        } else {
            Err(RigError::Group(failure))
        }
    }
}
