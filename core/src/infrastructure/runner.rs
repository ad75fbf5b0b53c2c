//! Command runner abstraction for executing shell commands.
//!
//! `CommandRunner` is the trait that local steps and the SSH executor use to
//! execute system commands. `ShellRunner` is the production implementation
//! that spawns `sh -c`. `MockRunner` is the test double that records calls
//! and returns preset responses.

use std::process::Command;
use std::sync::Mutex;

use tracing::debug;

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn stdout(stdout: &str) -> Self {
        CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }
}

/// Trait for executing shell command strings.
///
/// `Ok` means the command exited successfully (stderr may still be non-empty);
/// `Err` carries the error stream or the exit status.
pub trait CommandRunner: Send + Sync {
    fn run(&self, cmd: &str) -> Result<CommandOutput, String>;
}

/// Production runner that spawns `sh -c <cmd>`.
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, cmd: &str) -> Result<CommandOutput, String> {
        debug!(command = %cmd, "spawning shell command");
        let output = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .output()
            .map_err(|e| format!("Failed to execute: {}", e))?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else if stderr.trim().is_empty() {
            Err(format!("command exited with {}", output.status))
        } else {
            Err(stderr)
        }
    }
}

/// Test-double runner that records commands and returns pre-configured responses.
pub struct MockRunner {
    responses: Mutex<Vec<Result<CommandOutput, String>>>,
    commands: Mutex<Vec<String>>,
}

impl MockRunner {
    pub fn with_responses(responses: Vec<Result<String, String>>) -> Self {
        Self::with_outputs(
            responses
                .into_iter()
                .map(|r| r.map(|out| CommandOutput::stdout(&out)))
                .collect(),
        )
    }

    pub fn with_outputs(responses: Vec<Result<CommandOutput, String>>) -> Self {
        let mut reversed = responses;
        reversed.reverse();
        MockRunner {
            responses: Mutex::new(reversed),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn new() -> Self {
        Self::with_outputs(Vec::new())
    }

    pub fn executed_commands(&self) -> Vec<String> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &str) -> Result<CommandOutput, String> {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(cmd.to_string());
        }
        let next = match self.responses.lock() {
            Ok(mut responses) => responses.pop(),
            Err(_) => None,
        };
        next.unwrap_or_else(|| Ok(CommandOutput::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_runner_records_commands() {
        let runner = MockRunner::with_responses(vec![Ok("ok".into()), Ok("ok2".into())]);
        assert!(runner.run("cargo build --release").is_ok());
        assert!(runner.run("./node generate").is_ok());
        let cmds = runner.executed_commands();
        assert_eq!(cmds, vec!["cargo build --release", "./node generate"]);
    }

    #[test]
    fn mock_runner_returns_responses_in_order() {
        let runner = MockRunner::with_responses(vec![
            Ok("first".into()),
            Err("fail".into()),
            Ok("third".into()),
        ]);
        assert_eq!(runner.run("cmd1").unwrap().stdout, "first");
        assert_eq!(runner.run("cmd2").unwrap_err(), "fail");
        assert_eq!(runner.run("cmd3").unwrap().stdout, "third");
    }

    #[test]
    fn mock_runner_defaults_to_empty_ok() {
        let runner = MockRunner::new();
        assert_eq!(runner.run("anything").unwrap(), CommandOutput::default());
    }

    #[test]
    fn mock_runner_can_return_stderr_on_success() {
        let runner = MockRunner::with_outputs(vec![Ok(CommandOutput {
            stdout: String::new(),
            stderr: "duplicate session: syncer-0".into(),
        })]);
        let out = runner.run("tmux new-session -d -s syncer-0").unwrap();
        assert!(out.stderr.contains("duplicate session"));
    }

    #[test]
    fn shell_runner_captures_stdout_and_failure() {
        let runner = ShellRunner;
        assert_eq!(runner.run("echo hello").unwrap().stdout, "hello\n");
        let err = runner.run("echo broken >&2; exit 3").unwrap_err();
        assert_eq!(err.trim(), "broken");
        let err = runner.run("exit 4").unwrap_err();
        assert!(err.contains("exit"));
    }
}
