//! Error kinds for the benchmark rig.
//!
//! `RigError` classifies what went wrong inside one step. Every public
//! coordinator operation wraps it into a `BenchError`, so callers see a single
//! failure type whose `source()` chain carries the original cause.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;


// ---------------------------------------------------------------------------
// GroupFailure
// ---------------------------------------------------------------------------

/// Per-host failures of one parallel group command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFailure {
    /// Host address -> error text.
    pub failures: BTreeMap<String, String>,
}

impl GroupFailure {
    pub fn new() -> Self {
        GroupFailure::default()
    }

    pub fn record(&mut self, host: &str, message: &str) {
        self.failures.insert(host.to_string(), message.trim().to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// The message of the last failing host, in address order.
    pub fn representative(&self) -> &str {
        self.failures
            .values()
            .next_back()
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn hosts(&self) -> Vec<&str> {
        self.failures.keys().map(String::as_str).collect()
    }
}

impl fmt::Display for GroupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} host(s) failed", self.failures.len())?;
        for (host, message) in &self.failures {
            write!(f, "; {}: {}", host, message)?;
        }
        Ok(())
    }
}


// ---------------------------------------------------------------------------
// RigError
// ---------------------------------------------------------------------------

/// Classified failure of a single rig step.
#[derive(Debug, Error)]
pub enum RigError {
    /// Invalid benchmark parameters or settings. Detected before any remote action.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The pool holds fewer hosts than the run needs.
    #[error("not enough hosts: {required} required, {available} available")]
    InsufficientHosts { required: usize, available: usize },
    /// A parallel group command failed on at least one host.
    #[error("group command failed: {0}")]
    Group(GroupFailure),
    /// A single-host command failed or wrote to stderr.
    #[error("command failed on {host}: {message}")]
    Remote { host: String, message: String },
    /// A copy to or from a host failed.
    #[error("transfer of {path} with {host} failed: {message}")]
    Transfer {
        host: String,
        path: String,
        message: String,
    },
    /// A local build or generation step failed.
    #[error("local step '{step}' failed: {message}")]
    Local { step: String, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Another invocation holds the working directory lock.
    #[error("working directory {} is locked by another invocation", .0.display())]
    Busy(PathBuf),
}

impl RigError {
    /// Remote and transfer failures propagate the same way.
    pub fn is_remote(&self) -> bool {
        matches!(self, RigError::Remote { .. } | RigError::Transfer { .. })
    }

    pub fn local(step: &str, message: impl fmt::Display) -> Self {
        RigError::Local {
            step: step.to_string(),
            message: message.to_string(),
        }
    }
}


// ---------------------------------------------------------------------------
// BenchError
// ---------------------------------------------------------------------------

/// Top-level failure of a benchmark operation.
#[derive(Debug, Error)]
#[error("benchmark operation failed: {context}")]
pub struct BenchError {
    context: String,
    #[source]
    source: RigError,
}

impl BenchError {
    pub fn new(context: impl Into<String>, source: RigError) -> Self {
        BenchError {
            context: context.into(),
            source,
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// The classified cause.
    pub fn kind(&self) -> &RigError {
        &self.source
    }
}

/// Attach a `BenchError` context to a step result.
pub trait BenchContext<T> {
    fn bench_context(self, context: &str) -> Result<T, BenchError>;
}

impl<T> BenchContext<T> for Result<T, RigError> {
    fn bench_context(self, context: &str) -> Result<T, BenchError> {
        self.map_err(|e| BenchError::new(context, e))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn group_failure_keeps_every_host() {
        let mut failure = GroupFailure::new();
        failure.record("10.0.0.2", "git: not found\n");
        failure.record("10.0.0.1", "permission denied");
        assert_eq!(failure.hosts(), vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(failure.representative(), "git: not found");
        let text = failure.to_string();
        assert!(text.starts_with("2 host(s) failed"));
        assert!(text.contains("10.0.0.1: permission denied"));
        assert!(text.contains("10.0.0.2: git: not found"));
    }

    #[test]
    fn empty_group_failure_has_empty_representative() {
        assert_eq!(GroupFailure::new().representative(), "");
    }

    #[test]
    fn transfer_counts_as_remote() {
        let err = RigError::Transfer {
            host: "h".into(),
            path: "ip_file".into(),
            message: "lost connection".into(),
        };
        assert!(err.is_remote());
        assert!(!RigError::Config("x".into()).is_remote());
    }

    #[test]
    fn bench_error_chains_cause() {
        let res: Result<(), RigError> = Err(RigError::InsufficientHosts {
            required: 4,
            available: 2,
        });
        let err = res.bench_context("selecting hosts").unwrap_err();
        assert_eq!(err.to_string(), "benchmark operation failed: selecting hosts");
        let cause = err.source().unwrap().to_string();
        assert!(cause.contains("4 required, 2 available"));
        assert!(matches!(err.kind(), RigError::InsufficientHosts { .. }));
    }
}
