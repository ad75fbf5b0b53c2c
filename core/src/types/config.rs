use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::host::PlacementDomain;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    Exponential,
    Linear,
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SshSettings {
    pub user: String,
    pub key_path: Option<PathBuf>,
    pub port: u16,
    pub connect_timeout_secs: u64,
}

impl Default for SshSettings {
    fn default() -> Self {
        SshSettings {
            user: "ubuntu".into(),
            key_path: None,
            port: 22,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepoSettings {
    /// Directory the repository is cloned into on each host.
    pub name: String,
    pub url: String,
    pub branch: String,
    /// Toolchain pinned on the hosts.
    pub toolchain: String,
}

impl Default for RepoSettings {
    fn default() -> Self {
        RepoSettings {
            name: "bench".into(),
            url: String::new(),
            branch: "main".into(),
            toolchain: "1.83.0".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputSettings {
    pub lines_per_file: usize,
    pub max_line_bytes: usize,
}

impl Default for InputSettings {
    fn default() -> Self {
        InputSettings {
            lines_per_file: 100,
            max_line_bytes: 31,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadinessSettings {
    pub attempts: u32,
    pub delay_ms: u64,
    pub backoff: BackoffStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub ssh: SshSettings,
    pub base_port: u16,
    pub client_base_port: u16,
    pub client_run_port: u16,
    pub repo: RepoSettings,
    /// Local directory holding run artifacts, downloaded logs and the lock file.
    pub workdir: PathBuf,
    /// Local checkout of the benchmarked crate, compiled before key generation.
    pub local_crate: PathBuf,
    /// Name of the benchmark binary, both locally and on the hosts.
    pub binary: String,
    pub inventory: Vec<PlacementDomain>,
    pub inputs: InputSettings,
    pub readiness: Option<ReadinessSettings>,
    /// Run directories kept under `<workdir>/runs`, newest first. 0 keeps all.
    pub keep_runs: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            ssh: SshSettings::default(),
            base_port: 8500,
            client_base_port: 9000,
            client_run_port: 9500,
            repo: RepoSettings::default(),
            workdir: PathBuf::from("."),
            local_crate: PathBuf::from("."),
            binary: "node".into(),
            inventory: Vec::new(),
            inputs: InputSettings::default(),
            readiness: None,
            keep_runs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_strategy_serde() {
        let json = serde_json::to_string(&BackoffStrategy::Exponential).unwrap();
        assert_eq!(json, "\"exponential\"");
    }

    #[test]
    fn sparse_yaml_fills_defaults() {
        let yaml = "\
base_port: 7000
repo:
  url: https://example.com/bench.git
inventory:
  - domain: us-east-1
    hosts: [10.0.0.1, 10.0.0.2]
";
        let s: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(s.base_port, 7000);
        assert_eq!(s.client_base_port, 9000);
        assert_eq!(s.ssh.user, "ubuntu");
        assert_eq!(s.repo.branch, "main");
        assert_eq!(s.repo.url, "https://example.com/bench.git");
        assert_eq!(s.inventory[0].hosts.len(), 2);
        assert!(s.readiness.is_none());
        assert_eq!(s.keep_runs, 10);
    }

    #[test]
    fn readiness_section_parses() {
        let yaml = "readiness:\n  attempts: 5\n  delay_ms: 200\n  backoff: linear\n";
        let s: Settings = serde_yaml::from_str(yaml).unwrap();
        let r = s.readiness.unwrap();
        assert_eq!(r.attempts, 5);
        assert_eq!(r.backoff, BackoffStrategy::Linear);
    }
}
