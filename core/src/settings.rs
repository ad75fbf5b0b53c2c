//! Loading and validating `Settings`.
//!
//! Settings live in a YAML file. The path comes from the caller, else from
//! `BENCHRIG_SETTINGS`, else `./settings.yaml`.

use std::path::{Path, PathBuf};

use crate::bench::committee::check_ports;
use crate::error::RigError;
use crate::types::config::Settings;

pub const SETTINGS_ENV: &str = "BENCHRIG_SETTINGS";
pub const DEFAULT_SETTINGS_FILE: &str = "settings.yaml";


/// Pick the settings file: explicit path, then the environment, then the default.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(SETTINGS_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    PathBuf::from(DEFAULT_SETTINGS_FILE)
}


pub fn load(path: &Path) -> Result<Settings, RigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        RigError::Config(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse(&content)
}


/// Parse and validate settings.
pub fn parse(content: &str) -> Result<Settings, RigError> {
    let settings: Settings = serde_yaml::from_str(content)
        .map_err(|e| RigError::Config(format!("bad settings: {}", e)))?;
    validate(&settings)?;
    Ok(settings)
}


fn validate(s: &Settings) -> Result<(), RigError> {
    if s.binary.is_empty() || s.binary.contains('/') {
        return Err(RigError::Config(format!("bad binary name '{}'", s.binary)));
    }
    if s.repo.name.is_empty() {
        return Err(RigError::Config("repo.name must not be empty".into()));
    }
    if s.ssh.user.is_empty() {
        return Err(RigError::Config("ssh.user must not be empty".into()));
    }
    for domain in &s.inventory {
        if domain.domain.is_empty() {
            return Err(RigError::Config("inventory domain without a name".into()));
        }
    }
    let pool_size = s.inventory.iter().map(|d| d.hosts.len()).sum();
    check_ports(s.base_port, s.client_base_port, s.client_run_port, pool_size)?;
    if let Some(ref r) = s.readiness {
        if r.attempts == 0 {
            return Err(RigError::Config("readiness.attempts must be at least 1".into()));
        }
    }
    Ok(())
}
