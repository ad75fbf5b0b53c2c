//! Local configuration generation.
//!
//! `ConfigGenerator` turns the selected hosts into the files every node needs:
//! the committee, the address books, the per-node key files and the input
//! files. Everything is written under one run directory so concurrent or
//! earlier runs never share artifacts.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::RigError;
use crate::infrastructure::runner::CommandRunner;
use crate::infrastructure::tmux::shell_escape;
use crate::types::config::Settings;
use crate::types::host::Host;

use super::commands;
use super::committee::{self, AddressBook, Committee, NodeAssignment};
use super::inputs;
use super::paths;


/// Everything generated for one run, plus where it lives locally.
#[derive(Debug, Clone)]
pub struct GeneratedConfig {
    pub run_dir: PathBuf,
    pub committee: Committee,
    pub address_book: AddressBook,
    pub syncer_book: AddressBook,
    pub assignments: Vec<NodeAssignment>,
}

impl GeneratedConfig {
    /// Local path of a generated file.
    pub fn local(&self, name: &str) -> PathBuf {
        self.run_dir.join(name)
    }

    pub fn size(&self) -> usize {
        self.assignments.len()
    }
}


pub struct ConfigGenerator<'a> {
    settings: &'a Settings,
    runner: &'a dyn CommandRunner,
}

impl<'a> ConfigGenerator<'a> {
    pub fn new(settings: &'a Settings, runner: &'a dyn CommandRunner) -> Self {
        ConfigGenerator { settings, runner }
    }

    /// Prepare the run directory, build the configuration and write it.
    pub fn generate(&self, run_dir: &Path, hosts: &[Host]) -> Result<GeneratedConfig, RigError> {
        info!(run_dir = %run_dir.display(), nodes = hosts.len(), "generating configuration files");
        self.prepare_local(run_dir, hosts.len())?;
        let config = self.build(run_dir, hosts)?;
        self.persist(&config)?;
        Ok(config)
    }

    /// Compute committee, address books and assignments. No side effects.
    pub fn build(&self, run_dir: &Path, hosts: &[Host]) -> Result<GeneratedConfig, RigError> {
        let s = self.settings;
        Ok(GeneratedConfig {
            run_dir: run_dir.to_path_buf(),
            committee: Committee::new(hosts, s.base_port)?,
            address_book: AddressBook::nodes(hosts, s.base_port, s.client_run_port)?,
            syncer_book: AddressBook::syncer(hosts, s.client_base_port)?,
            assignments: committee::assignments(hosts, s.base_port, s.client_base_port)?,
        })
    }

    /// Start from an empty run directory, rebuild the benchmark crate, link its
    /// binary into the run directory and let it generate the key files.
    pub fn prepare_local(&self, run_dir: &Path, nodes: usize) -> Result<(), RigError> {
        if run_dir.exists() {
            std::fs::remove_dir_all(run_dir)?;
        }
        std::fs::create_dir_all(run_dir)?;
        let run_dir = absolute(run_dir)?;
        let crate_dir = absolute(&self.settings.local_crate)?;

        self.local_step(
            "compile",
            &format!("cd {} && {}", quote_path(&crate_dir), commands::compile()),
        )?;

        let origin = crate_dir.join("target").join("release");
        self.local_step(
            "alias binaries",
            &format!(
                "cd {} && {}",
                quote_path(&run_dir),
                commands::alias_binaries(&origin.display().to_string(), &self.settings.binary)
            ),
        )?;

        let s = self.settings;
        self.local_step(
            "generate keys",
            &format!(
                "cd {} && {}",
                quote_path(&run_dir),
                commands::generate_config_files(
                    &s.binary,
                    s.base_port,
                    s.client_base_port,
                    s.client_run_port,
                    nodes
                )
            ),
        )
    }

    /// Write committee, address books and input files into the run directory,
    /// replacing earlier copies.
    pub fn persist(&self, config: &GeneratedConfig) -> Result<(), RigError> {
        std::fs::create_dir_all(&config.run_dir)?;
        std::fs::write(config.local(paths::COMMITTEE_FILE), config.committee.to_json()?)?;
        std::fs::write(config.local(paths::IP_FILE), config.address_book.render())?;
        std::fs::write(config.local(paths::SYNCER_FILE), config.syncer_book.render())?;
        for a in &config.assignments {
            std::fs::write(
                config.local(&a.input_file),
                inputs::input_content(a.index, &self.settings.inputs),
            )?;
        }
        debug!(files = config.size() + 3, "configuration written");
        Ok(())
    }

    fn local_step(&self, step: &str, command: &str) -> Result<(), RigError> {
        debug!(step = %step, command = %command, "local step");
        self.runner
            .run(command)
            .map(|_| ())
            .map_err(|e| RigError::local(step, e.trim()))
    }
}


/// Delete all but the `keep` most recently modified run directories under
/// `runs_dir`. `keep == 0` deletes nothing. Returns the removed directories.
pub fn prune_runs(runs_dir: &Path, keep: usize) -> Result<Vec<PathBuf>, RigError> {
    if keep == 0 || !runs_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut runs = Vec::new();
    for entry in std::fs::read_dir(runs_dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_dir() {
            runs.push((meta.modified()?, entry.path()));
        }
    }
    runs.sort_by(|a, b| b.cmp(a));

    let mut removed = Vec::new();
    for (_, path) in runs.into_iter().skip(keep) {
        std::fs::remove_dir_all(&path)?;
        removed.push(path);
    }
    if !removed.is_empty() {
        info!(removed = removed.len(), keep, "pruned old run directories");
    }
    Ok(removed)
}


fn absolute(path: &Path) -> Result<PathBuf, RigError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn quote_path(path: &Path) -> String {
    shell_escape(&path.display().to_string())
}
