//! Deployment coordinator. Ties host selection, config generation, push and
//! launch into the benchmark operations.
//!
//! `DeploymentCoordinator` is the only component that sequences side effects.
//! Remote work goes through the injected `RemoteExecutor`, local build steps
//! through the injected `CommandRunner` (`ShellRunner` in production,
//! `MockRunner` in tests).

use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};
use uuid::Uuid;

use crate::bench::committee::{self, NodeAssignment};
use crate::bench::generator::{prune_runs, ConfigGenerator, GeneratedConfig};
use crate::bench::launcher::ProcessLauncher;
use crate::bench::{commands, paths};
use crate::error::{BenchContext, BenchError, RigError};
use crate::infrastructure::lock::WorkdirLock;
use crate::infrastructure::runner::CommandRunner;
use crate::logs::collector::LogCollector;
use crate::rig::inventory::HostPool;
use crate::rig::remote::RemoteExecutor;
use crate::rig::retry::RetryPolicy;
use crate::rig::selector::select_hosts;
use crate::types::config::Settings;
use crate::types::host::Host;
use crate::types::params::BenchParameters;


// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Progress of the current operation. Phases only move forward; every
/// operation starts from `Idle` and any failure returns to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Idle,
    HostsSelected,
    CodeUpdated,
    ConfigPushed,
    Launched,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::HostsSelected => "hosts-selected",
            Phase::CodeUpdated => "code-updated",
            Phase::ConfigPushed => "config-pushed",
            Phase::Launched => "launched",
        };
        write!(f, "{}", s)
    }
}


/// Outcome of a `run` or `justrun`.
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    /// Set by `run`; `justrun` reuses whatever the hosts already have.
    pub run_id: Option<String>,
    pub run_dir: Option<PathBuf>,
    pub hosts: Vec<Host>,
    pub live_nodes: usize,
    pub phase: Phase,
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref id) = self.run_id {
            write!(f, "run {}: ", id)?;
        }
        write!(
            f,
            "{} of {} nodes started ({})",
            self.live_nodes,
            self.hosts.len(),
            self.phase
        )?;
        for (i, host) in self.hosts.iter().enumerate() {
            let state = if i < self.live_nodes { "live" } else { "faulty" };
            write!(f, "\n  {} {} [{}] {}", i, host.address, host.placement_domain, state)?;
        }
        Ok(())
    }
}


// ---------------------------------------------------------------------------
// DeploymentCoordinator
// ---------------------------------------------------------------------------

pub struct DeploymentCoordinator {
    settings: Settings,
    pool: Box<dyn HostPool>,
    executor: Box<dyn RemoteExecutor>,
    runner: Box<dyn CommandRunner>,
    phase: Phase,
}

impl fmt::Debug for DeploymentCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentCoordinator")
            .field("workdir", &self.settings.workdir)
            .field("phase", &self.phase)
            .finish()
    }
}

impl DeploymentCoordinator {
    pub fn new(
        settings: Settings,
        pool: Box<dyn HostPool>,
        executor: Box<dyn RemoteExecutor>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        DeploymentCoordinator {
            settings,
            pool,
            executor,
            runner,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Bootstrap the toolchain and clone the repository on every pool host.
    pub fn install(&mut self) -> Result<(), BenchError> {
        let hosts = self.pool.addresses().bench_context("failed to read the host pool")?;
        if hosts.is_empty() {
            return Err(RigError::InsufficientHosts {
                required: 1,
                available: 0,
            })
            .bench_context("failed to install repo on testbed");
        }
        info!(hosts = hosts.len(), "installing rust and cloning the repo");
        self.executor
            .run_group(&hosts, &commands::install(&self.settings.repo))
            .bench_context("failed to install repo on testbed")?;
        info!(hosts = hosts.len(), "testbed initialized");
        Ok(())
    }

    /// Kill every session on `hosts` (all pool hosts when empty), optionally
    /// deleting their logs first.
    pub fn kill(&mut self, hosts: &[String], delete_logs: bool) -> Result<(), BenchError> {
        let hosts = if hosts.is_empty() {
            self.pool.addresses().bench_context("failed to read the host pool")?
        } else {
            hosts.to_vec()
        };
        let clean = if delete_logs {
            commands::clean_logs()
        } else {
            "true".to_string()
        };
        let cmd = format!("{} && ({} || true)", clean, commands::kill());
        info!(hosts = hosts.len(), delete_logs, "killing nodes");
        self.executor
            .run_group(&hosts, &cmd)
            .bench_context("failed to kill nodes")
    }

    /// Select hosts, update them, generate and push configuration, launch.
    pub fn run(&mut self, params: &BenchParameters) -> Result<Deployment, BenchError> {
        let _lock = WorkdirLock::acquire(&self.settings.workdir)
            .bench_context("failed to lock the working directory")?;
        let result = self.run_steps(params, true);
        self.finish(result)
    }

    /// Like `run`, but starts the processes on the configuration the hosts
    /// already have.
    pub fn justrun(&mut self, params: &BenchParameters) -> Result<Deployment, BenchError> {
        let _lock = WorkdirLock::acquire(&self.settings.workdir)
            .bench_context("failed to lock the working directory")?;
        let result = self.run_steps(params, false);
        self.finish(result)
    }

    /// Download the logs of the last run into `<workdir>/logs`.
    pub fn pull_logs(&mut self, params: &BenchParameters) -> Result<Vec<PathBuf>, BenchError> {
        let _lock = WorkdirLock::acquire(&self.settings.workdir)
            .bench_context("failed to lock the working directory")?;
        let hosts = self.select(params).bench_context("not enough hosts available")?;
        let log_dir = self.settings.workdir.join(paths::LOCAL_LOG_DIR);
        let files = LogCollector::new(self.executor.as_ref(), &log_dir)
            .collect(&hosts, params)
            .bench_context("failed to download logs")?;
        info!(dir = %log_dir.display(), files = files.len(), "downloaded logs");
        Ok(files)
    }

    fn finish(&mut self, result: Result<Deployment, BenchError>) -> Result<Deployment, BenchError> {
        if result.is_err() {
            self.transition(Phase::Idle);
        }
        result
    }

    fn transition(&mut self, next: Phase) {
        debug_assert!(
            next == Phase::Idle || next >= self.phase,
            "phase cannot go back from {} to {}",
            self.phase,
            next
        );
        if self.phase != next {
            info!(from = %self.phase, to = %next, "phase");
            self.phase = next;
        }
    }

    fn run_steps(&mut self, params: &BenchParameters, configure: bool) -> Result<Deployment, BenchError> {
        self.transition(Phase::Idle);
        let hosts = self.select(params).bench_context("not enough hosts available")?;
        let s = &self.settings;
        committee::check_ports(s.base_port, s.client_base_port, s.client_run_port, hosts.len())
            .bench_context("invalid port configuration")?;
        self.transition(Phase::HostsSelected);

        self.update(&hosts).bench_context("failed to update nodes")?;
        self.transition(Phase::CodeUpdated);

        let live = params.live_nodes();
        let (run_id, run_dir, nodes) = if configure {
            let run_id = Uuid::new_v4().to_string();
            let run_dir = paths::run_dir(&self.settings.workdir, &run_id);
            info!(run_id = %run_id, "starting run");
            let config = ConfigGenerator::new(&self.settings, self.runner.as_ref())
                .generate(&run_dir, &hosts)
                .bench_context("failed to configure nodes")?;
            prune_runs(&self.settings.workdir.join(paths::RUNS_DIR), self.settings.keep_runs)
                .bench_context("failed to prune old runs")?;
            self.push(&config, live).bench_context("failed to configure nodes")?;
            self.transition(Phase::ConfigPushed);
            (Some(run_id), Some(run_dir), config.assignments)
        } else {
            let nodes = committee::assignments(
                &hosts,
                self.settings.base_port,
                self.settings.client_base_port,
            )
            .bench_context("failed to configure nodes")?;
            (None, None, nodes)
        };

        self.launch(&nodes[..live], params).bench_context("failed to launch nodes")?;
        self.transition(Phase::Launched);

        Ok(Deployment {
            run_id,
            run_dir,
            hosts,
            live_nodes: live,
            phase: self.phase,
        })
    }

    fn select(&self, params: &BenchParameters) -> Result<Vec<Host>, RigError> {
        let domains = self.pool.domains()?;
        let hosts = select_hosts(&domains, params.max_nodes()).map_err(|e| {
            warn!(error = %e, "there are not enough instances available");
            e
        })?;
        info!(
            hosts = ?hosts.iter().map(|h| h.address.as_str()).collect::<Vec<_>>(),
            "selected hosts"
        );
        Ok(hosts)
    }

    fn update(&self, hosts: &[Host]) -> Result<(), RigError> {
        let mut addresses: Vec<String> = Vec::with_capacity(hosts.len());
        for h in hosts {
            if !addresses.contains(&h.address) {
                addresses.push(h.address.clone());
            }
        }
        info!(
            machines = addresses.len(),
            branch = %self.settings.repo.branch,
            "updating machines"
        );
        self.executor
            .run_group(&addresses, &commands::update(&self.settings.repo, &self.settings.binary))
    }

    /// Clean each live node and upload its files. Trailing faulty nodes get nothing.
    fn push(&self, config: &GeneratedConfig, live: usize) -> Result<(), RigError> {
        for node in config.assignments.iter().take(live) {
            let host = node.host.address.as_str();
            info!(host = %host, node = node.index, "uploading config files");
            self.executor
                .run(host, &format!("{} || true", commands::cleanup()))?;
            if node.is_aggregator() {
                self.executor
                    .put(host, &config.local(paths::SYNCER_FILE), paths::REMOTE_DIR)?;
            }
            for name in [node.key_file.as_str(), node.input_file.as_str(), paths::IP_FILE] {
                self.executor.put(host, &config.local(name), paths::REMOTE_DIR)?;
            }
        }
        Ok(())
    }

    /// Start the syncer on node 0, then a primary on every node in order. With
    /// readiness settings, the primaries wait until the syncer accepts
    /// connections on the client-run port.
    fn launch(&self, nodes: &[NodeAssignment], params: &BenchParameters) -> Result<(), RigError> {
        let launcher = ProcessLauncher::new(self.executor.as_ref(), &self.settings.binary);
        info!(nodes = nodes.len(), "booting primaries");
        if let Some(first) = nodes.first() {
            let session = launcher.launch_syncer(first, params)?;
            if let Some(ref readiness) = self.settings.readiness {
                let attempts = launcher.wait_until_serving(
                    &first.host.address,
                    &session,
                    self.settings.client_run_port,
                    &RetryPolicy::from_settings(readiness),
                )?;
                info!(session = %session, attempts, "syncer is serving");
            }
        }
        for node in nodes {
            launcher.launch_primary(node, params)?;
        }
        Ok(())
    }
}
