//! The benchrig CLI.
//!
//! # Usage
//!
//! ```text
//! benchrig install
//! benchrig run --nodes 10 --faults 3 --messages 1000 --batch-size 100 --compression-factor 1.5
//! benchrig justrun --params bench.yaml
//! benchrig logs --params bench.yaml
//! benchrig kill --delete-logs
//! benchrig analyze --dir logs
//! ```

mod cmd;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use structopt::StructOpt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use benchrig_core::infrastructure::runner::ShellRunner;
use benchrig_core::rig::connection::ConnectionContext;
use benchrig_core::rig::inventory::Inventory;
use benchrig_core::rig::remote::SshExecutor;
use benchrig_core::rig::DeploymentCoordinator;
use benchrig_core::types::Settings;

/// Distributed benchmark orchestration.
#[derive(StructOpt, Debug)]
#[structopt(name = "benchrig")]
pub struct Benchrig {
    #[structopt(subcommand)]
    action: cmd::BenchrigSubcommands,
    /// Enable debug logging.
    #[structopt(short)]
    verbose: bool,
    /// Settings file (default: $BENCHRIG_SETTINGS, then ./settings.yaml).
    #[structopt(long, parse(from_os_str))]
    settings: Option<PathBuf>,
}

impl Benchrig {
    pub fn run(self) -> Result<()> {
        let level = if self.verbose { "debug" } else { "info" };
        let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().with_target(false).compact())
            .init();

        self.action.run(&self)
    }

    /// Resolve and load the settings file.
    pub fn load_settings(&self) -> Result<Settings> {
        let path = benchrig_core::settings::resolve_path(self.settings.as_deref());
        tracing::debug!(path = %path.display(), "loading settings");
        benchrig_core::settings::load(&path)
            .with_context(|| format!("failed to load settings from {}", path.display()))
    }

    /// Coordinator over SSH with the settings' inventory.
    pub fn coordinator(&self) -> Result<DeploymentCoordinator> {
        let settings = self.load_settings()?;
        Ok(build_coordinator(settings))
    }
}

fn build_coordinator(settings: Settings) -> DeploymentCoordinator {
    let context = ConnectionContext::from_settings(&settings.ssh);
    let pool = Inventory::new(settings.inventory.clone());
    DeploymentCoordinator::new(
        settings,
        Box::new(pool),
        Box::new(SshExecutor::new(context, ShellRunner)),
        Box::new(ShellRunner),
    )
}

fn main() {
    let cli = Benchrig::from_args();
    if let Err(e) = cli.run() {
        eprintln!("benchrig: {:#}", e);
        process::exit(1);
    }
}
