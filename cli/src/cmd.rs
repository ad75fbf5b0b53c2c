//! Benchrig subcommands.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use structopt::StructOpt;

use benchrig_core::logs::analyzer::analyze_dir;
use benchrig_core::types::BenchParameters;

use crate::Benchrig;

#[derive(StructOpt, Debug)]
pub enum BenchrigSubcommands {
    /// Install the toolchain and clone the repository on every host.
    Install,
    /// Stop benchmark processes on the hosts.
    Kill(Kill),
    /// Update, configure and start a benchmark.
    Run(BenchArgs),
    /// Update and start a benchmark on the configuration already deployed.
    Justrun(BenchArgs),
    /// Download the logs of the last run.
    Logs(BenchArgs),
    /// Print latency averages from downloaded logs.
    Analyze(Analyze),
}

impl BenchrigSubcommands {
    pub fn run(&self, base: &Benchrig) -> Result<()> {
        match self {
            BenchrigSubcommands::Install => base.coordinator()?.install().map_err(Into::into),
            BenchrigSubcommands::Kill(inner) => inner.run(base),
            BenchrigSubcommands::Run(args) => {
                let params = args.parameters()?;
                let deployment = base.coordinator()?.run(&params)?;
                println!("{}", deployment);
                Ok(())
            }
            BenchrigSubcommands::Justrun(args) => {
                let params = args.parameters()?;
                let deployment = base.coordinator()?.justrun(&params)?;
                println!("{}", deployment);
                Ok(())
            }
            BenchrigSubcommands::Logs(args) => {
                let params = args.parameters()?;
                for file in base.coordinator()?.pull_logs(&params)? {
                    println!("{}", file.display());
                }
                Ok(())
            }
            BenchrigSubcommands::Analyze(inner) => inner.run(),
        }
    }
}


#[derive(StructOpt, Debug)]
pub struct Kill {
    /// Hosts to stop (default: every host of the inventory).
    #[structopt(long = "host")]
    hosts: Vec<String>,
    /// Delete the remote logs too.
    #[structopt(long)]
    delete_logs: bool,
}

impl Kill {
    fn run(&self, base: &Benchrig) -> Result<()> {
        base.coordinator()?.kill(&self.hosts, self.delete_logs)?;
        Ok(())
    }
}


/// Benchmark parameters, from flags or from a YAML file.
#[derive(StructOpt, Debug)]
pub struct BenchArgs {
    /// YAML file with nodes, faults, num_messages, batch_size and compression_factor.
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,
    /// Committee sizes; the largest decides how many hosts are used.
    #[structopt(long, use_delimiter = true)]
    nodes: Vec<usize>,
    /// Trailing nodes left unconfigured and unstarted.
    #[structopt(long)]
    faults: Option<usize>,
    #[structopt(long)]
    messages: Option<u64>,
    #[structopt(long)]
    batch_size: Option<u64>,
    #[structopt(long)]
    compression_factor: Option<f64>,
}

impl BenchArgs {
    pub fn parameters(&self) -> Result<BenchParameters> {
        if let Some(ref path) = self.params {
            if self.has_flags() {
                bail!("--params cannot be combined with individual parameter flags");
            }
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let params: BenchParameters = serde_yaml::from_str(&content)
                .with_context(|| format!("invalid benchmark parameters in {}", path.display()))?;
            return Ok(params);
        }
        let params = BenchParameters::new(
            self.nodes.clone(),
            self.faults.unwrap_or(0),
            self.messages.ok_or_else(|| anyhow!("--messages is required"))?,
            self.batch_size.ok_or_else(|| anyhow!("--batch-size is required"))?,
            self.compression_factor
                .ok_or_else(|| anyhow!("--compression-factor is required"))?,
        )
        .context("invalid benchmark parameters")?;
        Ok(params)
    }

    fn has_flags(&self) -> bool {
        !self.nodes.is_empty()
            || self.faults.is_some()
            || self.messages.is_some()
            || self.batch_size.is_some()
            || self.compression_factor.is_some()
    }
}


#[derive(StructOpt, Debug)]
pub struct Analyze {
    /// Directory holding downloaded logs.
    #[structopt(long, parse(from_os_str), default_value = "logs")]
    dir: PathBuf,
    /// Only files whose name starts with this prefix are read.
    #[structopt(long, default_value = "syncer-")]
    prefix: String,
}

impl Analyze {
    fn run(&self) -> Result<()> {
        let report = analyze_dir(&self.dir, &self.prefix)
            .with_context(|| format!("failed to analyze logs in {}", self.dir.display()))?;
        print!("{}", report);
        Ok(())
    }
}
