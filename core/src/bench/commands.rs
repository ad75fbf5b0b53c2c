//! Shell commands issued locally and on the hosts.
//!
//! Every builder returns a plain command string; the runner or executor runs
//! it. Multi-step commands are joined with `&&` so the first failure stops the
//! sequence.

use crate::infrastructure::tmux::{shell_escape, TmuxCommandBuilder};
use crate::types::config::RepoSettings;

use super::paths;

pub fn compile() -> String {
    "cargo build --release".to_string()
}

/// Remove configuration left by earlier runs.
pub fn cleanup() -> String {
    format!(
        "rm -f {} {} {} node-*.json input_*.txt",
        paths::IP_FILE,
        paths::SYNCER_FILE,
        paths::COMMITTEE_FILE
    )
}

pub fn clean_logs() -> String {
    format!("rm -rf {dir} && mkdir -p {dir}", dir = paths::REMOTE_LOG_DIR)
}

/// End every detached session of the remote user.
pub fn kill() -> String {
    TmuxCommandBuilder::new().kill_server()
}

/// Symlink `binary` from `origin` into the current directory.
pub fn alias_binaries(origin: &str, binary: &str) -> String {
    let target = format!("{}/{}", origin.trim_end_matches('/'), binary);
    format!(
        "rm -f {bin} && ln -s {target} .",
        bin = shell_escape(binary),
        target = shell_escape(&target)
    )
}

/// Generate the per-node key files with the benchmark binary.
pub fn generate_config_files(
    binary: &str,
    base_port: u16,
    client_base_port: u16,
    client_run_port: u16,
    nodes: usize,
) -> String {
    format!(
        "./{} generate --base-port {} --client-base-port {} --client-run-port {} --nodes {}",
        binary, base_port, client_base_port, client_run_port, nodes
    )
}

fn bench_flags(key_file: &str, num_messages: u64, batch_size: u64, compression_factor: f64) -> String {
    format!(
        "--config {} --ip {} --messages {} --batch {} --compression {}",
        shell_escape(key_file),
        paths::IP_FILE,
        num_messages,
        batch_size,
        compression_factor
    )
}

/// The aggregator process, started on node 0 only.
pub fn run_syncer(
    binary: &str,
    key_file: &str,
    num_messages: u64,
    batch_size: u64,
    compression_factor: f64,
) -> String {
    format!(
        "./{} {} --syncer {}",
        binary,
        bench_flags(key_file, num_messages, batch_size, compression_factor),
        paths::SYNCER_FILE
    )
}

/// The primary benchmark process, started on every live node.
pub fn run_primary(
    binary: &str,
    key_file: &str,
    num_messages: u64,
    batch_size: u64,
    compression_factor: f64,
) -> String {
    format!(
        "./{} {}",
        binary,
        bench_flags(key_file, num_messages, batch_size, compression_factor)
    )
}

/// Exits 0 once something accepts connections on `port` of the local host.
pub fn port_open(port: u16) -> String {
    format!("nc -z 127.0.0.1 {}", port)
}

/// Toolchain bootstrap and repository clone, as one `&&` chain.
pub fn install(repo: &RepoSettings) -> String {
    let steps = vec![
        "sudo apt-get update".to_string(),
        "sudo apt-get -y upgrade".to_string(),
        "sudo apt-get -y autoremove".to_string(),
        "sudo apt-get -y install build-essential cmake clang libgmp-dev tmux netcat-openbsd".to_string(),
        "curl --proto \"=https\" --tlsv1.2 -sSf https://sh.rustup.rs | sh -s -- -y".to_string(),
        "source $HOME/.cargo/env".to_string(),
        format!("rustup install {}", repo.toolchain),
        format!("rustup override set {}", repo.toolchain),
        format!(
            "(git clone {url} {name} || (cd {name} && git pull))",
            url = shell_escape(&repo.url),
            name = shell_escape(&repo.name)
        ),
    ];
    steps.join(" && ")
}

/// Fetch the configured branch, rebuild, and alias the binary into the home directory.
pub fn update(repo: &RepoSettings, binary: &str) -> String {
    let name = shell_escape(&repo.name);
    let branch = shell_escape(&repo.branch);
    let steps = vec![
        format!("(cd {} && git fetch -f)", name),
        format!("(cd {} && git checkout -f {})", name, branch),
        format!("(cd {} && git pull -f)", name),
        "source $HOME/.cargo/env".to_string(),
        "sudo apt-get install -y pkg-config libssl-dev".to_string(),
        "export RUSTFLAGS=\"-C target-feature=+aes,+ssse3\"".to_string(),
        format!("(cd {} && {})", name, compile()),
        alias_binaries(&format!("./{}/target/release", repo.name), binary),
    ];
    steps.join(" && ")
}
