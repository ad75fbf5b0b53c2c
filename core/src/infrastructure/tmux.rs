//! Tmux command builder.
//!
//! Benchmark processes run inside detached tmux sessions so they survive the
//! SSH connection that started them. `TmuxCommandBuilder` only builds command
//! strings; the caller runs them on the target host.

// ---------------------------------------------------------------------------
// Command builder
// ---------------------------------------------------------------------------

/// Builds tmux CLI command strings without executing them.
pub struct TmuxCommandBuilder;

impl TmuxCommandBuilder {
    pub fn new() -> Self {
        TmuxCommandBuilder
    }

    /// `tmux new-session -d -s <name> '<command> 2>&1 | tee <log_file>'`
    ///
    /// Both output streams of `command` end up in `log_file`.
    pub fn new_detached(&self, name: &str, command: &str, log_file: &str) -> String {
        let inner = format!("{} 2>&1 | tee {}", command, shell_escape(log_file));
        format!(
            "tmux new-session -d -s {} {}",
            shell_escape(name),
            shell_escape(&inner)
        )
    }

    /// `tmux has-session -t <name>`
    pub fn has_session(&self, name: &str) -> String {
        format!("tmux has-session -t {}", shell_escape(name))
    }

    /// `tmux kill-server`: ends every session of the remote user.
    pub fn kill_server(&self) -> String {
        "tmux kill-server".to_string()
    }
}

impl Default for TmuxCommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Session name for a log file: its file stem (`logs/syncer-0.log` -> `syncer-0`).
pub fn session_name(log_file: &str) -> String {
    std::path::Path::new(log_file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| log_file.to_string())
}

/// Quote a string for a POSIX shell when it contains special characters.
pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '%' | ':' | '=' | '@' | ',')
    }) {
        return s.to_string();
    }
    let escaped = s.replace('\'', "'\\''");
    format!("'{}'", escaped)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmd_new_detached() {
        let b = TmuxCommandBuilder::new();
        let cmd = b.new_detached("syncer-0", "./node --config node-0.json", "logs/syncer-0.log");
        assert_eq!(
            cmd,
            "tmux new-session -d -s syncer-0 './node --config node-0.json 2>&1 | tee logs/syncer-0.log'"
        );
    }

    #[test]
    fn cmd_new_detached_quotes_inner_command() {
        let b = TmuxCommandBuilder::new();
        let cmd = b.new_detached("client-1", "echo 'hi'", "logs/client-1.log");
        assert!(cmd.starts_with("tmux new-session -d -s client-1 '"));
        assert!(cmd.contains("'\\''hi'\\''"));
    }

    #[test]
    fn cmd_has_session() {
        let b = TmuxCommandBuilder::new();
        assert_eq!(b.has_session("syncer-0"), "tmux has-session -t syncer-0");
    }

    #[test]
    fn cmd_kill_server() {
        assert_eq!(TmuxCommandBuilder::new().kill_server(), "tmux kill-server");
    }

    #[test]
    fn session_name_from_log_file() {
        assert_eq!(session_name("logs/syncer-0.log"), "syncer-0");
        assert_eq!(session_name("client-12.log"), "client-12");
    }

    // -- Shell escape tests --

    #[test]
    fn escape_simple() {
        assert_eq!(shell_escape("hello"), "hello");
    }

    #[test]
    fn escape_with_space() {
        assert_eq!(shell_escape("hello world"), "'hello world'");
    }

    #[test]
    fn escape_with_single_quote() {
        assert_eq!(shell_escape("it's"), "'it'\\''s'");
    }

    #[test]
    fn escape_empty() {
        assert_eq!(shell_escape(""), "''");
    }

    #[test]
    fn escape_host_and_path_no_quoting() {
        assert_eq!(shell_escape("ubuntu@10.0.0.1:logs/x.log"), "ubuntu@10.0.0.1:logs/x.log");
    }
}
