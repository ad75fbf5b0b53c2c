//! SSH connection context.
//!
//! `ConnectionContext` carries the credentials and connection options shared by
//! every remote call of a run. It is built once from `Settings` and handed to
//! the executor explicitly.

use std::path::PathBuf;

use crate::types::config::SshSettings;


/// SSH user, key and options used to reach every host of the pool.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionContext {
    pub user: String,
    /// Path to an SSH private key, if not using the default.
    pub key_path: Option<PathBuf>,
    pub port: u16,
    pub connect_timeout_secs: u64,
}

impl ConnectionContext {
    pub fn from_settings(ssh: &SshSettings) -> Self {
        ConnectionContext {
            user: ssh.user.clone(),
            key_path: ssh.key_path.clone(),
            port: ssh.port,
            connect_timeout_secs: ssh.connect_timeout_secs,
        }
    }

    /// Build the `user@host` string used in SSH/scp commands.
    pub fn user_at_host(&self, host: &str) -> String {
        format!("{}@{}", self.user, host)
    }

    /// Options shared by ssh and scp.
    fn common_options(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "LogLevel=ERROR".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
        ];
        if let Some(ref key) = self.key_path {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        args
    }

    /// Build base SSH arguments (port, options, key, user@host) without a command.
    pub fn ssh_args(&self, host: &str) -> Vec<String> {
        let mut args = vec!["-p".to_string(), self.port.to_string()];
        args.extend(self.common_options());
        args.push(self.user_at_host(host));
        args
    }

    /// Build base scp arguments (port, options, key). Source and target follow.
    pub fn scp_args(&self) -> Vec<String> {
        let mut args = vec!["-q".to_string(), "-P".to_string(), self.port.to_string()];
        args.extend(self.common_options());
        args
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn context(key: Option<&str>) -> ConnectionContext {
        ConnectionContext {
            user: "ubuntu".into(),
            key_path: key.map(PathBuf::from),
            port: 22,
            connect_timeout_secs: 10,
        }
    }

    #[test]
    fn ssh_args_end_with_target() {
        let args = context(None).ssh_args("10.0.0.1");
        assert_eq!(&args[..2], &["-p".to_string(), "22".to_string()]);
        assert!(args.contains(&"ConnectTimeout=10".to_string()));
        assert!(!args.contains(&"-i".to_string()));
        assert_eq!(args.last().unwrap(), "ubuntu@10.0.0.1");
    }

    #[test]
    fn key_is_passed_to_ssh_and_scp() {
        let ctx = context(Some("/keys/bench.pem"));
        let ssh = ctx.ssh_args("h");
        let scp = ctx.scp_args();
        for args in [&ssh, &scp] {
            let i = args.iter().position(|a| a == "-i").unwrap();
            assert_eq!(args[i + 1], "/keys/bench.pem");
        }
        assert!(scp.contains(&"-P".to_string()));
    }

    #[test]
    fn from_settings_copies_fields() {
        let ssh = SshSettings {
            user: "deploy".into(),
            key_path: None,
            port: 2222,
            connect_timeout_secs: 5,
        };
        let ctx = ConnectionContext::from_settings(&ssh);
        assert_eq!(ctx.user_at_host("h1"), "deploy@h1");
        assert_eq!(ctx.port, 2222);
    }
}
