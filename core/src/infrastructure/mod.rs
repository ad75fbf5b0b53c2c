//! Local infrastructure: shell command execution, tmux command building and
//! the working-directory lock.

pub mod lock;
pub mod runner;
pub mod tmux;
