pub mod commands;
pub mod committee;
pub mod generator;
pub mod inputs;
pub mod launcher;
pub mod paths;

pub use committee::{AddressBook, Committee, CommitteeMember, NodeAssignment};
pub use generator::{ConfigGenerator, GeneratedConfig};
pub use launcher::ProcessLauncher;
