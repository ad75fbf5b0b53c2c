//! Remote testbed management.
//!
//! Everything that touches the hosts lives here: the inventory and host
//! selection, SSH connection settings, the `RemoteExecutor` seam with its SSH
//! and recording implementations, bounded retry, and the deployment
//! coordinator that sequences a benchmark run.

pub mod connection;
pub mod inventory;
pub mod mock;
pub mod orchestrator;
pub mod remote;
pub mod retry;
pub mod selector;

pub use orchestrator::{Deployment, DeploymentCoordinator, Phase};
