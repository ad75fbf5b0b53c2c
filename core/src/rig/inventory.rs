//! Host inventory.
//!
//! `HostPool` hands out the machines of the testbed grouped by placement
//! domain. `Inventory` is the settings-backed implementation: a fixed list of
//! domains, each with its hosts, in file order.

use crate::error::RigError;
use crate::types::host::PlacementDomain;


/// Source of the machines available to a run.
pub trait HostPool: Send + Sync {
    /// Every placement domain with its hosts. Order is stable across calls.
    fn domains(&self) -> Result<Vec<PlacementDomain>, RigError>;

    /// All host addresses, domain by domain.
    fn addresses(&self) -> Result<Vec<String>, RigError> {
        Ok(self
            .domains()?
            .into_iter()
            .flat_map(|d| d.hosts)
            .collect())
    }
}


/// Static inventory read from settings.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    domains: Vec<PlacementDomain>,
}

impl Inventory {
    pub fn new(domains: Vec<PlacementDomain>) -> Self {
        Inventory { domains }
    }

    pub fn len(&self) -> usize {
        self.domains.iter().map(|d| d.hosts.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HostPool for Inventory {
    fn domains(&self) -> Result<Vec<PlacementDomain>, RigError> {
        Ok(self.domains.clone())
    }
}
