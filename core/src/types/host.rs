use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Host {
    pub address: String,
    pub placement_domain: String,
}

impl Host {
    pub fn new(address: &str, placement_domain: &str) -> Self {
        Host {
            address: address.to_string(),
            placement_domain: placement_domain.to_string(),
        }
    }
}

/// A named group of hosts (a region or zone), hosts in inventory order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementDomain {
    pub domain: String,
    #[serde(default)]
    pub hosts: Vec<String>,
}
