//! Committee and address books.
//!
//! Node `i` is the `i`-th selected host. It listens on `base_port + i`, its
//! aggregator-facing endpoint is `client_base_port + i`, and node 0 also
//! exposes the client-run port to the outside.

use serde::{Deserialize, Serialize};

use crate::error::RigError;
use crate::types::host::Host;

use super::paths;

/// Address slots per committee member: the node's own service plus one reserved.
pub const REDUNDANCY_SLOTS: usize = 2;


fn port_at(base: u16, index: usize) -> Result<u16, RigError> {
    u16::try_from(index)
        .ok()
        .and_then(|i| base.checked_add(i))
        .ok_or_else(|| {
            RigError::Config(format!("port {} + {} is out of range", base, index))
        })
}


/// Check that `nodes` hosts fit the configured port ranges: neither range
/// overflows, the two ranges are disjoint and the client-run port lies
/// outside both.
pub fn check_ports(
    base_port: u16,
    client_base_port: u16,
    client_run_port: u16,
    nodes: usize,
) -> Result<(), RigError> {
    if nodes == 0 {
        return Ok(());
    }
    let service = base_port..=port_at(base_port, nodes - 1)?;
    let client = client_base_port..=port_at(client_base_port, nodes - 1)?;
    if service.start() <= client.end() && client.start() <= service.end() {
        return Err(RigError::Config(format!(
            "node ports {}-{} overlap client ports {}-{}",
            service.start(),
            service.end(),
            client.start(),
            client.end()
        )));
    }
    if service.contains(&client_run_port) || client.contains(&client_run_port) {
        return Err(RigError::Config(format!(
            "client_run_port {} falls inside the node port ranges",
            client_run_port
        )));
    }
    Ok(())
}


// ---------------------------------------------------------------------------
// Committee
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitteeMember {
    pub id: String,
    pub addresses: Vec<String>,
    pub port: u16,
}

/// Node identifier -> addresses and port, in selection order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Committee {
    pub base_port: u16,
    pub nodes: Vec<CommitteeMember>,
}

impl Committee {
    pub fn new(hosts: &[Host], base_port: u16) -> Result<Committee, RigError> {
        let nodes = hosts
            .iter()
            .enumerate()
            .map(|(i, host)| {
                Ok(CommitteeMember {
                    id: i.to_string(),
                    addresses: vec![host.address.clone(); REDUNDANCY_SLOTS],
                    port: port_at(base_port, i)?,
                })
            })
            .collect::<Result<Vec<_>, RigError>>()?;
        Ok(Committee { base_port, nodes })
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, RigError> {
        serde_json::to_string_pretty(self)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| RigError::local("serialize committee", e))
    }
}


// ---------------------------------------------------------------------------
// AddressBook
// ---------------------------------------------------------------------------

/// Ordered `address:port` lines, written verbatim to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBook {
    lines: Vec<String>,
}

impl AddressBook {
    /// One line per node on its service port, then node 0's client-run port.
    pub fn nodes(hosts: &[Host], base_port: u16, client_run_port: u16) -> Result<AddressBook, RigError> {
        let mut lines = Vec::with_capacity(hosts.len() + 1);
        for (i, host) in hosts.iter().enumerate() {
            lines.push(format!("{}:{}", host.address, port_at(base_port, i)?));
        }
        if let Some(first) = hosts.first() {
            lines.push(format!("{}:{}", first.address, client_run_port));
        }
        Ok(AddressBook { lines })
    }

    /// One line per node on its aggregator-facing port.
    pub fn syncer(hosts: &[Host], client_base_port: u16) -> Result<AddressBook, RigError> {
        let lines = hosts
            .iter()
            .enumerate()
            .map(|(i, host)| Ok(format!("{}:{}", host.address, port_at(client_base_port, i)?)))
            .collect::<Result<Vec<_>, RigError>>()?;
        Ok(AddressBook { lines })
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.iter().map(|l| format!("{}\n", l)).collect()
    }
}


// ---------------------------------------------------------------------------
// NodeAssignment
// ---------------------------------------------------------------------------

/// Everything one node needs, derived from the committee and host list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAssignment {
    pub index: usize,
    pub host: Host,
    pub port: u16,
    pub client_port: u16,
    pub key_file: String,
    pub input_file: String,
}

impl NodeAssignment {
    /// Node 0 also runs the aggregator.
    pub fn is_aggregator(&self) -> bool {
        self.index == 0
    }
}

pub fn assignments(
    hosts: &[Host],
    base_port: u16,
    client_base_port: u16,
) -> Result<Vec<NodeAssignment>, RigError> {
    hosts
        .iter()
        .enumerate()
        .map(|(index, host)| {
            Ok(NodeAssignment {
                index,
                host: host.clone(),
                port: port_at(base_port, index)?,
                client_port: port_at(client_base_port, index)?,
                key_file: paths::key_file(index),
                input_file: paths::input_file(index),
            })
        })
        .collect()
}
