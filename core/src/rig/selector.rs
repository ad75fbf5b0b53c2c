//! Host selection.
//!
//! Hosts are taken round-robin across placement domains (the first host of
//! every domain, then the second of every domain, ...) so that a run spreads
//! over as many domains as possible, then truncated to the requested count.

use crate::error::RigError;
use crate::types::host::{Host, PlacementDomain};


/// Pick exactly `n` hosts, interleaved across domains.
///
/// Domains that run out of hosts are skipped in later rounds. Fails with
/// `InsufficientHosts` if the pool holds fewer than `n` hosts in total.
pub fn select_hosts(domains: &[PlacementDomain], n: usize) -> Result<Vec<Host>, RigError> {
    let available: usize = domains.iter().map(|d| d.hosts.len()).sum();
    if available < n {
        return Err(RigError::InsufficientHosts {
            required: n,
            available,
        });
    }

    let rounds = domains.iter().map(|d| d.hosts.len()).max().unwrap_or(0);
    let mut selected = Vec::with_capacity(n);
    'outer: for round in 0..rounds {
        for domain in domains {
            if selected.len() == n {
                break 'outer;
            }
            if let Some(address) = domain.hosts.get(round) {
                selected.push(Host::new(address, &domain.domain));
            }
        }
    }
    Ok(selected)
}
