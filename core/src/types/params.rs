use serde::{Deserialize, Serialize};

use crate::error::RigError;

/// Parameters of one benchmark run. Always valid once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawBenchParameters")]
pub struct BenchParameters {
    pub nodes: Vec<usize>,
    pub faults: usize,
    pub num_messages: u64,
    pub batch_size: u64,
    pub compression_factor: f64,
}

#[derive(Debug, Deserialize)]
struct RawBenchParameters {
    nodes: Vec<usize>,
    #[serde(default)]
    faults: usize,
    num_messages: u64,
    batch_size: u64,
    compression_factor: f64,
}

impl BenchParameters {
    pub fn new(
        nodes: Vec<usize>,
        faults: usize,
        num_messages: u64,
        batch_size: u64,
        compression_factor: f64,
    ) -> Result<Self, RigError> {
        if nodes.is_empty() {
            return Err(RigError::Config("at least one node count is required".into()));
        }
        if nodes.iter().any(|&n| n == 0) {
            return Err(RigError::Config("node counts must be positive".into()));
        }
        let max = nodes.iter().copied().max().unwrap_or(0);
        if faults >= max {
            return Err(RigError::Config(format!(
                "{} faults leave no live node out of {}",
                faults, max
            )));
        }
        if !compression_factor.is_finite() || compression_factor <= 0.0 {
            return Err(RigError::Config(format!(
                "compression factor must be positive, got {}",
                compression_factor
            )));
        }
        Ok(BenchParameters {
            nodes,
            faults,
            num_messages,
            batch_size,
            compression_factor,
        })
    }

    /// Number of hosts a run needs.
    pub fn max_nodes(&self) -> usize {
        self.nodes.iter().copied().max().unwrap_or(0)
    }

    /// Number of leading hosts that get configured and started.
    pub fn live_nodes(&self) -> usize {
        self.max_nodes() - self.faults
    }
}

impl TryFrom<RawBenchParameters> for BenchParameters {
    type Error = RigError;

    fn try_from(raw: RawBenchParameters) -> Result<Self, Self::Error> {
        BenchParameters::new(
            raw.nodes,
            raw.faults,
            raw.num_messages,
            raw.batch_size,
            raw.compression_factor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_parameters() {
        let p = BenchParameters::new(vec![4, 7], 2, 1000, 100, 1.5).unwrap();
        assert_eq!(p.max_nodes(), 7);
        assert_eq!(p.live_nodes(), 5);
    }

    #[test]
    fn faults_must_leave_a_live_node() {
        for faults in [4, 5, 100] {
            let err = BenchParameters::new(vec![2, 4], faults, 10, 10, 1.0).unwrap_err();
            assert!(matches!(err, RigError::Config(_)));
        }
        assert!(BenchParameters::new(vec![2, 4], 3, 10, 10, 1.0).is_ok());
    }

    #[test]
    fn empty_or_zero_nodes_rejected() {
        assert!(BenchParameters::new(vec![], 0, 10, 10, 1.0).is_err());
        assert!(BenchParameters::new(vec![0, 3], 0, 10, 10, 1.0).is_err());
    }

    #[test]
    fn bad_compression_factor_rejected() {
        assert!(BenchParameters::new(vec![3], 0, 10, 10, 0.0).is_err());
        assert!(BenchParameters::new(vec![3], 0, 10, 10, f64::NAN).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: BenchParameters = serde_yaml::from_str(
            "nodes: [4]\nfaults: 1\nnum_messages: 500\nbatch_size: 50\ncompression_factor: 2.0\n",
        )
        .unwrap();
        assert_eq!(ok.faults, 1);

        let bad = serde_yaml::from_str::<BenchParameters>(
            "nodes: [4]\nfaults: 4\nnum_messages: 500\nbatch_size: 50\ncompression_factor: 2.0\n",
        );
        assert!(bad.is_err());
    }
}
