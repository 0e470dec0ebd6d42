/*!
 * Workload Shapes
 * Request-size sequences driven against a backend
 */

use super::types::HarnessError;
use crate::control::Backend;
use crate::core::limits::{MIXED_SIZE_MAX, MIXED_SIZE_MIN, UNIFORM_SMALL_SIZE};
use crate::core::types::Size;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Workload shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workload {
    /// Every request is 64 bytes
    UniformSmall,
    /// Requests drawn uniformly from 32..=4096 bytes
    MixedSize,
}

impl Workload {
    pub const ALL: [Workload; 2] = [Workload::UniformSmall, Workload::MixedSize];

    /// Request sizes for a run, precomputed so generation stays off the clock
    pub fn sizes(self, iterations: usize, seed: u64) -> Vec<Size> {
        match self {
            Workload::UniformSmall => vec![UNIFORM_SMALL_SIZE; iterations],
            Workload::MixedSize => {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..iterations)
                    .map(|_| rng.gen_range(MIXED_SIZE_MIN..=MIXED_SIZE_MAX))
                    .collect()
            }
        }
    }

    /// Human-readable description used in run headers
    pub fn describe(self) -> &'static str {
        match self {
            Workload::UniformSmall => "64-byte allocations",
            Workload::MixedSize => "mixed-size (32-4096 bytes) allocations",
        }
    }
}

impl FromStr for Workload {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Workload::UniformSmall),
            "mixed" => Ok(Workload::MixedSize),
            other => Err(HarnessError::UnknownWorkload(other.to_string())),
        }
    }
}

impl std::fmt::Display for Workload {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Workload::UniformSmall => write!(f, "small"),
            Workload::MixedSize => write!(f, "mixed"),
        }
    }
}

impl FromStr for Backend {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tlsf" => Ok(Backend::Tlsf),
            "baseline" => Ok(Backend::Baseline),
            other => Err(HarnessError::UnknownBackend(other.to_string())),
        }
    }
}
