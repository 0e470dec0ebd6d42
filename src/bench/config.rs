/*!
 * Benchmark Configuration
 * Driver knobs read from the environment
 *
 * Environment variables:
 * - ALLOC_BENCH_SEED: u64 seed for the mixed-size workload (decimal or 0x-hex)
 * - ALLOC_BENCH_TRANSPORT: `direct` | `frame` (default: direct)
 * - ALLOC_BENCH_JSON: emit the report as JSON when `1` or `true`
 *
 * The iteration count and arena size are fixed and deliberately absent here.
 */

use crate::core::limits::DEFAULT_BENCH_SEED;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How the driver reaches the dispatcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// In-process calls
    #[default]
    Direct,
    /// Encoded frames through the codec
    Frame,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Transport::Direct => write!(f, "direct"),
            Transport::Frame => write!(f, "frame"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub seed: u64,
    pub transport: Transport,
    pub json_report: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_BENCH_SEED,
            transport: Transport::Direct,
            json_report: false,
        }
    }
}

impl BenchConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`
    ///
    /// Unparseable values fall back to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("ALLOC_BENCH_SEED") {
            match parse_seed(&raw) {
                Some(seed) => config.seed = seed,
                None => warn!(value = %raw, "ignoring unparseable ALLOC_BENCH_SEED"),
            }
        }

        if let Some(raw) = lookup("ALLOC_BENCH_TRANSPORT") {
            match raw.as_str() {
                "direct" => config.transport = Transport::Direct,
                "frame" => config.transport = Transport::Frame,
                _ => warn!(value = %raw, "ignoring unknown ALLOC_BENCH_TRANSPORT"),
            }
        }

        config.json_report = lookup("ALLOC_BENCH_JSON")
            .map(|v| v == "1" || v == "true")
            .unwrap_or(false);

        config
    }
}

fn parse_seed(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}
