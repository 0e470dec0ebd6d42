/*!
 * Benchmark Harness
 * Workload shapes, run configuration and reports for comparing backends
 */

pub mod config;
pub mod harness;
pub mod types;
pub mod workload;

pub use config::{BenchConfig, Transport};
pub use harness::{AllocationPhase, Harness};
pub use types::{AllocationFailure, BenchReport, HarnessError, HarnessResult};
pub use workload::Workload;
