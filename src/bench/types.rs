/*!
 * Benchmark Types
 * Run reports and harness errors
 */

use super::workload::Workload;
use crate::control::{Backend, ControlError, Status};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Harness errors
///
/// Per-iteration allocation failures are not errors; they are counted in the
/// report. Only an unreachable control boundary ends a run.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("Unknown workload: {0}")]
    #[diagnostic(code(bench::unknown_workload), help("Expected `small` or `mixed`"))]
    UnknownWorkload(String),

    #[error("Unknown backend: {0}")]
    #[diagnostic(code(bench::unknown_backend), help("Expected `tlsf` or `baseline`"))]
    UnknownBackend(String),

    #[error("Control boundary unreachable: {0}")]
    #[diagnostic(code(bench::channel))]
    Channel(#[from] ControlError),
}

/// First allocation that failed during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationFailure {
    pub iteration: usize,
    pub size: usize,
    pub status: Status,
}

/// Outcome of one workload run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchReport {
    pub workload: Workload,
    pub backend: Backend,
    pub transport: String,
    pub iterations: usize,
    /// Allocations that returned a pointer
    pub succeeded: usize,
    /// Allocations recorded as null
    pub failed: usize,
    pub first_failure: Option<AllocationFailure>,
    /// Frees the backend rejected
    pub free_failures: usize,
    /// Wall time of the full allocate-then-free cycle
    pub elapsed_us: u64,
}

impl BenchReport {
    #[inline]
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.free_failures == 0
    }
}

impl std::fmt::Display for BenchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "--- {} x {} on {} ({} transport) ---",
            self.iterations, self.workload, self.backend, self.transport
        )?;
        if let Some(failure) = &self.first_failure {
            writeln!(
                f,
                "Allocation failed at iteration {} (size {}): {}",
                failure.iteration, failure.size, failure.status
            )?;
            writeln!(f, "Failed allocations: {}", self.failed)?;
        }
        if self.free_failures > 0 {
            writeln!(f, "Rejected frees: {}", self.free_failures)?;
        }
        write!(f, "Total time: {} microseconds", self.elapsed_us)
    }
}
