/*!
 * Benchmark Harness
 * Drives a workload through a control channel and times the full cycle
 *
 * A run allocates every size in order, recording a null pointer for each
 * failure, then frees the non-null pointers in the order they were recorded.
 * Failures never retry and never abort the remaining iterations.
 */

use super::types::{AllocationFailure, BenchReport, HarnessResult};
use super::workload::Workload;
use crate::control::{AllocRequest, Backend, ControlChannel};
use crate::core::limits::{BENCH_ITERATIONS, DEFAULT_BENCH_SEED};
use crate::core::types::{Address, Size, NULL_ADDRESS};
use crate::monitoring::OperationSpan;
use std::time::Instant;
use tracing::{debug, info};

/// Pointers recorded by an allocate phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationPhase {
    /// One slot per iteration; `NULL_ADDRESS` where the allocation failed
    pub pointers: Vec<Address>,
    pub failed: usize,
    pub first_failure: Option<AllocationFailure>,
}

impl AllocationPhase {
    pub fn succeeded(&self) -> usize {
        self.pointers.len() - self.failed
    }

    /// Non-null pointers in recorded order
    pub fn live(&self) -> impl Iterator<Item = Address> + '_ {
        self.pointers.iter().copied().filter(|&p| p != NULL_ADDRESS)
    }
}

/// Workload driver over any control channel
pub struct Harness<C: ControlChannel> {
    channel: C,
    iterations: usize,
    seed: u64,
}

impl<C: ControlChannel> Harness<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            iterations: BENCH_ITERATIONS,
            seed: DEFAULT_BENCH_SEED,
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Sizes the given workload will request
    pub fn sizes(&self, workload: Workload) -> Vec<Size> {
        workload.sizes(self.iterations, self.seed)
    }

    /// Allocate each size in order, recording a null slot per failure
    pub fn allocate_phase(&self, backend: Backend, sizes: &[Size]) -> HarnessResult<AllocationPhase> {
        let command = backend.alloc_command();
        let mut phase = AllocationPhase {
            pointers: Vec::with_capacity(sizes.len()),
            ..Default::default()
        };

        for (iteration, &size) in sizes.iter().enumerate() {
            let (response, status) = self.channel.call(command, AllocRequest::allocate(size))?;
            if status.is_success() && !response.is_null() {
                phase.pointers.push(response.pointer);
            } else {
                phase.pointers.push(NULL_ADDRESS);
                phase.failed += 1;
                if phase.first_failure.is_none() {
                    debug!(iteration, size, %status, "allocation failed");
                    phase.first_failure = Some(AllocationFailure {
                        iteration,
                        size,
                        status,
                    });
                }
            }
        }
        Ok(phase)
    }

    /// Free every non-null pointer in recorded order, returning rejected frees
    pub fn free_phase(&self, backend: Backend, phase: &AllocationPhase) -> HarnessResult<usize> {
        let command = backend.free_command();
        let mut rejected = 0;
        for pointer in phase.live() {
            let (_, status) = self.channel.call(command, AllocRequest::free(pointer))?;
            if !status.is_success() {
                rejected += 1;
            }
        }
        Ok(rejected)
    }

    /// Run one workload against one backend
    pub fn run(&self, workload: Workload, backend: Backend) -> HarnessResult<BenchReport> {
        let sizes = self.sizes(workload);
        let span = OperationSpan::new("bench_run");
        info!(
            workload = %workload,
            backend = %backend,
            transport = self.channel.transport(),
            iterations = self.iterations,
            trace_id = span.trace_id(),
            "running {}",
            workload.describe()
        );

        let start = Instant::now();
        let phase = self.allocate_phase(backend, &sizes)?;
        let free_failures = self.free_phase(backend, &phase)?;
        let elapsed = start.elapsed();

        span.record_items_processed(sizes.len());
        span.record_result(phase.failed == 0 && free_failures == 0);

        Ok(BenchReport {
            workload,
            backend,
            transport: self.channel.transport().to_string(),
            iterations: self.iterations,
            succeeded: phase.succeeded(),
            failed: phase.failed,
            first_failure: phase.first_failure,
            free_failures,
            elapsed_us: elapsed.as_micros() as u64,
        })
    }
}
