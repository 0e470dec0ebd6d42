/*!
 * TLSF Arena
 *
 * Fixed-arena two-level segregated-fit allocator behind a synchronous
 * request/response control boundary, with a baseline comparator and a
 * benchmark harness that drives both under identical workloads.
 */

pub mod bench;
pub mod control;
pub mod core;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use bench::{BenchConfig, BenchReport, Harness, HarnessError, Transport, Workload};
pub use control::{
    AllocRequest, Backend, ControlChannel, ControlError, Dispatcher, FrameChannel, Status,
};
pub use crate::core::types::{Address, Size, NULL_ADDRESS};
pub use memory::{
    Allocator, BaselineAllocator, MemoryError, MemoryInfo, MemoryResult, MemoryStats,
    TlsfAllocator,
};
pub use monitoring::{init_tracing, OperationSpan};
