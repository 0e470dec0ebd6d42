/*!
 * Limits and Constants
 *
 * Centralized location for the engine geometry, the control boundary
 * parameters and the benchmark workload shapes.
 *
 * - Performance-critical constants are marked with [PERF]
 * - Layout-critical constants are marked with [LAYOUT]
 */

// =============================================================================
// ARENA
// =============================================================================

/// Arena size used by the control boundary (16 MiB)
pub const DEFAULT_ARENA_SIZE: usize = 16 * 1024 * 1024;

/// Payload alignment guaranteed by the engine
/// [LAYOUT] Every block header and payload starts on this boundary
pub const ALIGNMENT: usize = 16;
pub const ALIGNMENT_LOG2: u32 = ALIGNMENT.trailing_zeros();

/// Block header size
/// [LAYOUT] Multiple of `ALIGNMENT` so payloads stay aligned
pub const BLOCK_HEADER_SIZE: usize = 32;

/// Smallest payload a block may carry
/// [LAYOUT] A free block keeps its two free-list links in its payload
pub const MIN_BLOCK_PAYLOAD: usize = 16;

/// Smallest arena that can hold one block
pub const MIN_ARENA_SIZE: usize = BLOCK_HEADER_SIZE + MIN_BLOCK_PAYLOAD;

// =============================================================================
// SIZE CLASSES
// =============================================================================

/// log2 of the number of second-level slots per first-level row
/// [PERF] 16 slots bound internal fragmentation to 1/16 of the request
pub const SL_INDEX_COUNT_LOG2: u32 = 4;
pub const SL_INDEX_COUNT: usize = 1 << SL_INDEX_COUNT_LOG2;

/// Sizes below `1 << FL_INDEX_SHIFT` all live in first-level row 0,
/// split linearly into `ALIGNMENT`-wide slots
pub const FL_INDEX_SHIFT: u32 = SL_INDEX_COUNT_LOG2 + ALIGNMENT_LOG2;
pub const SMALL_BLOCK_SIZE: usize = 1 << FL_INDEX_SHIFT;

/// Largest power of two a block size may reach
pub const FL_INDEX_MAX: u32 = 32;
pub const FL_INDEX_COUNT: usize = (FL_INDEX_MAX - FL_INDEX_SHIFT + 1) as usize;

/// Largest arena an engine accepts
pub const MAX_ARENA_SIZE: usize = (1usize << FL_INDEX_MAX) - 1;

// =============================================================================
// MEMORY PRESSURE
// =============================================================================

/// Usage ratio reported as medium pressure
pub const PRESSURE_MEDIUM: f64 = 0.60;

/// Usage ratio reported as high pressure
pub const PRESSURE_HIGH: f64 = 0.80;

/// Usage ratio reported as critical pressure
pub const PRESSURE_CRITICAL: f64 = 0.95;

// =============================================================================
// BENCHMARK WORKLOADS
// =============================================================================

/// Iterations per workload run
pub const BENCH_ITERATIONS: usize = 10_000;

/// Request size of the uniform-small workload
pub const UNIFORM_SMALL_SIZE: usize = 64;

/// Inclusive bounds of the mixed-size workload
pub const MIXED_SIZE_MIN: usize = 32;
pub const MIXED_SIZE_MAX: usize = 4096;

/// Seed used for the mixed-size workload unless overridden
pub const DEFAULT_BENCH_SEED: u64 = 0x7153_F00D;
