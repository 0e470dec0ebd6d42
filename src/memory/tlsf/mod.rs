/*!
 * TLSF Allocator Engine
 *
 * Two-level segregated-fit allocator over one fixed, zeroed arena.
 *
 * ## Layout
 *
 * The arena is a partition of physically adjacent blocks. Each block carries
 * a 32-byte header (validity tag, free flag, payload size, offset of the
 * previous physical block, offset-bound seal) followed by its payload. All
 * internal bookkeeping addresses blocks by arena offset; only the payload
 * address returned from [`TlsfAllocator::allocate`] leaves the engine.
 *
 * ## Allocation
 *
 * - **Lookup**: the request is rounded up to the next size class and the
 *   first/second-level bitmaps locate a non-empty bucket with two bit scans,
 *   O(1) with no search over size classes
 * - **Split**: the tail of an oversized block is returned to its own bucket
 * - **Coalesce**: a freed block merges with its free physical neighbours
 *   (at most one on each side), so no two adjacent blocks are ever free
 *
 * ## Concurrency
 *
 * Each engine owns a single mutex held for the whole of every
 * `allocate`/`free`. Both operations are bounded-time and never block inside
 * the critical section.
 */

mod arena;
mod block;
mod free_list;
mod heap;
mod integrity;
mod mapping;

pub use integrity::{IntegrityError, IntegrityReport};

use super::traits::{Allocator, MemoryInfo};
use super::types::{BlockInfo, MemoryResult, MemoryStats};
use crate::core::limits::{ALIGNMENT, DEFAULT_ARENA_SIZE};
use crate::core::types::{Address, Size};
use heap::TlsfHeap;
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

/// TLSF allocator engine
///
/// # Performance
/// - Cache-line aligned so the lock word does not share a line with neighbours
#[repr(C, align(64))]
pub struct TlsfAllocator {
    heap: Mutex<TlsfHeap>,
}

impl TlsfAllocator {
    /// Payload alignment of every returned address
    pub const ALIGNMENT: usize = ALIGNMENT;

    /// Create an engine over the default 16 MiB arena
    pub fn new() -> MemoryResult<Self> {
        Self::with_capacity(DEFAULT_ARENA_SIZE)
    }

    /// Create an engine over an arena of exactly `arena_bytes` bytes
    pub fn with_capacity(arena_bytes: Size) -> MemoryResult<Self> {
        let heap = TlsfHeap::new(arena_bytes)?;
        info!(
            arena_bytes,
            alignment = ALIGNMENT,
            "TLSF engine initialized with one free block spanning the arena"
        );
        Ok(Self {
            heap: Mutex::new(heap),
        })
    }

    /// Allocate at least `size` bytes
    pub fn allocate(&self, size: Size) -> MemoryResult<Address> {
        let result = self.heap.lock().allocate(size);
        match &result {
            Ok(address) => trace!(size, address, "tlsf allocate"),
            Err(e) => debug!(size, error = %e, "tlsf allocate failed"),
        }
        result
    }

    /// Release a live allocation
    pub fn free(&self, address: Address) -> MemoryResult<()> {
        let result = self.heap.lock().free(address);
        match &result {
            Ok(()) => trace!(address, "tlsf free"),
            Err(e) => warn!(address, error = %e, "tlsf free rejected"),
        }
        result
    }

    /// Payload bytes available at a live allocation
    pub fn usable_size(&self, address: Address) -> MemoryResult<Size> {
        self.heap.lock().usable_size(address)
    }

    /// Whether `address` is currently a live allocation of this engine
    pub fn is_live(&self, address: Address) -> bool {
        self.heap.lock().live_block(address).is_ok()
    }

    pub fn arena_size(&self) -> Size {
        self.heap.lock().arena_size()
    }

    /// Bytes in free blocks, headers included
    pub fn free_bytes(&self) -> Size {
        self.heap.lock().free_bytes()
    }

    /// Physical walk of the arena
    pub fn blocks(&self) -> Vec<BlockInfo> {
        self.heap.lock().blocks()
    }

    /// Verify every engine invariant
    pub fn check_integrity(&self) -> Result<IntegrityReport, IntegrityError> {
        self.heap.lock().check_integrity()
    }

    /// Tear the engine down, invalidating every outstanding address
    pub fn destroy(self) -> MemoryStats {
        let stats = self.stats();
        if stats.allocated_blocks > 0 {
            warn!(
                outstanding = stats.allocated_blocks,
                bytes = stats.used_memory,
                "TLSF engine destroyed with live allocations"
            );
        } else {
            info!(arena_bytes = stats.total_memory, "TLSF engine destroyed");
        }
        stats
    }
}

impl Allocator for TlsfAllocator {
    fn allocate(&self, size: Size) -> MemoryResult<Address> {
        TlsfAllocator::allocate(self, size)
    }

    fn deallocate(&self, address: Address) -> MemoryResult<()> {
        TlsfAllocator::free(self, address)
    }

    fn name(&self) -> &'static str {
        "tlsf"
    }
}

impl MemoryInfo for TlsfAllocator {
    fn stats(&self) -> MemoryStats {
        let heap = self.heap.lock();
        let total = heap.arena_size();
        let largest_free_block = heap
            .blocks()
            .iter()
            .filter(|b| b.is_free)
            .map(|b| b.size)
            .max()
            .unwrap_or(0);

        MemoryStats {
            total_memory: total,
            used_memory: heap.used_bytes,
            available_memory: heap.free_bytes(),
            usage_percentage: heap.used_bytes as f64 / total as f64 * 100.0,
            allocated_blocks: heap.live_blocks,
            free_blocks: heap.free_blocks,
            largest_free_block,
        }
    }
}

impl std::fmt::Debug for TlsfAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let heap = self.heap.lock();
        f.debug_struct("TlsfAllocator")
            .field("arena_bytes", &heap.arena_size())
            .field("used_bytes", &heap.used_bytes)
            .field("live_blocks", &heap.live_blocks)
            .field("free_blocks", &heap.free_blocks)
            .finish()
    }
}
