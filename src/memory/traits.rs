/*!
 * Memory Traits
 * The two-operation allocator contract shared by every backend
 */

use super::types::*;
use crate::core::types::{Address, Size};

/// Memory allocator interface
///
/// Both the TLSF engine and the baseline comparator implement this, which is
/// what lets the dispatcher and the harness treat them interchangeably.
pub trait Allocator: Send + Sync {
    /// Allocate at least `size` usable bytes
    fn allocate(&self, size: Size) -> MemoryResult<Address>;

    /// Release an address previously returned by `allocate`
    fn deallocate(&self, address: Address) -> MemoryResult<()>;

    /// Short backend name for logs and reports
    fn name(&self) -> &'static str;
}

/// Memory statistics provider
pub trait MemoryInfo: Send + Sync {
    /// Get overall memory statistics
    fn stats(&self) -> MemoryStats;

    /// Get memory info as (total, used, available)
    fn info(&self) -> (Size, Size, Size) {
        let stats = self.stats();
        (
            stats.total_memory,
            stats.used_memory,
            stats.available_memory,
        )
    }

    /// Get memory pressure level
    fn pressure(&self) -> MemoryPressure {
        self.stats().memory_pressure()
    }
}
