/*!
 * Baseline Comparator
 *
 * Pass-through to the host's general-purpose allocator, used as the
 * performance reference for the TLSF engine. It adds no size classes, no
 * arena and no policy of its own.
 *
 * Rust's host allocator needs each buffer's layout to release it, so live
 * buffers are kept by address. That makes a free of an unknown or
 * already-released address a reported `InvalidPointer` rather than undefined
 * behaviour.
 */

use super::traits::Allocator;
use super::types::{MemoryError, MemoryResult};
use crate::core::types::{Address, Size};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace, warn};

/// Host-allocator backend
pub struct BaselineAllocator {
    live: DashMap<Address, Vec<u8>, RandomState>,
    live_bytes: AtomicUsize,
}

impl BaselineAllocator {
    pub fn new() -> Self {
        Self {
            live: DashMap::with_hasher(RandomState::new()),
            live_bytes: AtomicUsize::new(0),
        }
    }

    /// Allocate `size` bytes from the host allocator
    pub fn allocate(&self, size: Size) -> MemoryResult<Address> {
        // Zero-size requests still get a distinct address
        let capacity = size.max(1);
        let mut buffer = Vec::new();
        if buffer.try_reserve_exact(capacity).is_err() {
            debug!(size, "baseline allocate failed");
            return Err(MemoryError::OutOfMemory {
                requested: size,
                available: 0,
            });
        }

        let address = buffer.as_ptr() as Address;
        self.live_bytes.fetch_add(buffer.capacity(), Ordering::Relaxed);
        self.live.insert(address, buffer);
        trace!(size, address, "baseline allocate");
        Ok(address)
    }

    /// Return a buffer to the host allocator
    pub fn free(&self, address: Address) -> MemoryResult<()> {
        match self.live.remove(&address) {
            Some((_, buffer)) => {
                self.live_bytes.fetch_sub(buffer.capacity(), Ordering::Relaxed);
                trace!(address, "baseline free");
                Ok(())
            }
            None => {
                warn!(address, "baseline free rejected: unknown address");
                Err(MemoryError::InvalidPointer(address))
            }
        }
    }

    /// Number of buffers currently on loan
    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    /// Bytes currently on loan
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Relaxed)
    }
}

impl Allocator for BaselineAllocator {
    fn allocate(&self, size: Size) -> MemoryResult<Address> {
        BaselineAllocator::allocate(self, size)
    }

    fn deallocate(&self, address: Address) -> MemoryResult<()> {
        BaselineAllocator::free(self, address)
    }

    fn name(&self) -> &'static str {
        "baseline"
    }
}

impl Default for BaselineAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BaselineAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaselineAllocator")
            .field("live_allocations", &self.live_allocations())
            .field("live_bytes", &self.live_bytes())
            .finish()
    }
}
