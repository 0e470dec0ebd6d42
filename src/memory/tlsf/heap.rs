/*!
 * TLSF Heap
 * Allocation and deallocation over one arena (callers hold the engine lock)
 */

use super::arena::Arena;
use super::block::{block_end, payload_offset, BlockHeader};
use super::free_list::SegregatedFreeList;
use super::mapping::adjust_request_size;
use crate::core::limits::{
    ALIGNMENT, BLOCK_HEADER_SIZE, MAX_ARENA_SIZE, MIN_ARENA_SIZE, MIN_BLOCK_PAYLOAD,
};
use crate::core::types::{Address, Size};
use crate::memory::types::{MemoryError, MemoryPressure, MemoryResult};
use tracing::{debug, warn};

/// Mutable engine state: the arena, its free lists and running counters
pub(super) struct TlsfHeap {
    pub(super) arena: Arena,
    pub(super) free_list: SegregatedFreeList,
    /// Bytes held by live blocks, headers included
    pub(super) used_bytes: usize,
    pub(super) live_blocks: usize,
    pub(super) free_blocks: usize,
    pressure: MemoryPressure,
}

impl TlsfHeap {
    /// Lay out a fresh arena as one free block spanning all of it
    pub fn new(arena_bytes: usize) -> MemoryResult<Self> {
        if arena_bytes < MIN_ARENA_SIZE {
            return Err(MemoryError::ArenaTooSmall {
                requested: arena_bytes,
                minimum: MIN_ARENA_SIZE,
            });
        }
        if arena_bytes > MAX_ARENA_SIZE {
            return Err(MemoryError::ArenaTooLarge {
                requested: arena_bytes,
                maximum: MAX_ARENA_SIZE,
            });
        }

        let mut heap = Self {
            arena: Arena::new(arena_bytes),
            free_list: SegregatedFreeList::new(),
            used_bytes: 0,
            live_blocks: 0,
            free_blocks: 1,
            pressure: MemoryPressure::Low,
        };

        let size = arena_bytes - BLOCK_HEADER_SIZE;
        BlockHeader::free(size, None).write(&mut heap.arena, 0);
        heap.free_list.insert(&mut heap.arena, 0, size);

        Ok(heap)
    }

    #[inline]
    pub fn arena_size(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn free_bytes(&self) -> usize {
        self.arena.len() - self.used_bytes
    }

    /// Read a header the engine itself wrote
    #[inline]
    pub(super) fn header(&self, offset: usize) -> BlockHeader {
        let header = BlockHeader::read(&self.arena, offset);
        debug_assert!(header.is_some(), "corrupt header at offset {offset}");
        header.unwrap_or_else(|| BlockHeader::free(0, None))
    }

    /// Offset of the block physically after the one at `offset`, if any
    #[inline]
    pub(super) fn next_phys(&self, offset: usize, size: usize) -> Option<usize> {
        let end = block_end(offset, size);
        (end < self.arena.len()).then_some(end)
    }

    fn set_prev_phys(&mut self, offset: usize, prev: usize) {
        let mut header = self.header(offset);
        header.prev_phys = Some(prev);
        header.write(&mut self.arena, offset);
    }

    /// Allocate at least `size` bytes, aligned to `ALIGNMENT`
    pub fn allocate(&mut self, size: Size) -> MemoryResult<Address> {
        let out_of_memory = |heap: &Self| MemoryError::OutOfMemory {
            requested: size,
            available: heap.free_bytes(),
        };

        let request = adjust_request_size(size).ok_or_else(|| out_of_memory(self))?;
        let bucket = self
            .free_list
            .find_suitable(request)
            .ok_or_else(|| out_of_memory(self))?;
        let offset = self
            .free_list
            .pop(&mut self.arena, bucket)
            .ok_or_else(|| out_of_memory(self))?;

        let mut header = self.header(offset);
        debug_assert!(header.is_free && header.size >= request);
        self.free_blocks -= 1;

        // Split off the tail when it can stand as a block of its own
        if header.size >= request + BLOCK_HEADER_SIZE + MIN_BLOCK_PAYLOAD {
            let rest = block_end(offset, request);
            let rest_size = header.size - request - BLOCK_HEADER_SIZE;

            BlockHeader::free(rest_size, Some(offset)).write(&mut self.arena, rest);
            if let Some(next) = self.next_phys(rest, rest_size) {
                self.set_prev_phys(next, rest);
            }
            self.free_list.insert(&mut self.arena, rest, rest_size);
            self.free_blocks += 1;

            header.size = request;
        }

        header.is_free = false;
        header.write(&mut self.arena, offset);

        self.used_bytes += BLOCK_HEADER_SIZE + header.size;
        self.live_blocks += 1;
        self.update_pressure();

        Ok(self.arena.address_of(payload_offset(offset)))
    }

    /// Free a live allocation, merging it with free physical neighbours
    pub fn free(&mut self, address: Address) -> MemoryResult<()> {
        let mut offset = self.live_block(address)?;
        let mut header = self.header(offset);
        let released = BLOCK_HEADER_SIZE + header.size;
        header.is_free = true;

        // Absorb the next block
        if let Some(next) = self.next_phys(offset, header.size) {
            let next_header = self.header(next);
            if next_header.is_free {
                self.free_list.remove(&mut self.arena, next, next_header.size);
                BlockHeader::clear(&mut self.arena, next);
                header.size += BLOCK_HEADER_SIZE + next_header.size;
                self.free_blocks -= 1;
            }
        }

        // Fold into the previous block
        if let Some(prev) = header.prev_phys {
            let prev_header = self.header(prev);
            if prev_header.is_free {
                self.free_list.remove(&mut self.arena, prev, prev_header.size);
                BlockHeader::clear(&mut self.arena, offset);
                header = BlockHeader::free(
                    prev_header.size + BLOCK_HEADER_SIZE + header.size,
                    prev_header.prev_phys,
                );
                offset = prev;
                self.free_blocks -= 1;
            }
        }

        header.write(&mut self.arena, offset);
        if let Some(next) = self.next_phys(offset, header.size) {
            self.set_prev_phys(next, offset);
        }
        self.free_list.insert(&mut self.arena, offset, header.size);
        self.free_blocks += 1;

        self.used_bytes -= released;
        self.live_blocks -= 1;
        self.update_pressure();

        Ok(())
    }

    /// Payload bytes of a live allocation
    pub fn usable_size(&self, address: Address) -> MemoryResult<Size> {
        let offset = self.live_block(address)?;
        Ok(self.header(offset).size)
    }

    /// Resolve `address` to the header offset of a live block, or reject it
    pub(super) fn live_block(&self, address: Address) -> MemoryResult<usize> {
        let invalid = MemoryError::InvalidPointer(address);

        let payload = self.arena.offset_of(address).ok_or(invalid.clone())?;
        if payload < BLOCK_HEADER_SIZE || payload % ALIGNMENT != 0 {
            return Err(invalid);
        }

        let offset = payload - BLOCK_HEADER_SIZE;
        match BlockHeader::read(&self.arena, offset) {
            Some(header)
                if !header.is_free && block_end(offset, header.size) <= self.arena.len() =>
            {
                Ok(offset)
            }
            Some(_) => {
                debug!(address, "address names a free block");
                Err(invalid)
            }
            None => Err(invalid),
        }
    }

    fn update_pressure(&mut self) {
        let level = MemoryPressure::from_ratio(self.used_bytes as f64 / self.arena.len() as f64);
        if level > self.pressure {
            match level {
                MemoryPressure::High | MemoryPressure::Critical => warn!(
                    pressure = %level,
                    used = self.used_bytes,
                    total = self.arena.len(),
                    "arena memory pressure rising"
                ),
                _ => debug!(
                    pressure = %level,
                    used = self.used_bytes,
                    total = self.arena.len(),
                    "arena memory pressure rising"
                ),
            }
        }
        self.pressure = level;
    }
}
