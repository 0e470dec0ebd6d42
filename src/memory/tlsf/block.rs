/*!
 * Block Headers
 *
 * Every block starts with a 32-byte header stored in the arena itself:
 *
 * ```text
 * +0   tag       BLOCK_MAGIC << 32 | flags
 * +8   size      payload bytes, header excluded
 * +16  prev     offset of the physically previous block (NO_BLOCK if first)
 * +24  seal     SEAL_KEY ^ offset ^ size.rotate_left(32)
 * +32  payload  (free blocks keep their free-list links here)
 * ```
 *
 * The tag and the offset-bound seal together form the validity tag: a header
 * only decodes if both match, so a forged or stale address is rejected
 * instead of being trusted.
 */

use super::arena::Arena;
use crate::core::limits::BLOCK_HEADER_SIZE;

const BLOCK_MAGIC: u64 = 0x7A5F_B10C;
const SEAL_KEY: u64 = 0x9E37_79B9_7F4A_7C15;
const FLAG_FREE: u64 = 1;

/// Sentinel for absent offsets in header and link words
pub(super) const NO_BLOCK: u64 = u64::MAX;

const TAG: usize = 0;
const SIZE: usize = 8;
const PREV: usize = 16;
const SEAL: usize = 24;

/// Decoded block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct BlockHeader {
    pub size: usize,
    pub is_free: bool,
    pub prev_phys: Option<usize>,
}

impl BlockHeader {
    pub fn free(size: usize, prev_phys: Option<usize>) -> Self {
        Self {
            size,
            is_free: true,
            prev_phys,
        }
    }

    /// Decode the header at `offset`, rejecting anything without a valid tag
    pub fn read(arena: &Arena, offset: usize) -> Option<Self> {
        if offset + BLOCK_HEADER_SIZE > arena.len() {
            return None;
        }

        let tag = arena.read_u64(offset + TAG);
        if tag >> 32 != BLOCK_MAGIC || tag & !FLAG_FREE & 0xFFFF_FFFF != 0 {
            return None;
        }

        let size = arena.read_u64(offset + SIZE);
        if arena.read_u64(offset + SEAL) != seal(offset, size) {
            return None;
        }

        let prev = arena.read_u64(offset + PREV);
        Some(Self {
            size: usize::try_from(size).ok()?,
            is_free: tag & FLAG_FREE != 0,
            prev_phys: decode_offset(prev),
        })
    }

    pub fn write(&self, arena: &mut Arena, offset: usize) {
        let flags = if self.is_free { FLAG_FREE } else { 0 };
        let size = self.size as u64;
        arena.write_u64(offset + TAG, BLOCK_MAGIC << 32 | flags);
        arena.write_u64(offset + SIZE, size);
        arena.write_u64(offset + PREV, encode_offset(self.prev_phys));
        arena.write_u64(offset + SEAL, seal(offset, size));
    }

    /// Erase a header absorbed by a merge so it can never validate again
    pub fn clear(arena: &mut Arena, offset: usize) {
        arena.zero(offset, BLOCK_HEADER_SIZE);
    }
}

/// Offset of the payload of the block at `offset`
#[inline]
pub(super) fn payload_offset(offset: usize) -> usize {
    offset + BLOCK_HEADER_SIZE
}

/// Offset just past the block at `offset`
#[inline]
pub(super) fn block_end(offset: usize, size: usize) -> usize {
    offset + BLOCK_HEADER_SIZE + size
}

#[inline]
pub(super) fn encode_offset(offset: Option<usize>) -> u64 {
    offset.map_or(NO_BLOCK, |o| o as u64)
}

#[inline]
pub(super) fn decode_offset(raw: u64) -> Option<usize> {
    if raw == NO_BLOCK {
        None
    } else {
        usize::try_from(raw).ok()
    }
}

#[inline]
fn seal(offset: usize, size: u64) -> u64 {
    SEAL_KEY ^ offset as u64 ^ size.rotate_left(32)
}
