/*!
 * Arena
 * Owned, zeroed, aligned byte region addressed by offset
 */

use crate::core::limits::ALIGNMENT;
use crate::core::types::Address;

/// Fixed-size byte region owned by one engine
///
/// The backing buffer is over-allocated by up to `ALIGNMENT - 1` bytes so the
/// arena itself can start on an aligned address. The buffer is never resized,
/// so addresses derived from it stay valid for the arena's lifetime.
pub(super) struct Arena {
    buf: Vec<u8>,
    start: usize,
    len: usize,
}

impl Arena {
    pub fn new(len: usize) -> Self {
        let buf = vec![0u8; len + ALIGNMENT - 1];
        let misalignment = buf.as_ptr() as usize % ALIGNMENT;
        let start = (ALIGNMENT - misalignment) % ALIGNMENT;
        Self { buf, start, len }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Address of offset 0
    #[inline]
    pub fn base(&self) -> Address {
        self.buf.as_ptr() as usize + self.start
    }

    #[inline]
    pub fn address_of(&self, offset: usize) -> Address {
        self.base() + offset
    }

    /// Offset of an address, if it lies inside the arena
    #[inline]
    pub fn offset_of(&self, address: Address) -> Option<usize> {
        address
            .checked_sub(self.base())
            .filter(|offset| *offset < self.len)
    }

    #[inline]
    pub fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        &self.buf[self.start + offset..self.start + offset + len]
    }

    #[inline]
    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.buf[self.start + offset..self.start + offset + len]
    }

    #[inline]
    pub fn read_u64(&self, offset: usize) -> u64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.bytes(offset, 8));
        u64::from_le_bytes(raw)
    }

    #[inline]
    pub fn write_u64(&mut self, offset: usize, value: u64) {
        self.bytes_mut(offset, 8).copy_from_slice(&value.to_le_bytes());
    }

    pub fn zero(&mut self, offset: usize, len: usize) {
        self.bytes_mut(offset, len).fill(0);
    }
}
