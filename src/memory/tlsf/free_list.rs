/*!
 * Segregated Free List
 *
 * Two-level table of intrusive, doubly linked free lists. The links live in
 * the payload of each free block (`next` at +0, `prev` at +8), so the table
 * itself only holds list heads and the two bitmaps used for O(1) lookup.
 */

use super::arena::Arena;
use super::block::{decode_offset, encode_offset, payload_offset};
use super::mapping::{mapping_insert, mapping_search, Bucket};
use crate::core::limits::{FL_INDEX_COUNT, SL_INDEX_COUNT};

const NEXT_FREE: usize = 0;
const PREV_FREE: usize = 8;

#[inline]
pub(super) fn next_free(arena: &Arena, offset: usize) -> Option<usize> {
    decode_offset(arena.read_u64(payload_offset(offset) + NEXT_FREE))
}

#[inline]
pub(super) fn prev_free(arena: &Arena, offset: usize) -> Option<usize> {
    decode_offset(arena.read_u64(payload_offset(offset) + PREV_FREE))
}

#[inline]
fn set_next_free(arena: &mut Arena, offset: usize, next: Option<usize>) {
    arena.write_u64(payload_offset(offset) + NEXT_FREE, encode_offset(next));
}

#[inline]
fn set_prev_free(arena: &mut Arena, offset: usize, prev: Option<usize>) {
    arena.write_u64(payload_offset(offset) + PREV_FREE, encode_offset(prev));
}

/// Free-list heads plus the bitmaps summarising which lists are non-empty
#[derive(Debug)]
pub(super) struct SegregatedFreeList {
    /// Bit `fl` set iff row `fl` has at least one non-empty slot
    fl_bitmap: u32,
    /// Bit `sl` of row `fl` set iff bucket `(fl, sl)` is non-empty
    sl_bitmap: [u32; FL_INDEX_COUNT],
    heads: [[Option<usize>; SL_INDEX_COUNT]; FL_INDEX_COUNT],
}

impl SegregatedFreeList {
    pub fn new() -> Self {
        Self {
            fl_bitmap: 0,
            sl_bitmap: [0; FL_INDEX_COUNT],
            heads: [[None; SL_INDEX_COUNT]; FL_INDEX_COUNT],
        }
    }

    /// Push the free block at `offset` onto the head of its bucket
    pub fn insert(&mut self, arena: &mut Arena, offset: usize, size: usize) {
        let (fl, sl) = mapping_insert(size);
        let old_head = self.heads[fl][sl];

        set_next_free(arena, offset, old_head);
        set_prev_free(arena, offset, None);
        if let Some(head) = old_head {
            set_prev_free(arena, head, Some(offset));
        }

        self.heads[fl][sl] = Some(offset);
        self.fl_bitmap |= 1 << fl;
        self.sl_bitmap[fl] |= 1 << sl;
    }

    /// Unlink the free block at `offset`, which must currently be filed under `size`
    pub fn remove(&mut self, arena: &mut Arena, offset: usize, size: usize) {
        let (fl, sl) = mapping_insert(size);
        let next = next_free(arena, offset);
        let prev = prev_free(arena, offset);

        if let Some(next) = next {
            set_prev_free(arena, next, prev);
        }

        match prev {
            Some(prev) => set_next_free(arena, prev, next),
            None => {
                debug_assert_eq!(self.heads[fl][sl], Some(offset));
                self.heads[fl][sl] = next;
                if next.is_none() {
                    self.mark_empty((fl, sl));
                }
            }
        }
    }

    /// Locate a non-empty bucket whose blocks all hold at least `size` bytes
    pub fn find_suitable(&self, size: usize) -> Option<Bucket> {
        let (fl, sl) = mapping_search(size)?;

        // Remaining slots of the same row first
        let sl_map = self.sl_bitmap[fl] & (u32::MAX << sl);
        if sl_map != 0 {
            return Some((fl, sl_map.trailing_zeros() as usize));
        }

        // Then the first non-empty row above it
        let fl_map = self.fl_bitmap & u32::MAX.checked_shl(fl as u32 + 1).unwrap_or(0);
        if fl_map == 0 {
            return None;
        }

        let fl = fl_map.trailing_zeros() as usize;
        debug_assert_ne!(self.sl_bitmap[fl], 0);
        Some((fl, self.sl_bitmap[fl].trailing_zeros() as usize))
    }

    /// Detach and return the head of `bucket`
    pub fn pop(&mut self, arena: &mut Arena, (fl, sl): Bucket) -> Option<usize> {
        let head = self.heads[fl][sl]?;
        let next = next_free(arena, head);

        self.heads[fl][sl] = next;
        match next {
            Some(next) => set_prev_free(arena, next, None),
            None => self.mark_empty((fl, sl)),
        }

        Some(head)
    }

    #[inline]
    pub fn head(&self, (fl, sl): Bucket) -> Option<usize> {
        self.heads[fl][sl]
    }

    /// Whether the bitmaps claim `bucket` is non-empty
    pub fn is_marked(&self, (fl, sl): Bucket) -> bool {
        self.fl_bitmap & (1 << fl) != 0 && self.sl_bitmap[fl] & (1 << sl) != 0
    }

    /// Whether the first-level bitmap claims row `fl` is non-empty
    pub fn is_row_marked(&self, fl: usize) -> bool {
        self.fl_bitmap & (1 << fl) != 0
    }

    pub fn row_bitmap(&self, fl: usize) -> u32 {
        self.sl_bitmap[fl]
    }

    fn mark_empty(&mut self, (fl, sl): Bucket) {
        self.sl_bitmap[fl] &= !(1 << sl);
        if self.sl_bitmap[fl] == 0 {
            self.fl_bitmap &= !(1 << fl);
        }
    }
}
