/*!
 * Size-Class Mapping
 *
 * Two-level index: the first level is the power-of-two range of a size, the
 * second level splits that range into `SL_INDEX_COUNT` linear slots. Sizes
 * below `SMALL_BLOCK_SIZE` share first level 0, sliced into `ALIGNMENT`-wide
 * slots.
 */

use crate::core::limits::{
    ALIGNMENT, FL_INDEX_COUNT, FL_INDEX_SHIFT, MAX_ARENA_SIZE, MIN_BLOCK_PAYLOAD,
    SL_INDEX_COUNT, SL_INDEX_COUNT_LOG2, SMALL_BLOCK_SIZE,
};

/// `(first_level, second_level)` bucket key
pub(super) type Bucket = (usize, usize);

#[inline]
fn floor_log2(size: usize) -> u32 {
    usize::BITS - 1 - size.leading_zeros()
}

/// Round a request up to a block payload size, or `None` if no arena could hold it
#[inline]
pub(super) fn adjust_request_size(size: usize) -> Option<usize> {
    let size = size.max(MIN_BLOCK_PAYLOAD);
    let aligned = size.checked_add(ALIGNMENT - 1)? & !(ALIGNMENT - 1);
    (aligned <= MAX_ARENA_SIZE).then_some(aligned)
}

/// Bucket a free block of `size` bytes is filed under
#[inline]
pub(super) fn mapping_insert(size: usize) -> Bucket {
    if size < SMALL_BLOCK_SIZE {
        (0, size / (SMALL_BLOCK_SIZE / SL_INDEX_COUNT))
    } else {
        let log2 = floor_log2(size);
        let sl = (size >> (log2 - SL_INDEX_COUNT_LOG2)) ^ SL_INDEX_COUNT;
        ((log2 - FL_INDEX_SHIFT + 1) as usize, sl)
    }
}

/// First bucket whose every block is guaranteed to hold `size` bytes
#[inline]
pub(super) fn mapping_search(size: usize) -> Option<Bucket> {
    let rounded = if size >= SMALL_BLOCK_SIZE {
        let round = (1usize << (floor_log2(size) - SL_INDEX_COUNT_LOG2)) - 1;
        size.checked_add(round)?
    } else {
        size
    };

    let (fl, sl) = mapping_insert(rounded);
    (fl < FL_INDEX_COUNT).then_some((fl, sl))
}

/// Smallest size filed under `bucket`
pub(super) fn bucket_floor((fl, sl): Bucket) -> usize {
    if fl == 0 {
        sl * (SMALL_BLOCK_SIZE / SL_INDEX_COUNT)
    } else {
        let range_start = 1usize << (fl as u32 + FL_INDEX_SHIFT - 1);
        range_start + sl * (range_start >> SL_INDEX_COUNT_LOG2)
    }
}
