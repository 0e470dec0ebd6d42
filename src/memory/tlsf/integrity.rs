/*!
 * Heap Integrity
 * Physical walk and free-list audit used by tests and diagnostics
 */

use super::block::{block_end, payload_offset, BlockHeader};
use super::free_list::{next_free, prev_free};
use super::heap::TlsfHeap;
use super::mapping::mapping_insert;
use crate::core::limits::{ALIGNMENT, BLOCK_HEADER_SIZE, FL_INDEX_COUNT, SL_INDEX_COUNT};
use crate::memory::types::BlockInfo;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Totals gathered by a successful integrity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub arena_bytes: usize,
    pub live_blocks: usize,
    pub free_blocks: usize,
    /// Bytes held by live blocks, headers included
    pub live_bytes: usize,
    /// Bytes held by free blocks, headers included
    pub free_bytes: usize,
}

/// A broken engine invariant
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum IntegrityError {
    #[error("Corrupt block header at offset {offset}")]
    #[diagnostic(code(tlsf::corrupt_header))]
    CorruptHeader { offset: usize },

    #[error("Misaligned block at offset {offset}")]
    #[diagnostic(code(tlsf::misaligned))]
    Misaligned { offset: usize },

    #[error("Block at offset {offset} records previous block {recorded:?}, walk found {actual:?}")]
    #[diagnostic(code(tlsf::broken_physical_link))]
    BrokenPhysicalLink {
        offset: usize,
        recorded: Option<usize>,
        actual: Option<usize>,
    },

    #[error("Block at offset {offset} runs past the arena end")]
    #[diagnostic(code(tlsf::overrun))]
    Overrun { offset: usize },

    #[error("Free blocks at offsets {first} and {second} are adjacent")]
    #[diagnostic(code(tlsf::adjacent_free))]
    AdjacentFree { first: usize, second: usize },

    #[error("Bitmap for bucket ({fl}, {sl}) disagrees with its list")]
    #[diagnostic(code(tlsf::bitmap_mismatch))]
    BitmapMismatch { fl: usize, sl: usize },

    #[error("Block at offset {offset} is filed under bucket ({fl}, {sl}) but does not belong there")]
    #[diagnostic(code(tlsf::misfiled_block))]
    MisfiledBlock { offset: usize, fl: usize, sl: usize },

    #[error("Free lists hold {listed} blocks, physical walk found {walked}")]
    #[diagnostic(code(tlsf::free_list_mismatch))]
    FreeListMismatch { listed: usize, walked: usize },

    #[error("Counter {counter} is {recorded}, walk found {actual}")]
    #[diagnostic(code(tlsf::counter_mismatch))]
    CounterMismatch {
        counter: &'static str,
        recorded: usize,
        actual: usize,
    },
}

impl TlsfHeap {
    /// Every physical block in address order
    pub fn blocks(&self) -> Vec<BlockInfo> {
        let mut blocks = Vec::new();
        let mut offset = 0;

        while offset < self.arena.len() {
            let Some(header) = BlockHeader::read(&self.arena, offset) else {
                break;
            };
            blocks.push(BlockInfo {
                address: self.arena.address_of(payload_offset(offset)),
                size: header.size,
                is_free: header.is_free,
            });
            offset = block_end(offset, header.size);
        }

        blocks
    }

    /// Verify every engine-wide invariant
    pub fn check_integrity(&self) -> Result<IntegrityReport, IntegrityError> {
        let mut report = IntegrityReport {
            arena_bytes: self.arena.len(),
            live_blocks: 0,
            free_blocks: 0,
            live_bytes: 0,
            free_bytes: 0,
        };

        let mut offset = 0;
        let mut prev: Option<(usize, bool)> = None;

        while offset < self.arena.len() {
            if offset % ALIGNMENT != 0 {
                return Err(IntegrityError::Misaligned { offset });
            }
            let header = BlockHeader::read(&self.arena, offset)
                .ok_or(IntegrityError::CorruptHeader { offset })?;

            let actual_prev = prev.map(|(o, _)| o);
            if header.prev_phys != actual_prev {
                return Err(IntegrityError::BrokenPhysicalLink {
                    offset,
                    recorded: header.prev_phys,
                    actual: actual_prev,
                });
            }
            if let Some((prev_offset, true)) = prev {
                if header.is_free {
                    return Err(IntegrityError::AdjacentFree {
                        first: prev_offset,
                        second: offset,
                    });
                }
            }

            let end = block_end(offset, header.size);
            if end > self.arena.len() {
                return Err(IntegrityError::Overrun { offset });
            }

            let bytes = BLOCK_HEADER_SIZE + header.size;
            if header.is_free {
                report.free_blocks += 1;
                report.free_bytes += bytes;
            } else {
                report.live_blocks += 1;
                report.live_bytes += bytes;
            }

            prev = Some((offset, header.is_free));
            offset = end;
        }

        let listed = self.audit_free_lists(report.free_blocks)?;
        if listed != report.free_blocks {
            return Err(IntegrityError::FreeListMismatch {
                listed,
                walked: report.free_blocks,
            });
        }

        for (counter, recorded, actual) in [
            ("used_bytes", self.used_bytes, report.live_bytes),
            ("live_blocks", self.live_blocks, report.live_blocks),
            ("free_blocks", self.free_blocks, report.free_blocks),
        ] {
            if recorded != actual {
                return Err(IntegrityError::CounterMismatch {
                    counter,
                    recorded,
                    actual,
                });
            }
        }

        Ok(report)
    }

    /// Walk every bucket, returning how many blocks the lists hold
    fn audit_free_lists(&self, walked: usize) -> Result<usize, IntegrityError> {
        let mut listed = 0;

        for fl in 0..FL_INDEX_COUNT {
            if self.free_list.is_row_marked(fl) != (self.free_list.row_bitmap(fl) != 0) {
                return Err(IntegrityError::BitmapMismatch { fl, sl: 0 });
            }

            for sl in 0..SL_INDEX_COUNT {
                let head = self.free_list.head((fl, sl));
                if self.free_list.is_marked((fl, sl)) != head.is_some() {
                    return Err(IntegrityError::BitmapMismatch { fl, sl });
                }

                let mut expected_prev = None;
                let mut cursor = head;
                while let Some(offset) = cursor {
                    let header = BlockHeader::read(&self.arena, offset)
                        .ok_or(IntegrityError::CorruptHeader { offset })?;
                    if !header.is_free
                        || mapping_insert(header.size) != (fl, sl)
                        || prev_free(&self.arena, offset) != expected_prev
                    {
                        return Err(IntegrityError::MisfiledBlock { offset, fl, sl });
                    }

                    listed += 1;
                    // A cycle would otherwise never terminate
                    if listed > walked {
                        return Err(IntegrityError::FreeListMismatch { listed, walked });
                    }

                    expected_prev = Some(offset);
                    cursor = next_free(&self.arena, offset);
                }
            }
        }

        Ok(listed)
    }
}
