/*!
 * Memory Types
 * Common types for the engine and the baseline comparator
 */

use crate::core::limits::{PRESSURE_CRITICAL, PRESSURE_HIGH, PRESSURE_MEDIUM};
use crate::core::types::{Address, Size};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Memory errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum MemoryError {
    #[error("Arena too small: requested {requested} bytes, minimum {minimum} bytes")]
    #[diagnostic(
        code(memory::arena_too_small),
        help("An arena must hold at least one block header and its minimum payload.")
    )]
    ArenaTooSmall { requested: usize, minimum: usize },

    #[error("Arena too large: requested {requested} bytes, maximum {maximum} bytes")]
    #[diagnostic(
        code(memory::arena_too_large),
        help("The size-class table only covers blocks below 4 GiB.")
    )]
    ArenaTooLarge { requested: usize, maximum: usize },

    #[error("Out of memory: requested {requested} bytes, {available} bytes free")]
    #[diagnostic(
        code(memory::out_of_memory),
        help("No free block is large enough. Free live allocations or request less.")
    )]
    OutOfMemory { requested: usize, available: usize },

    #[error("Invalid memory address: 0x{0:x}")]
    #[diagnostic(
        code(memory::invalid_pointer),
        help("The address is not a live allocation of this backend (never allocated, or already freed).")
    )]
    InvalidPointer(usize),
}

/// Snapshot of one physical block, as seen by a heap walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Payload address (what `allocate` returns for a live block)
    pub address: Address,
    /// Payload bytes, excluding the header
    pub size: Size,
    pub is_free: bool,
}

impl BlockInfo {
    /// One past the last payload byte
    pub fn end(&self) -> Address {
        self.address + self.size
    }
}

/// Memory statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_memory: usize,
    pub used_memory: usize,
    pub available_memory: usize,
    pub usage_percentage: f64,
    pub allocated_blocks: usize,
    pub free_blocks: usize,
    pub largest_free_block: usize,
}

impl MemoryStats {
    pub fn memory_pressure(&self) -> MemoryPressure {
        MemoryPressure::from_ratio(self.usage_percentage / 100.0)
    }
}

/// Memory pressure levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemoryPressure {
    Low,
    Medium,
    High,
    Critical,
}

impl MemoryPressure {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= PRESSURE_CRITICAL {
            MemoryPressure::Critical
        } else if ratio >= PRESSURE_HIGH {
            MemoryPressure::High
        } else if ratio >= PRESSURE_MEDIUM {
            MemoryPressure::Medium
        } else {
            MemoryPressure::Low
        }
    }
}

impl std::fmt::Display for MemoryPressure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MemoryPressure::Low => write!(f, "LOW"),
            MemoryPressure::Medium => write!(f, "MEDIUM"),
            MemoryPressure::High => write!(f, "HIGH"),
            MemoryPressure::Critical => write!(f, "CRITICAL"),
        }
    }
}
