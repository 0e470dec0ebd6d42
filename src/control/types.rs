/*!
 * Control Types
 * Request record, command codes and status codes of the control boundary
 */

use crate::core::types::{Address, Size, NULL_ADDRESS};
use crate::memory::MemoryError;
use serde::{Deserialize, Serialize};

/// Fixed-shape request/response record
///
/// `size` is read by allocate commands. `pointer` carries the result of an
/// allocate command and the address to release for a free command.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocRequest {
    pub size: Size,
    pub pointer: Address,
}

impl AllocRequest {
    pub fn allocate(size: Size) -> Self {
        Self {
            size,
            pointer: NULL_ADDRESS,
        }
    }

    pub fn free(pointer: Address) -> Self {
        Self { size: 0, pointer }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.pointer == NULL_ADDRESS
    }
}

// ============================================================================
// Command Codes
// ============================================================================

/// Raw command number as it crosses the boundary
pub type CommandCode = u32;

const IOCPARM_MASK: u32 = 0x1fff;
const IOC_IN: u32 = 0x8000_0000;
const IOC_OUT: u32 = 0x4000_0000;
const IOC_INOUT: u32 = IOC_IN | IOC_OUT;
const COMMAND_GROUP: u8 = b'a';

/// BSD-style ioctl encoding: direction, record length, group, number
const fn ioc(direction: u32, number: u8) -> CommandCode {
    let len = std::mem::size_of::<AllocRequest>() as u32;
    direction | ((len & IOCPARM_MASK) << 16) | ((COMMAND_GROUP as u32) << 8) | number as u32
}

/// Allocate from the TLSF engine (record in and out)
pub const ALLOC_TLSF: CommandCode = ioc(IOC_INOUT, 1);
/// Free to the TLSF engine (record in)
pub const FREE_TLSF: CommandCode = ioc(IOC_IN, 2);
/// Allocate from the baseline comparator (record in and out)
pub const ALLOC_BASELINE: CommandCode = ioc(IOC_INOUT, 3);
/// Free to the baseline comparator (record in)
pub const FREE_BASELINE: CommandCode = ioc(IOC_IN, 4);

/// Allocator backend a command pair routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Tlsf,
    Baseline,
}

impl Backend {
    pub fn alloc_command(self) -> CommandCode {
        Command::new(self, Operation::Allocate).code()
    }

    pub fn free_command(self) -> CommandCode {
        Command::new(self, Operation::Free).code()
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Backend::Tlsf => write!(f, "tlsf"),
            Backend::Baseline => write!(f, "baseline"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Allocate,
    Free,
}

/// Decoded command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    pub backend: Backend,
    pub operation: Operation,
}

impl Command {
    pub const fn new(backend: Backend, operation: Operation) -> Self {
        Self { backend, operation }
    }

    /// Decode a raw command number; anything unrecognised is `None`
    pub fn decode(code: CommandCode) -> Option<Self> {
        let command = match code {
            ALLOC_TLSF => Self::new(Backend::Tlsf, Operation::Allocate),
            FREE_TLSF => Self::new(Backend::Tlsf, Operation::Free),
            ALLOC_BASELINE => Self::new(Backend::Baseline, Operation::Allocate),
            FREE_BASELINE => Self::new(Backend::Baseline, Operation::Free),
            _ => return None,
        };
        Some(command)
    }

    pub fn code(&self) -> CommandCode {
        match (self.backend, self.operation) {
            (Backend::Tlsf, Operation::Allocate) => ALLOC_TLSF,
            (Backend::Tlsf, Operation::Free) => FREE_TLSF,
            (Backend::Baseline, Operation::Allocate) => ALLOC_BASELINE,
            (Backend::Baseline, Operation::Free) => FREE_BASELINE,
        }
    }
}

// ============================================================================
// Status Codes
// ============================================================================

/// Outcome returned alongside every response record
///
/// Numeric values follow errno so they survive any transport unchanged.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Success = 0,
    OutOfMemory = 12,
    InvalidPointer = 14,
    InvalidRequest = 22,
}

impl Status {
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Status::Success),
            12 => Some(Status::OutOfMemory),
            14 => Some(Status::InvalidPointer),
            22 => Some(Status::InvalidRequest),
            _ => None,
        }
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl From<&MemoryError> for Status {
    fn from(err: &MemoryError) -> Self {
        match err {
            MemoryError::OutOfMemory { .. } => Status::OutOfMemory,
            MemoryError::InvalidPointer(_) => Status::InvalidPointer,
            MemoryError::ArenaTooSmall { .. } | MemoryError::ArenaTooLarge { .. } => {
                Status::InvalidRequest
            }
        }
    }
}

impl<T> From<&Result<T, MemoryError>> for Status {
    fn from(result: &Result<T, MemoryError>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(e) => e.into(),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Status::Success => write!(f, "success"),
            Status::OutOfMemory => write!(f, "out of memory"),
            Status::InvalidPointer => write!(f, "invalid pointer"),
            Status::InvalidRequest => write!(f, "invalid request"),
        }
    }
}
