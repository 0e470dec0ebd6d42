/*!
 * Control Frame Codec
 * Fixed-width binary frames carrying the request record across a byte transport
 *
 * # Format
 * - Inbound: `command: u32`, `size: u64`, `pointer: u64` (20 bytes)
 * - Outbound: `size: u64`, `pointer: u64`, `status: i32` (20 bytes)
 * - Little-endian, fixed-int encoding, no trailing bytes
 */

use super::types::{AllocRequest, CommandCode, Status};
use bincode::Options;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Encoded length of a [`RequestFrame`]
pub const REQUEST_FRAME_LEN: usize = 20;
/// Encoded length of a [`ReplyFrame`]
pub const REPLY_FRAME_LEN: usize = 20;

/// Result type for codec operations
pub type ControlResult<T> = Result<T, ControlError>;

/// Frame encoding and decoding errors
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum ControlError {
    #[error("Frame encoding failed: {context}")]
    #[diagnostic(code(control::encode))]
    Encode {
        context: &'static str,
        #[source]
        source: Box<bincode::ErrorKind>,
    },

    #[error("Frame decoding failed: {context}")]
    #[diagnostic(code(control::decode))]
    Decode {
        context: &'static str,
        #[source]
        source: Box<bincode::ErrorKind>,
    },

    #[error("Invalid frame size: expected {expected} bytes, got {actual} bytes")]
    #[diagnostic(code(control::frame_size))]
    FrameSize { expected: usize, actual: usize },

    #[error("Field out of range for this platform: {field}")]
    #[diagnostic(code(control::field_range))]
    FieldRange { field: &'static str },

    #[error("Unknown status code: {0}")]
    #[diagnostic(
        code(control::unknown_status),
        help("Status codes are 0, 12 (ENOMEM), 14 (EFAULT) or 22 (EINVAL)")
    )]
    UnknownStatus(i32),
}

/// Inbound frame: a command number plus the request record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub command: CommandCode,
    pub size: u64,
    pub pointer: u64,
}

impl RequestFrame {
    pub fn new(command: CommandCode, request: &AllocRequest) -> Self {
        Self {
            command,
            size: request.size as u64,
            pointer: request.pointer as u64,
        }
    }

    /// Recover the request record carried by this frame
    pub fn request(&self) -> ControlResult<AllocRequest> {
        Ok(AllocRequest {
            size: to_usize(self.size, "size")?,
            pointer: to_usize(self.pointer, "pointer")?,
        })
    }
}

/// Outbound frame: the response record plus its status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyFrame {
    pub size: u64,
    pub pointer: u64,
    pub status: i32,
}

impl ReplyFrame {
    pub fn new(response: &AllocRequest, status: Status) -> Self {
        Self {
            size: response.size as u64,
            pointer: response.pointer as u64,
            status: status.code(),
        }
    }

    pub fn response(&self) -> ControlResult<(AllocRequest, Status)> {
        let status = Status::from_code(self.status).ok_or(ControlError::UnknownStatus(self.status))?;
        let response = AllocRequest {
            size: to_usize(self.size, "size")?,
            pointer: to_usize(self.pointer, "pointer")?,
        };
        Ok((response, status))
    }
}

#[inline]
fn to_usize(value: u64, field: &'static str) -> ControlResult<usize> {
    usize::try_from(value).map_err(|_| ControlError::FieldRange { field })
}

#[inline]
fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

#[inline]
fn check_len(bytes: &[u8], expected: usize) -> ControlResult<()> {
    if bytes.len() != expected {
        return Err(ControlError::FrameSize {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Encode a command and request record into an inbound frame
pub fn encode_request(command: CommandCode, request: &AllocRequest) -> ControlResult<Vec<u8>> {
    options()
        .serialize(&RequestFrame::new(command, request))
        .map_err(|source| ControlError::Encode {
            context: "request frame",
            source,
        })
}

/// Decode an inbound frame
pub fn decode_request(bytes: &[u8]) -> ControlResult<RequestFrame> {
    check_len(bytes, REQUEST_FRAME_LEN)?;
    options()
        .deserialize(bytes)
        .map_err(|source| ControlError::Decode {
            context: "request frame",
            source,
        })
}

/// Encode a response record and its status into an outbound frame
pub fn encode_reply(response: &AllocRequest, status: Status) -> ControlResult<Vec<u8>> {
    options()
        .serialize(&ReplyFrame::new(response, status))
        .map_err(|source| ControlError::Encode {
            context: "reply frame",
            source,
        })
}

/// Decode an outbound frame
pub fn decode_reply(bytes: &[u8]) -> ControlResult<ReplyFrame> {
    check_len(bytes, REPLY_FRAME_LEN)?;
    options()
        .deserialize(bytes)
        .map_err(|source| ControlError::Decode {
            context: "reply frame",
            source,
        })
}
