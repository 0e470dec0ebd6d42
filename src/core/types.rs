/*!
 * Core Types
 * Common types used across the allocator, dispatcher and harness
 */

/// Address type for memory operations
///
/// Addresses handed out by a backend are opaque to callers; only the backend
/// that produced one can interpret it.
pub type Address = usize;

/// Size type for memory operations
pub type Size = usize;

/// The null address, used in request records when no pointer is present
pub const NULL_ADDRESS: Address = 0;
