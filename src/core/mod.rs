/*!
 * Core Module
 * Shared types and compile-time limits
 */

pub mod limits;
pub mod types;

// Re-export for convenience
pub use types::*;
