/*!
 * Memory Module
 * Allocator backends behind a common two-operation contract
 */

pub mod baseline;
pub mod tlsf;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use baseline::BaselineAllocator;
pub use tlsf::{IntegrityError, IntegrityReport, TlsfAllocator};
pub use traits::*;
pub use types::*;
