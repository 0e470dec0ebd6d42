/*!
 * Control Boundary
 *
 * Fixed-shape request/response protocol in front of the allocator backends.
 * Callers may arrive concurrently and in any order; the dispatcher keeps no
 * per-caller state and leaves all validation to the backend it routes to.
 */

pub mod channel;
pub mod codec;
pub mod dispatcher;
pub mod handler;
pub mod handlers;
pub mod types;

pub use channel::{ControlChannel, FrameChannel};
pub use codec::{ControlError, ControlResult, ReplyFrame, RequestFrame};
pub use dispatcher::Dispatcher;
pub use handler::{ControlHandler, HandlerRegistry};
pub use handlers::AllocatorHandler;
pub use types::*;
