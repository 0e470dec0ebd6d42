/*!
 * Control Channels
 * Transports a caller can reach the dispatcher through
 */

use super::codec::{decode_reply, encode_request, ControlResult};
use super::dispatcher::Dispatcher;
use super::types::{AllocRequest, CommandCode, Status};

/// A synchronous request/response path to the control boundary
pub trait ControlChannel: Send + Sync {
    /// Issue one command and wait for its response record and status
    fn call(&self, code: CommandCode, request: AllocRequest)
        -> ControlResult<(AllocRequest, Status)>;

    /// Transport name (for logging/reports)
    fn transport(&self) -> &'static str;
}

/// In-process calls straight into the dispatcher
impl ControlChannel for Dispatcher {
    #[inline]
    fn call(
        &self,
        code: CommandCode,
        request: AllocRequest,
    ) -> ControlResult<(AllocRequest, Status)> {
        Ok(self.dispatch(code, request))
    }

    fn transport(&self) -> &'static str {
        "direct"
    }
}

/// Calls that cross the boundary as encoded frames
#[derive(Debug, Clone)]
pub struct FrameChannel {
    dispatcher: Dispatcher,
}

impl FrameChannel {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl ControlChannel for FrameChannel {
    fn call(
        &self,
        code: CommandCode,
        request: AllocRequest,
    ) -> ControlResult<(AllocRequest, Status)> {
        let frame = encode_request(code, &request)?;
        let reply = self.dispatcher.dispatch_frame(&frame)?;
        decode_reply(&reply)?.response()
    }

    fn transport(&self) -> &'static str {
        "frame"
    }
}

impl<C: ControlChannel + ?Sized> ControlChannel for &C {
    #[inline]
    fn call(
        &self,
        code: CommandCode,
        request: AllocRequest,
    ) -> ControlResult<(AllocRequest, Status)> {
        (**self).call(code, request)
    }

    fn transport(&self) -> &'static str {
        (**self).transport()
    }
}
