/*!
 * Request Dispatcher
 * Decodes command numbers and routes request records to a backend
 */

use super::codec::{decode_request, encode_reply, ControlResult};
use super::handler::HandlerRegistry;
use super::handlers::AllocatorHandler;
use super::types::{AllocRequest, Backend, Command, CommandCode, Status};
use crate::memory::{BaselineAllocator, MemoryResult, TlsfAllocator};
use std::sync::Arc;
use tracing::{trace, warn};

/// Stateless front door to both backends
///
/// Holds no per-caller session; clones share the same engine and comparator.
#[derive(Clone)]
pub struct Dispatcher {
    registry: HandlerRegistry,
    tlsf: Arc<TlsfAllocator>,
    baseline: Arc<BaselineAllocator>,
}

impl Dispatcher {
    /// Dispatcher over a fresh 16 MiB engine and a baseline comparator
    pub fn new() -> MemoryResult<Self> {
        Ok(Self::with_backends(
            Arc::new(TlsfAllocator::new()?),
            Arc::new(BaselineAllocator::new()),
        ))
    }

    pub fn with_backends(tlsf: Arc<TlsfAllocator>, baseline: Arc<BaselineAllocator>) -> Self {
        let registry = HandlerRegistry::new()
            .register(Arc::new(AllocatorHandler::new(Backend::Tlsf, tlsf.clone())))
            .register(Arc::new(AllocatorHandler::new(
                Backend::Baseline,
                baseline.clone(),
            )));

        Self {
            registry,
            tlsf,
            baseline,
        }
    }

    /// Serve one command, returning the response record and its status
    ///
    /// Unknown command numbers return the request unchanged with
    /// `InvalidRequest` and never reach a backend.
    pub fn dispatch(&self, code: CommandCode, request: AllocRequest) -> (AllocRequest, Status) {
        let Some(command) = Command::decode(code) else {
            warn!(command = format!("{code:#x}"), "unknown control command");
            return (request, Status::InvalidRequest);
        };

        let mut response = request;
        let status = self
            .registry
            .dispatch(&command, &mut response)
            .unwrap_or(Status::InvalidRequest);

        trace!(
            backend = %command.backend,
            operation = ?command.operation,
            size = response.size,
            pointer = response.pointer,
            status = status.code(),
            "control command served"
        );
        (response, status)
    }

    /// Serve one inbound frame, producing the outbound frame
    ///
    /// A malformed frame is an error and touches no backend state.
    pub fn dispatch_frame(&self, frame: &[u8]) -> ControlResult<Vec<u8>> {
        let frame = decode_request(frame)?;
        let request = frame.request()?;
        let (response, status) = self.dispatch(frame.command, request);
        encode_reply(&response, status)
    }

    pub fn tlsf(&self) -> &Arc<TlsfAllocator> {
        &self.tlsf
    }

    pub fn baseline(&self) -> &Arc<BaselineAllocator> {
        &self.baseline
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.registry.handler_names())
            .field("tlsf", &self.tlsf)
            .field("baseline", &self.baseline)
            .finish()
    }
}
