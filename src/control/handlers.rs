/*!
 * Allocator Command Handler
 * Serves one backend's allocate/free command pair
 */

use super::handler::ControlHandler;
use super::types::{AllocRequest, Backend, Command, Operation, Status};
use crate::core::types::NULL_ADDRESS;
use crate::memory::Allocator;
use std::sync::Arc;

/// Handler routing one command pair to an allocator backend
///
/// No plausibility checks happen here: sizes and pointers are passed through
/// and all validation is the backend's.
pub struct AllocatorHandler {
    backend: Backend,
    allocator: Arc<dyn Allocator>,
}

impl AllocatorHandler {
    #[inline]
    pub fn new(backend: Backend, allocator: Arc<dyn Allocator>) -> Self {
        Self { backend, allocator }
    }
}

impl ControlHandler for AllocatorHandler {
    #[inline]
    fn handle(&self, command: &Command, request: &mut AllocRequest) -> Option<Status> {
        if command.backend != self.backend {
            return None;
        }

        let status = match command.operation {
            Operation::Allocate => match self.allocator.allocate(request.size) {
                Ok(address) => {
                    request.pointer = address;
                    Status::Success
                }
                Err(e) => {
                    request.pointer = NULL_ADDRESS;
                    Status::from(&e)
                }
            },
            Operation::Free => Status::from(&self.allocator.deallocate(request.pointer)),
        };
        Some(status)
    }

    #[inline]
    fn name(&self) -> &'static str {
        self.allocator.name()
    }
}
