/*!
 * Control Handler Trait
 * Defines the interface for command handlers and handler registration
 */

use super::types::{AllocRequest, Command, Status};
use std::sync::Arc;

/// Trait for handling decoded commands
/// Each backend's command pair is served by one handler
pub trait ControlHandler: Send + Sync {
    /// Handle a command, writing any result into `request`
    /// Returns `None` if the command belongs to another handler
    fn handle(&self, command: &Command, request: &mut AllocRequest) -> Option<Status>;

    /// Get the name of this handler (for logging/debugging)
    fn name(&self) -> &'static str;
}

/// Registry for control handlers
/// Routes commands to the first handler that accepts them
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: Arc<Vec<Arc<dyn ControlHandler>>>,
}

impl HandlerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a handler in the registry
    pub fn register(mut self, handler: Arc<dyn ControlHandler>) -> Self {
        let handlers = Arc::make_mut(&mut self.handlers);
        handlers.push(handler);
        self
    }

    /// Dispatch a command to the appropriate handler
    /// Returns None if no handler accepts this command
    pub fn dispatch(&self, command: &Command, request: &mut AllocRequest) -> Option<Status> {
        self.handlers
            .iter()
            .find_map(|handler| handler.handle(command, request))
    }

    /// Get the number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Names of the registered handlers, in dispatch order
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
