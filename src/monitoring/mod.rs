/*!
 * Monitoring
 * Structured tracing setup and operation timing
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, span_operation, OperationSpan};
