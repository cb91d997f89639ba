//! JSON-RPC 2.0 protocol host
//!
//! Envelope validation, the method registry, the parameter pipeline and the
//! dispatcher that ties them together.

pub mod envelope;
pub mod host;
pub mod pipeline;
pub mod registry;

pub use envelope::{Inbound, Outcome, Reply, RequestEnvelope, ResponseEnvelope, JSONRPC_VERSION};
pub use host::ProtocolHost;
pub use pipeline::{pipe_fn, run_pipes, PipeStage};
pub use registry::{handler_fn, MethodDefinition, MethodHandler, MethodRegistry};
