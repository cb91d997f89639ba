//! Model Context Protocol server surface
//!
//! Tool/resource definitions, the built-in protocol methods, and the factory
//! that assembles them into a runnable stream.

pub mod definitions;
pub mod factory;
pub mod server;
pub mod stream;

pub use definitions::{Catalog, ResourceData, ResourceDefinition, ToolData, ToolDefinition};
pub use factory::StreamFactory;
pub use stream::McpStream;
