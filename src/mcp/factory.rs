//! Builds an [`McpStream`] from a transport configuration
//!
//! Tools, resources and extra methods are registered on the factory during
//! startup; `build` wires the configured transport and adds the built-in
//! protocol methods.

use std::sync::Arc;

use tracing::info;

use crate::config::{TransportConfig, TransportKind};
use crate::errors::StartupError;
use crate::jsonrpc::{MethodHandler, MethodRegistry, PipeStage, ProtocolHost};
use crate::mcp::definitions::{Catalog, ResourceDefinition, ToolDefinition};
use crate::mcp::server::register_protocol_methods;
use crate::mcp::stream::McpStream;
use crate::schema::{JsonSchemaValidator, SchemaValidator};
use crate::transport::{HttpSseTransport, Transport};

pub struct StreamFactory {
    config: TransportConfig,
    catalog: Catalog,
    registry: MethodRegistry,
}

impl StreamFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self::with_validator(config, Arc::new(JsonSchemaValidator))
    }

    pub fn with_validator(config: TransportConfig, validator: Arc<dyn SchemaValidator>) -> Self {
        Self {
            config,
            catalog: Catalog::new(validator),
            registry: MethodRegistry::new(),
        }
    }

    pub fn register_tool(&mut self, tool: ToolDefinition) -> Result<(), StartupError> {
        self.catalog.register_tool(tool)
    }

    pub fn register_resource(&mut self, resource: ResourceDefinition) -> Result<(), StartupError> {
        self.catalog.register_resource(resource)
    }

    /// Registers an application-level method next to the built-in ones.
    pub fn register_method(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn MethodHandler>,
        pipes: Vec<Arc<dyn PipeStage>>,
    ) -> Result<(), StartupError> {
        self.registry.register(name, handler, pipes)
    }

    pub fn build(self) -> Result<McpStream, StartupError> {
        let Self {
            config,
            catalog,
            mut registry,
        } = self;

        let transport: Arc<dyn Transport> = match config.transport {
            TransportKind::Http => Arc::new(HttpSseTransport::new(&config)?),
            TransportKind::Stdio => {
                return Err(StartupError::UnsupportedTransport(TransportKind::Stdio.as_str()))
            }
        };

        let catalog = Arc::new(catalog);
        register_protocol_methods(&mut registry, &config, &catalog)?;

        info!(
            transport = config.transport.as_str(),
            tools = catalog.tools_list().len(),
            resources = catalog.resources_list().len(),
            methods = registry.len(),
            "mcp stream built"
        );

        Ok(McpStream::new(ProtocolHost::new(registry), catalog, transport))
    }
}
