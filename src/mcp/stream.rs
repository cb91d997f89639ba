use std::sync::Arc;

use serde_json::Value;

use crate::errors::{HandlerError, TransportError};
use crate::jsonrpc::{ProtocolHost, Reply, ResponseEnvelope};
use crate::mcp::definitions::{Catalog, ResourceData, ToolData};
use crate::transport::Transport;

/// A protocol host bound to a tool/resource catalog and a transport.
pub struct McpStream {
    host: Arc<ProtocolHost>,
    catalog: Arc<Catalog>,
    transport: Arc<dyn Transport>,
}

impl McpStream {
    pub fn new(host: ProtocolHost, catalog: Arc<Catalog>, transport: Arc<dyn Transport>) -> Self {
        Self {
            host: Arc::new(host),
            catalog,
            transport,
        }
    }

    pub fn host(&self) -> Arc<ProtocolHost> {
        self.host.clone()
    }

    pub async fn listen(&self) -> Result<(), TransportError> {
        self.transport.listen(self.host.clone()).await
    }

    /// Pushes a server-initiated result envelope (`id: null`).
    pub async fn send_message(&self, payload: Value) -> Result<(), TransportError> {
        let message = Reply::from(ProtocolHost::build_message(payload, None));
        self.transport.send(&message).await
    }

    pub async fn handle_message(&self, raw: Value) -> Option<ResponseEnvelope> {
        self.host.handle_message(raw).await
    }

    pub async fn handle_messages(&self, raw: Vec<Value>) -> Reply {
        self.host.handle_messages(raw).await
    }

    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<Value, HandlerError> {
        self.catalog.call_tool(name, arguments).await
    }

    pub async fn read_resource(&self, name: &str, arguments: Option<Value>) -> Result<Value, HandlerError> {
        self.catalog.read_resource(name, arguments).await
    }

    pub fn tools_list(&self) -> Vec<ToolData> {
        self.catalog.tools_list()
    }

    pub fn resources_list(&self) -> Vec<ResourceData> {
        self.catalog.resources_list()
    }
}
