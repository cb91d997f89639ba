//! Tool and resource catalog
//!
//! Definitions are plain values assembled by the bootstrap and registered
//! explicitly before the transport starts listening.

use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::schema::{CallToolResult, ContentBlock, TextContent};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{HandlerError, PipeError, ProtocolError, StartupError};
use crate::jsonrpc::{MethodHandler, PipeStage};
use crate::schema::SchemaValidator;

#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub handler: Arc<dyn MethodHandler>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: Arc<dyn MethodHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler,
        }
    }

    pub fn data(&self) -> ToolData {
        ToolData {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ResourceDefinition {
    pub name: String,
    pub description: String,
    pub uri: String,
    pub mime_type: Option<String>,
    pub handler: Arc<dyn MethodHandler>,
}

impl ResourceDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        uri: impl Into<String>,
        mime_type: Option<String>,
        handler: Arc<dyn MethodHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            uri: uri.into(),
            mime_type,
            handler,
        }
    }

    pub fn data(&self) -> ResourceData {
        ResourceData {
            name: self.name.clone(),
            description: self.description.clone(),
            uri: self.uri.clone(),
            mime_type: self.mime_type.clone(),
        }
    }
}

/// Listing metadata for a tool, without its handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolData {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Listing metadata for a resource, without its handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceData {
    pub name: String,
    pub description: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Params shape shared by `tools/call` and `resources/read`.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl NamedCall {
    pub fn from_params(params: Option<Value>) -> Option<Self> {
        params.and_then(|params| serde_json::from_value(params).ok())
    }
}

pub struct Catalog {
    tools: Vec<ToolDefinition>,
    resources: Vec<ResourceDefinition>,
    validator: Arc<dyn SchemaValidator>,
}

impl Catalog {
    pub fn new(validator: Arc<dyn SchemaValidator>) -> Self {
        Self {
            tools: Vec::new(),
            resources: Vec::new(),
            validator,
        }
    }

    pub fn register_tool(&mut self, tool: ToolDefinition) -> Result<(), StartupError> {
        if self.tool(&tool.name).is_some() {
            return Err(StartupError::DuplicateTool(tool.name));
        }

        self.validator
            .check_schema(&tool.input_schema)
            .map_err(|reason| StartupError::InvalidToolSchema {
                tool: tool.name.clone(),
                reason,
            })?;

        self.tools.push(tool);
        Ok(())
    }

    pub fn register_resource(&mut self, resource: ResourceDefinition) -> Result<(), StartupError> {
        if self.resource(&resource.name).is_some() {
            return Err(StartupError::DuplicateResource(resource.name));
        }

        self.resources.push(resource);
        Ok(())
    }

    pub fn tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceDefinition> {
        self.resources.iter().find(|resource| resource.name == name)
    }

    pub fn tools_list(&self) -> Vec<ToolData> {
        self.tools.iter().map(ToolDefinition::data).collect()
    }

    pub fn resources_list(&self) -> Vec<ResourceData> {
        self.resources.iter().map(ResourceDefinition::data).collect()
    }

    /// Checks `arguments` against the named tool's input schema.
    ///
    /// Missing arguments are validated as an empty object.
    pub fn check_tool_arguments(&self, name: &str, arguments: Option<&Value>) -> Result<(), Value> {
        let Some(tool) = self.tool(name) else {
            return Err(json!({ "name": name, "message": format!("Tool {name} not found") }));
        };

        let empty = json!({});
        self.validator
            .validate(&tool.input_schema, arguments.unwrap_or(&empty))
            .map_err(|errors| json!({ "name": name, "errors": errors }))
    }

    /// Invokes a tool handler and wraps its raw result into a content list.
    ///
    /// Callers are expected to have run [`Catalog::check_tool_arguments`] first.
    pub async fn invoke_tool(&self, name: &str, arguments: Option<Value>) -> Result<Value, HandlerError> {
        let tool = self
            .tool(name)
            .ok_or_else(|| HandlerError::invalid_params(format!("Tool {name} not found")))?;

        let output = tool
            .handler
            .call(Some(arguments.unwrap_or_else(|| json!({}))))
            .await?;

        tool_result(output)
    }

    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<Value, HandlerError> {
        if let Err(reason) = self.check_tool_arguments(name, arguments.as_ref()) {
            return Err(ProtocolError::invalid_params(Value::Array(vec![reason])).into());
        }

        self.invoke_tool(name, arguments).await
    }

    /// Reads a resource by name. Arguments are passed through without schema checks.
    pub async fn read_resource(&self, name: &str, arguments: Option<Value>) -> Result<Value, HandlerError> {
        let resource = self
            .resource(name)
            .ok_or_else(|| HandlerError::invalid_params(format!("Resource {name} not found")))?;

        resource.handler.call(arguments).await
    }
}

fn tool_result(output: Value) -> Result<Value, HandlerError> {
    let text = match output {
        Value::String(text) => text,
        other => other.to_string(),
    };

    serde_json::to_value(CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(text, None, None))],
        is_error: Some(false),
        meta: None,
        structured_content: None,
    })
    .map_err(HandlerError::internal)
}

/// Pipe stage on `tools/call` that rejects arguments violating the tool schema,
/// so the tool handler never sees them.
pub struct ToolArgumentsPipe {
    catalog: Arc<Catalog>,
}

impl ToolArgumentsPipe {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl PipeStage for ToolArgumentsPipe {
    async fn run(&self, params: Option<Value>) -> Result<Option<Value>, PipeError> {
        let Some(call) = NamedCall::from_params(params.clone()) else {
            return Err(PipeError::rejected("params.name must be a string"));
        };

        self.catalog
            .check_tool_arguments(&call.name, call.arguments.as_ref())
            .map_err(PipeError::Rejected)?;

        Ok(params)
    }
}
