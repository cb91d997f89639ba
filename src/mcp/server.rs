//! Built-in MCP protocol methods
//!
//! Capability negotiation (`initialize`), catalog listing, and dispatch of
//! `tools/call` / `resources/read` onto the registered catalog.

use std::sync::Arc;

use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ProtocolVersion, ServerCapabilities,
    ServerCapabilitiesPrompts, ServerCapabilitiesResources, ServerCapabilitiesTools,
};
use serde_json::{json, Value};

use crate::config::TransportConfig;
use crate::errors::{HandlerError, StartupError};
use crate::jsonrpc::{handler_fn, MethodRegistry, PipeStage};
use crate::mcp::definitions::{Catalog, NamedCall, ToolArgumentsPipe};

pub const SUPPORTED_PROTOCOL_VERSION: &str = "2024-11-05";
pub const DEFAULT_INSTRUCTIONS: &str = "MCP Server";

pub fn initialize_result(config: &TransportConfig) -> Result<Value, HandlerError> {
    let initialize_result = InitializeResult {
        server_info: Implementation {
            name: config
                .server_name
                .clone()
                .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string()),
            version: config
                .version
                .clone()
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            title: None,
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            logging: Some(serde_json::Map::new()),
            prompts: Some(ServerCapabilitiesPrompts { list_changed: None }),
            tools: Some(ServerCapabilitiesTools {
                list_changed: Some(false),
            }),
            resources: Some(ServerCapabilitiesResources {
                subscribe: None,
                list_changed: Some(false),
            }),
            ..Default::default()
        },
        protocol_version: ProtocolVersion::V2024_11_05.into(),
        instructions: Some(
            config
                .instructions
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
        ),
        meta: None,
    };

    serde_json::to_value(initialize_result).map_err(HandlerError::internal)
}

/// Registers the fixed protocol method set on top of the catalog.
pub fn register_protocol_methods(
    registry: &mut MethodRegistry,
    config: &TransportConfig,
    catalog: &Arc<Catalog>,
) -> Result<(), StartupError> {
    let config = Arc::new(config.clone());
    registry.register(
        "initialize",
        handler_fn(move |_| {
            let config = config.clone();
            async move { initialize_result(&config) }
        }),
        vec![],
    )?;

    registry.register(
        "notifications/initialized",
        handler_fn(|_| async { Ok::<_, HandlerError>(Value::Null) }),
        vec![],
    )?;

    let tools = catalog.clone();
    registry.register(
        "tools/list",
        handler_fn(move |_| {
            let tools = tools.tools_list();
            async move { Ok::<_, HandlerError>(json!({ "tools": tools })) }
        }),
        vec![],
    )?;

    let resources = catalog.clone();
    registry.register(
        "resources/list",
        handler_fn(move |_| {
            let resources = resources.resources_list();
            async move { Ok::<_, HandlerError>(json!({ "resources": resources })) }
        }),
        vec![],
    )?;

    let tool_catalog = catalog.clone();
    let argument_check: Arc<dyn PipeStage> = Arc::new(ToolArgumentsPipe::new(catalog.clone()));
    registry.register(
        "tools/call",
        handler_fn(move |params| {
            let catalog = tool_catalog.clone();
            async move {
                let call = NamedCall::from_params(params)
                    .ok_or_else(|| HandlerError::invalid_params("params.name must be a string"))?;
                catalog.invoke_tool(&call.name, call.arguments).await
            }
        }),
        vec![argument_check],
    )?;

    let resource_catalog = catalog.clone();
    registry.register(
        "resources/read",
        handler_fn(move |params| {
            let catalog = resource_catalog.clone();
            async move {
                let call = NamedCall::from_params(params)
                    .ok_or_else(|| HandlerError::invalid_params("params.name must be a string"))?;
                catalog.read_resource(&call.name, call.arguments).await
            }
        }),
        vec![],
    )?;

    registry.register("ping", handler_fn(|_| async { Ok::<_, HandlerError>(json!({})) }), vec![])?;

    Ok(())
}
