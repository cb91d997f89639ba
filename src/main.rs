use chrono::{SecondsFormat, Utc};
use mcp_stream_host::{
    config::TransportConfig,
    errors::HandlerError,
    jsonrpc::handler_fn,
    logging,
    mcp::{ResourceDefinition, StreamFactory, ToolDefinition},
};
use serde_json::{json, Value};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = TransportConfig::from_env()?;
    let mut factory = StreamFactory::new(config.clone());

    factory.register_tool(ToolDefinition::new(
        "echo",
        "Return the given message unchanged",
        json!({
            "type": "object",
            "properties": { "msg": { "type": "string" } },
            "required": ["msg"]
        }),
        handler_fn(|params: Option<Value>| async move {
            Ok::<_, HandlerError>(
                params
                    .and_then(|p| p.get("msg").cloned())
                    .unwrap_or(Value::Null),
            )
        }),
    ))?;

    factory.register_resource(ResourceDefinition::new(
        "server-time",
        "Current server time in UTC",
        "resource://server/time",
        Some("application/json".to_string()),
        handler_fn(|_| async {
            Ok::<_, HandlerError>(json!({
                "now_utc": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
            }))
        }),
    ))?;

    let stream = factory.build()?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        path = %config.path,
        "server starting"
    );

    stream.listen().await?;
    Ok(())
}
