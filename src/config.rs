use std::{env, net::SocketAddr, str::FromStr};

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PATH: &str = "/mcp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    #[default]
    Http,
    Stdio,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Stdio => "stdio",
        }
    }
}

impl FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "stdio" => Ok(Self::Stdio),
            _ => Err(ConfigError::InvalidTransport),
        }
    }
}

/// Settings handed to the stream factory by the bootstrap.
///
/// Server name, version and instructions stay optional; `initialize` falls back
/// to built-in defaults when they are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub transport: TransportKind,
    pub server_name: Option<String>,
    pub version: Option<String>,
    pub instructions: Option<String>,
    pub bind_addr: String,
    pub bind_port: u16,
    pub path: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MCP_TRANSPORT must be one of: http, stdio")]
    InvalidTransport,
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("MCP_PATH must start with '/'")]
    InvalidPath,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Http,
            server_name: None,
            version: None,
            instructions: None,
            bind_addr: "127.0.0.1".to_string(),
            bind_port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
        }
    }
}

impl TransportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let transport = non_empty("MCP_TRANSPORT")
            .map(|value| value.parse::<TransportKind>())
            .transpose()?
            .unwrap_or_default();
        let bind_port = non_empty("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(DEFAULT_PORT);
        let path = non_empty("MCP_PATH").unwrap_or_else(|| DEFAULT_PATH.to_string());
        if !path.starts_with('/') {
            return Err(ConfigError::InvalidPath);
        }

        let config = Self {
            transport,
            server_name: non_empty("MCP_SERVER_NAME"),
            version: non_empty("MCP_SERVER_VERSION"),
            instructions: non_empty("MCP_INSTRUCTIONS"),
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            bind_port,
            path,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }

    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self.version = Some(version.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn parse_defaults() {
        let config = TransportConfig::from_lookup(lookup(&[])).expect("config should parse");

        assert_eq!(config, TransportConfig::default());
        assert_eq!(config.bind_port, 3000);
        assert_eq!(config.path, "/mcp");
        assert_eq!(config.transport, TransportKind::Http);
    }

    #[test]
    fn reads_server_identity() {
        let config = TransportConfig::from_lookup(lookup(&[
            ("MCP_SERVER_NAME", "demo"),
            ("MCP_SERVER_VERSION", "1.2.3"),
            ("MCP_INSTRUCTIONS", "  be nice  "),
            ("MCP_PATH", "/rpc"),
            ("BIND_PORT", "4000"),
        ]))
        .expect("config should parse");

        assert_eq!(config.server_name.as_deref(), Some("demo"));
        assert_eq!(config.version.as_deref(), Some("1.2.3"));
        assert_eq!(config.instructions.as_deref(), Some("be nice"));
        assert_eq!(config.path, "/rpc");
        assert_eq!(config.bind_port, 4000);
    }

    #[test]
    fn stdio_parses_but_unknown_transport_fails() {
        let config = TransportConfig::from_lookup(lookup(&[("MCP_TRANSPORT", "STDIO")]))
            .expect("config should parse");
        assert_eq!(config.transport, TransportKind::Stdio);

        let err = TransportConfig::from_lookup(lookup(&[("MCP_TRANSPORT", "websocket")]))
            .expect_err("expected invalid transport");
        assert!(matches!(err, ConfigError::InvalidTransport));
    }

    #[test]
    fn invalid_port_and_path_fail() {
        let err = TransportConfig::from_lookup(lookup(&[("BIND_PORT", "99999")]))
            .expect_err("expected invalid port");
        assert!(matches!(err, ConfigError::InvalidPort));

        let err = TransportConfig::from_lookup(lookup(&[("MCP_PATH", "mcp")]))
            .expect_err("expected invalid path");
        assert!(matches!(err, ConfigError::InvalidPath));
    }

    #[test]
    fn invalid_bind_address_fails() {
        let err = TransportConfig::from_lookup(lookup(&[("BIND_ADDR", "not an address")]))
            .expect_err("expected invalid socket");
        assert!(matches!(err, ConfigError::InvalidSocket));
    }
}
