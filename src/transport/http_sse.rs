//! HTTP POST ingress paired with a server-sent-events push channel.

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::TransportConfig;
use crate::errors::{StartupError, TransportError};
use crate::jsonrpc::{ProtocolHost, Reply};
use crate::transport::{SessionRegistry, Transport};
use crate::{build_app, AppState};

pub struct HttpSseTransport {
    bind_socket: SocketAddr,
    path: String,
    sessions: SessionRegistry,
}

impl HttpSseTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, StartupError> {
        Ok(Self {
            bind_socket: config.bind_socket()?,
            path: config.path.clone(),
            sessions: SessionRegistry::new(),
        })
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn app_state(&self, host: Arc<ProtocolHost>) -> AppState {
        AppState::new(host, self.sessions.clone(), self.path.clone())
    }
}

#[async_trait]
impl Transport for HttpSseTransport {
    async fn listen(&self, host: Arc<ProtocolHost>) -> Result<(), TransportError> {
        let app = build_app(self.app_state(host));
        let listener = tokio::net::TcpListener::bind(self.bind_socket).await?;

        info!(
            bind_addr = %self.bind_socket,
            path = %self.path,
            "mcp server listening"
        );

        axum::serve(listener, app.into_make_service()).await?;
        Ok(())
    }

    async fn send(&self, message: &Reply) -> Result<(), TransportError> {
        let payload = serde_json::to_string(message)?;
        self.sessions.send_active(payload).inspect_err(|err| {
            error!(error = %err, "push send failed");
        })
    }
}
