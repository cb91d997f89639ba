//! Transports binding the protocol host to a concrete channel.

pub mod http_sse;
pub mod session;

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::TransportError;
use crate::jsonrpc::{ProtocolHost, Reply};

pub use http_sse::HttpSseTransport;
pub use session::{PushChannel, SessionGuard, SessionRegistry};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Starts accepting traffic and serves until the listener stops.
    async fn listen(&self, host: Arc<ProtocolHost>) -> Result<(), TransportError>;

    /// Pushes an outbound message over the push channel.
    ///
    /// Fails with [`TransportError::NoPushChannel`] when none is open.
    async fn send(&self, message: &Reply) -> Result<(), TransportError>;
}
