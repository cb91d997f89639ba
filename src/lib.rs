use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod config;
pub mod errors;
pub mod http;
pub mod jsonrpc;
pub mod logging;
pub mod mcp;
pub mod schema;
pub mod transport;

use jsonrpc::ProtocolHost;
use transport::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub host: Arc<ProtocolHost>,
    pub sessions: SessionRegistry,
    pub path: Arc<str>,
}

impl AppState {
    pub fn new(host: Arc<ProtocolHost>, sessions: SessionRegistry, path: impl Into<String>) -> Self {
        Self {
            host,
            sessions,
            path: Arc::<str>::from(path.into()),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health))
        .route(
            &state.path,
            post(http::handlers::mcp_endpoint).get(http::handlers::open_push_channel),
        )
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
