//! HTTP Transport layer for the Model Context Protocol
//!
//! Provides the axum handlers behind the configured base path and the health endpoint.

pub mod handlers;
