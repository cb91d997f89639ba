//! Method registry: name → handler plus its validation pipeline.
//!
//! Filled during startup through `&mut` access, then moved into a
//! [`ProtocolHost`](super::host::ProtocolHost) which only ever reads it.

use std::{collections::HashMap, future::Future, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{HandlerError, StartupError};
use crate::jsonrpc::pipeline::PipeStage;

#[async_trait]
pub trait MethodHandler: Send + Sync {
    async fn call(&self, params: Option<Value>) -> Result<Value, HandlerError>;
}

pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> MethodHandler for FnHandler<F>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    async fn call(&self, params: Option<Value>) -> Result<Value, HandlerError> {
        (self.0)(params).await
    }
}

/// Wraps an async closure as a method handler.
pub fn handler_fn<F, Fut>(handler: F) -> Arc<dyn MethodHandler>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler(handler))
}

#[derive(Clone)]
pub struct MethodDefinition {
    pub name: String,
    pub handler: Arc<dyn MethodHandler>,
    pub pipes: Vec<Arc<dyn PipeStage>>,
}

#[derive(Default)]
pub struct MethodRegistry {
    methods: HashMap<String, MethodDefinition>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn MethodHandler>,
        pipes: Vec<Arc<dyn PipeStage>>,
    ) -> Result<(), StartupError> {
        let name = name.into();
        if self.methods.contains_key(&name) {
            return Err(StartupError::DuplicateMethod(name));
        }

        self.methods.insert(
            name.clone(),
            MethodDefinition {
                name,
                handler,
                pipes,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&MethodDefinition> {
        self.methods.get(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
