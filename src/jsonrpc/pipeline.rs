//! Parameter validation pipeline run ahead of every method handler.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;

use crate::errors::{PipeError, ProtocolError};

/// One validation/transform step over call parameters.
///
/// `Ok(params)` replaces the parameters seen by later stages and the handler.
#[async_trait]
pub trait PipeStage: Send + Sync {
    async fn run(&self, params: Option<Value>) -> Result<Option<Value>, PipeError>;
}

pub struct FnPipe<F>(F);

#[async_trait]
impl<F, Fut> PipeStage for FnPipe<F>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Value>, PipeError>> + Send + 'static,
{
    async fn run(&self, params: Option<Value>) -> Result<Option<Value>, PipeError> {
        (self.0)(params).await
    }
}

/// Wraps an async closure as a pipe stage.
pub fn pipe_fn<F, Fut>(stage: F) -> Arc<dyn PipeStage>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Value>, PipeError>> + Send + 'static,
{
    Arc::new(FnPipe(stage))
}

/// Runs every stage in order without short-circuiting on rejection.
///
/// Accepted stages feed their output forward; rejected stages leave the
/// parameters untouched. All rejection reasons are returned together as one
/// InvalidParams error. A crashed stage aborts immediately with InternalError.
pub async fn run_pipes(
    method: &str,
    pipes: &[Arc<dyn PipeStage>],
    mut params: Option<Value>,
) -> Result<Option<Value>, ProtocolError> {
    let mut reasons = Vec::new();

    for pipe in pipes {
        match pipe.run(params.clone()).await {
            Ok(transformed) => params = transformed,
            Err(PipeError::Rejected(reason)) => reasons.push(reason),
            Err(PipeError::Crashed(detail)) => {
                error!(method = %method, error = %detail, "error on validation pipe");
                return Err(ProtocolError::internal_error());
            }
        }
    }

    if reasons.is_empty() {
        Ok(params)
    } else {
        Err(ProtocolError::invalid_params(Value::Array(reasons)))
    }
}
