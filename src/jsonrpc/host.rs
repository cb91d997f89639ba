//! The JSON-RPC protocol host
//!
//! Validates inbound envelopes, routes them to registered methods, runs the
//! validation pipeline and the handler, and builds the outbound envelope.

use futures::future::join_all;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::errors::{HandlerError, ProtocolError};
use crate::jsonrpc::envelope::{salvage_id, Inbound, Reply, RequestEnvelope, ResponseEnvelope};
use crate::jsonrpc::pipeline::run_pipes;
use crate::jsonrpc::registry::{MethodDefinition, MethodRegistry};
use crate::logging::redact_params;

pub struct ProtocolHost {
    registry: MethodRegistry,
}

impl ProtocolHost {
    pub fn new(registry: MethodRegistry) -> Self {
        Self { registry }
    }

    /// Handles one raw envelope.
    ///
    /// Notifications are executed to completion but produce `None`. Shape
    /// failures and unknown methods always produce an envelope, with a null id
    /// for notifications.
    pub async fn handle_message(&self, raw: Value) -> Option<ResponseEnvelope> {
        let request = match RequestEnvelope::from_value(&raw) {
            Ok(request) => request,
            Err(error) => return Some(ResponseEnvelope::error(salvage_id(&raw), error)),
        };

        let Some(method) = self.registry.lookup(&request.method) else {
            warn!(method = %request.method, "call to unknown method");
            return Some(Self::build_error(
                ProtocolError::method_not_found(&request.method),
                Some(&request),
            ));
        };

        let audit_params = redact_params(request.params.as_ref());
        let outcome = self.process(method, request.params.clone()).await;

        info!(
            method = %request.method,
            params = %audit_params,
            notification = request.is_notification(),
            outcome = if outcome.is_ok() { "success" } else { "failure" },
            "rpc call handled"
        );

        if request.is_notification() {
            return None;
        }

        Some(match outcome {
            Ok(result) => Self::build_message(result, Some(&request)),
            Err(error) => Self::build_error(error, Some(&request)),
        })
    }

    /// Handles a batch concurrently.
    ///
    /// An empty batch, or one made only of notifications, collapses to a single
    /// `{id: null, error: ParseError}` envelope instead of an empty list.
    pub async fn handle_messages(&self, raw: Vec<Value>) -> Reply {
        let responses: Vec<ResponseEnvelope> =
            join_all(raw.into_iter().map(|item| self.handle_message(item)))
                .await
                .into_iter()
                .flatten()
                .collect();

        if responses.is_empty() {
            return Reply::Single(ResponseEnvelope::error(
                None,
                ProtocolError::parse_error(Value::Null),
            ));
        }

        Reply::Batch(responses)
    }

    pub async fn handle_inbound(&self, inbound: Inbound) -> Option<Reply> {
        match inbound {
            Inbound::Single(raw) => self.handle_message(raw).await.map(Reply::Single),
            Inbound::Batch(raw) => Some(self.handle_messages(raw).await),
        }
    }

    pub fn build_message(payload: Value, request: Option<&RequestEnvelope>) -> ResponseEnvelope {
        ResponseEnvelope::result(request.and_then(|r| r.id.clone()), payload)
    }

    pub fn build_error(error: ProtocolError, request: Option<&RequestEnvelope>) -> ResponseEnvelope {
        ResponseEnvelope::error(request.and_then(|r| r.id.clone()), error)
    }

    async fn process(
        &self,
        method: &MethodDefinition,
        params: Option<Value>,
    ) -> Result<Value, ProtocolError> {
        let params = run_pipes(&method.name, &method.pipes, params).await?;

        match method.handler.call(params).await {
            Ok(result) => Ok(result),
            Err(HandlerError::Protocol(error)) => Err(error),
            Err(HandlerError::Internal(detail)) => {
                error!(
                    method = %method.name,
                    error = %detail,
                    "error during application message processing"
                );
                Err(ProtocolError::internal_error())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use serde_json::json;
    use tokio::{sync::Barrier, time::timeout};

    use super::*;
    use crate::errors::{ErrorCode, PipeError};
    use crate::jsonrpc::pipeline::pipe_fn;
    use crate::jsonrpc::registry::handler_fn;

    fn host_with_counter() -> (ProtocolHost, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = MethodRegistry::new();

        let counter = calls.clone();
        registry
            .register(
                "count",
                handler_fn(move |_| {
                    let counter = counter.clone();
                    async move {
                        let value = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        Ok::<_, HandlerError>(json!(value))
                    }
                }),
                vec![],
            )
            .expect("register count");
        registry
            .register(
                "echo",
                handler_fn(|params| async move { Ok::<_, HandlerError>(params.unwrap_or(Value::Null)) }),
                vec![],
            )
            .expect("register echo");
        registry
            .register(
                "structured",
                handler_fn(|_| async {
                    Err::<Value, _>(HandlerError::Protocol(ProtocolError::new(
                        ErrorCode::Custom(-32050),
                        "quota exceeded",
                        Some(json!({"limit": 5})),
                    )))
                }),
                vec![],
            )
            .expect("register structured");
        registry
            .register(
                "explode",
                handler_fn(|_| async { Err::<Value, _>(HandlerError::internal("db password=hunter2")) }),
                vec![],
            )
            .expect("register explode");
        registry
            .register(
                "guarded",
                handler_fn(|_| async { Ok::<_, HandlerError>(json!("unreachable")) }),
                vec![
                    pipe_fn(|_| async { Err::<Option<Value>, _>(PipeError::rejected("x")) }),
                    pipe_fn(|_| async { Err::<Option<Value>, _>(PipeError::rejected("y")) }),
                ],
            )
            .expect("register guarded");

        (ProtocolHost::new(registry), calls)
    }

    #[tokio::test]
    async fn request_with_id_gets_matching_response() {
        let (host, _) = host_with_counter();

        let response = host
            .handle_message(json!({"jsonrpc": "2.0", "method": "echo", "params": {"a": 1}, "id": 9}))
            .await
            .expect("response for id-bearing request");

        assert_eq!(response.id.as_deref(), Some("9"));
        assert_eq!(response.as_result(), Some(&json!({"a": 1})));
        assert!(response.as_error().is_none());
    }

    #[tokio::test]
    async fn notification_runs_handler_without_response() {
        let (host, calls) = host_with_counter();

        let missing_id = host
            .handle_message(json!({"jsonrpc": "2.0", "method": "count"}))
            .await;
        let null_id = host
            .handle_message(json!({"jsonrpc": "2.0", "method": "count", "id": null}))
            .await;

        assert!(missing_id.is_none());
        assert!(null_id.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalid_shape_returns_parse_error_with_salvaged_id() {
        let (host, _) = host_with_counter();

        let response = host
            .handle_message(json!({"jsonrpc": "1.0", "method": "echo", "id": "abc"}))
            .await
            .expect("parse error response");

        assert_eq!(response.id.as_deref(), Some("abc"));
        assert_eq!(
            response.as_error().map(|e| e.code),
            Some(ErrorCode::ParseError)
        );
    }

    #[tokio::test]
    async fn unknown_method_returns_method_not_found() {
        let (host, _) = host_with_counter();

        let response = host
            .handle_message(json!({"jsonrpc": "2.0", "method": "nope", "id": 1}))
            .await
            .expect("error response");

        let error = response.as_error().expect("error outcome");
        assert_eq!(error.code, ErrorCode::MethodNotFound);
        assert_eq!(error.message, "Method nope not found");
        assert_eq!(response.id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn unknown_method_notification_gets_null_id_error() {
        let (host, _) = host_with_counter();

        let response = host
            .handle_message(json!({"jsonrpc": "2.0", "method": "nope"}))
            .await
            .expect("error response");

        assert_eq!(response.id, None);
        assert_eq!(
            response.as_error().map(|e| e.code),
            Some(ErrorCode::MethodNotFound)
        );

        let reply = host
            .handle_messages(vec![json!({"jsonrpc": "2.0", "method": "nope"})])
            .await;
        let Reply::Batch(responses) = reply else {
            panic!("expected batch reply");
        };
        assert_eq!(responses.len(), 1);
        assert_eq!(
            responses[0].as_error().map(|e| e.code),
            Some(ErrorCode::MethodNotFound)
        );
    }

    #[tokio::test]
    async fn batch_members_run_concurrently() {
        let barrier = Arc::new(Barrier::new(2));
        let mut registry = MethodRegistry::new();
        for name in ["left", "right"] {
            let barrier = barrier.clone();
            registry
                .register(
                    name,
                    handler_fn(move |_| {
                        let barrier = barrier.clone();
                        async move {
                            barrier.wait().await;
                            Ok::<_, HandlerError>(json!(true))
                        }
                    }),
                    vec![],
                )
                .expect("register barrier method");
        }
        let host = ProtocolHost::new(registry);

        let reply = timeout(
            Duration::from_secs(5),
            host.handle_messages(vec![
                json!({"jsonrpc": "2.0", "method": "left", "id": 1}),
                json!({"jsonrpc": "2.0", "method": "right", "id": 2}),
            ]),
        )
        .await
        .expect("batch members should not wait on each other");

        let Reply::Batch(responses) = reply else {
            panic!("expected batch reply");
        };
        assert_eq!(responses.len(), 2);
        assert!(responses.iter().all(|r| r.as_result() == Some(&json!(true))));
    }

    #[tokio::test]
    async fn structured_errors_are_forwarded_verbatim() {
        let (host, _) = host_with_counter();

        let response = host
            .handle_message(json!({"jsonrpc": "2.0", "method": "structured", "id": 1}))
            .await
            .expect("error response");

        assert_eq!(
            response.as_error(),
            Some(&ProtocolError::new(ErrorCode::Custom(-32050), "quota exceeded", Some(json!({"limit": 5}))))
        );
    }

    #[tokio::test]
    async fn internal_failures_do_not_leak_detail() {
        let (host, _) = host_with_counter();

        let response = host
            .handle_message(json!({"jsonrpc": "2.0", "method": "explode", "id": 1}))
            .await
            .expect("error response");

        assert_eq!(response.as_error(), Some(&ProtocolError::internal_error()));
        let serialized = serde_json::to_string(&response).expect("serialize");
        assert!(!serialized.contains("hunter2"));
    }

    #[tokio::test]
    async fn pipeline_rejections_are_reported_together() {
        let (host, _) = host_with_counter();

        let response = host
            .handle_message(json!({"jsonrpc": "2.0", "method": "guarded", "id": 1}))
            .await
            .expect("error response");

        let error = response.as_error().expect("error outcome");
        assert_eq!(error.code, ErrorCode::InvalidParams);
        assert_eq!(error.data, Some(json!(["x", "y"])));
    }

    #[tokio::test]
    async fn batch_returns_one_response_per_id_bearing_request() {
        let (host, calls) = host_with_counter();

        let reply = host
            .handle_messages(vec![
                json!({"jsonrpc": "2.0", "method": "echo", "params": [1], "id": "a"}),
                json!({"jsonrpc": "2.0", "method": "count"}),
                json!({"jsonrpc": "2.0", "method": "nope", "id": "b"}),
            ])
            .await;

        let Reply::Batch(responses) = reply else {
            panic!("expected batch reply");
        };
        let mut ids: Vec<_> = responses.iter().filter_map(|r| r.id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn degenerate_batches_collapse_to_parse_error() {
        let (host, calls) = host_with_counter();

        for batch in [vec![], vec![json!({"jsonrpc": "2.0", "method": "count"})]] {
            let reply = host.handle_messages(batch).await;
            let envelope = reply.as_single().expect("single envelope");
            assert_eq!(envelope.id, None);
            assert_eq!(
                envelope.as_error().map(|e| e.code),
                Some(ErrorCode::ParseError)
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn single_notification_inbound_yields_nothing() {
        let (host, _) = host_with_counter();

        let reply = host
            .handle_inbound(Inbound::Single(json!({"jsonrpc": "2.0", "method": "count"})))
            .await;

        assert!(reply.is_none());
    }

    #[test]
    fn builders_copy_request_id_or_use_null() {
        let request = RequestEnvelope::new("ping", None, Some("42".to_string()));

        let message = ProtocolHost::build_message(json!({"ok": true}), Some(&request));
        assert_eq!(message.id.as_deref(), Some("42"));

        let error = ProtocolHost::build_error(ProtocolError::internal_error(), None);
        assert_eq!(error.id, None);

        let notification = RequestEnvelope::new("ping", None, None);
        let message = ProtocolHost::build_message(json!({}), Some(&notification));
        assert_eq!(message.id, None);
    }
}
