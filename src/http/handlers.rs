//! Axum HTTP handlers for the web server
//!
//! POST on the base path carries inbound envelopes; GET on the same path opens
//! the server-sent-events push channel.

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::errors::{ProtocolError, TransportError};
use crate::jsonrpc::{Inbound, ProtocolHost, Reply};
use crate::transport::PushChannel;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Status for a computed reply: batches count as accepted, single error
/// envelopes map through the error-code table.
pub fn reply_status(reply: &Reply) -> StatusCode {
    match reply {
        Reply::Batch(_) => StatusCode::ACCEPTED,
        Reply::Single(envelope) => envelope
            .as_error()
            .map(|error| error.code.http_status())
            .unwrap_or(StatusCode::ACCEPTED),
    }
}

pub async fn mcp_endpoint(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    body: Bytes,
) -> Response {
    let inbound = match Inbound::from_slice(&body) {
        Ok(inbound) => inbound,
        Err(err) => {
            let envelope =
                ProtocolHost::build_error(ProtocolError::parse_error(json!(err.to_string())), None);
            return (StatusCode::BAD_REQUEST, Json(envelope)).into_response();
        }
    };

    debug!(
        batch = matches!(inbound, Inbound::Batch(_)),
        session_id = ?query.session_id,
        "client message received via POST"
    );

    let Some(reply) = state.host.handle_inbound(inbound).await else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let status = reply_status(&reply);
    push_reply(&state, query.session_id.as_deref(), &reply);

    debug!(status = status.as_u16(), "sending response");
    (status, Json(reply)).into_response()
}

fn push_reply(state: &AppState, session_id: Option<&str>, reply: &Reply) {
    let payload = match serde_json::to_string(reply) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize reply for push channel");
            return;
        }
    };

    let pushed = match session_id {
        Some(session_id) => state.sessions.send_to(session_id, payload),
        None => state.sessions.send_active(payload),
    };

    match pushed {
        Ok(()) => {}
        Err(TransportError::NoPushChannel) => debug!("no push channel open, reply sent over HTTP only"),
        Err(err) => warn!(error = %err, "failed to push reply"),
    }
}

pub async fn open_push_channel(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let channel = state.sessions.open();
    let endpoint = format!("{}?sessionId={}", state.path, channel.session_id);

    debug!(session_id = %channel.session_id, "client connected via GET");

    Sse::new(event_stream(endpoint, channel)).keep_alive(KeepAlive::default())
}

/// One `endpoint` event followed by a `data` frame per pushed message.
///
/// The session guard travels with the stream, so the session closes once the
/// peer disconnects and axum drops the body.
fn event_stream(
    endpoint: String,
    channel: PushChannel,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let PushChannel {
        receiver, guard, ..
    } = channel;

    let opening = stream::once(async move {
        Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint))
    });
    let messages = stream::unfold((receiver, guard), |(mut receiver, guard)| async move {
        let payload = receiver.recv().await?;
        Some((
            Ok::<_, Infallible>(Event::default().data(payload)),
            (receiver, guard),
        ))
    });

    opening.chain(messages)
}
