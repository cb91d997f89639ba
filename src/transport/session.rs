//! Push-channel session registry
//!
//! Each open SSE stream owns one session. Messages are queued into an unbounded
//! channel drained by the stream; the session is removed when its stream is
//! dropped, which is how axum reports a peer disconnect.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::TransportError;

struct Session {
    sender: UnboundedSender<String>,
    opened_at: DateTime<Utc>,
}

#[derive(Default)]
struct Sessions {
    channels: HashMap<String, Session>,
    /// Session ids in opening order; the last one is the active session.
    order: Vec<String>,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<Sessions>>,
}

/// Receiving half of a freshly opened session.
pub struct PushChannel {
    pub session_id: String,
    pub receiver: UnboundedReceiver<String>,
    pub guard: SessionGuard,
}

/// Closes its session when dropped.
pub struct SessionGuard {
    session_id: String,
    registry: SessionRegistry,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.close(&self.session_id);
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open(&self) -> PushChannel {
        let session_id = Uuid::new_v4().to_string();
        let (sender, receiver) = mpsc::unbounded_channel();

        {
            let mut sessions = self.lock();
            sessions.channels.insert(
                session_id.clone(),
                Session {
                    sender,
                    opened_at: Utc::now(),
                },
            );
            sessions.order.push(session_id.clone());
        }

        info!(session_id = %session_id, "push channel opened");

        PushChannel {
            guard: SessionGuard {
                session_id: session_id.clone(),
                registry: self.clone(),
            },
            session_id,
            receiver,
        }
    }

    pub fn close(&self, session_id: &str) {
        let removed = {
            let mut sessions = self.lock();
            sessions.order.retain(|id| id != session_id);
            sessions.channels.remove(session_id)
        };

        if let Some(session) = removed {
            info!(
                session_id = %session_id,
                opened_at_utc = %session.opened_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                "push channel closed"
            );
        }
    }

    pub fn send_to(&self, session_id: &str, payload: String) -> Result<(), TransportError> {
        let sessions = self.lock();
        let session = sessions
            .channels
            .get(session_id)
            .ok_or_else(|| TransportError::UnknownSession(session_id.to_string()))?;

        session
            .sender
            .send(payload)
            .map_err(|_| TransportError::ChannelClosed(session_id.to_string()))?;
        debug!(session_id = %session_id, "message pushed");
        Ok(())
    }

    /// Pushes to the most recently opened session still alive.
    pub fn send_active(&self, payload: String) -> Result<(), TransportError> {
        let session_id = self.active_session().ok_or(TransportError::NoPushChannel)?;
        self.send_to(&session_id, payload)
    }

    pub fn active_session(&self) -> Option<String> {
        self.lock().order.last().cloned()
    }

    pub fn is_open(&self, session_id: &str) -> bool {
        self.lock().channels.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.lock().channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
