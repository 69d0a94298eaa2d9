//! MCP session lifecycle management.
//!
//! A session correlates stateless HTTP requests into one logical client
//! connection. Each session owns exactly one [`StreamTransport`], which moves
//! through an explicit state machine:
//!
//! ```text
//! Uninitialized --activate()--> Active --close()--> Closed (terminal)
//! ```
//!
//! `activate()` runs exactly once and mints the opaque session id; only an
//! active transport may be registered. The registry never resurrects a closed
//! session: removed ids are retired and refused on re-registration.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Messages pushed to MCP clients over the session's SSE stream.
#[derive(Clone, Debug)]
pub enum TransportEvent {
    /// A serialized JSON-RPC message to deliver to the client.
    JsonRpc(String),
}

/// Lifecycle state of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Created, but the initialization handshake has not completed.
    Uninitialized,
    /// Handshake done; the transport owns a session id and serves requests.
    Active,
    /// Torn down. Terminal; no transition re-enters `Active`.
    Closed,
}

/// Errors from transport lifecycle transitions and registry operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("transport already activated")]
    AlreadyActive,
    #[error("transport is closed")]
    Closed,
    #[error("transport has no session id; was it activated?")]
    NotActivated,
    #[error("session id {0} is already registered")]
    Duplicate(String),
    #[error("session id {0} was closed and cannot be reused")]
    Retired(String),
}

/// Protocol state for one session's message stream.
#[derive(Debug)]
pub struct StreamTransport {
    state: TransportState,
    session_id: Option<String>,
    event_tx: broadcast::Sender<TransportEvent>,
}

impl StreamTransport {
    /// Create a transport in the `Uninitialized` state, with no session id.
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            state: TransportState::Uninitialized,
            session_id: None,
            event_tx,
        }
    }

    /// Complete the initialization handshake: mint a fresh session id and
    /// transition `Uninitialized -> Active`. May succeed exactly once.
    pub fn activate(&mut self) -> Result<String, SessionError> {
        match self.state {
            TransportState::Uninitialized => {
                let id = Uuid::new_v4().to_string();
                self.session_id = Some(id.clone());
                self.state = TransportState::Active;
                Ok(id)
            }
            TransportState::Active => Err(SessionError::AlreadyActive),
            TransportState::Closed => Err(SessionError::Closed),
        }
    }

    /// Tear the transport down. Returns the resolved session id so the
    /// registry can remove its entry; `None` if the transport never
    /// completed initialization (nothing to remove). Idempotent.
    pub fn close(&mut self) -> Option<String> {
        self.state = TransportState::Closed;
        self.session_id.clone()
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Subscribe to this transport's server-to-client message stream.
    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.event_tx.subscribe()
    }

    /// Push an event to all SSE subscribers.
    pub fn send(
        &self,
        event: TransportEvent,
    ) -> Result<usize, broadcast::error::SendError<TransportEvent>> {
        self.event_tx.send(event)
    }
}

impl Default for StreamTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry mapping session ids to their live transports.
///
/// This is the only shared mutable state in the gateway. Sessions persist
/// until explicit closure; there is no idle-session eviction, so a client
/// that initializes sessions and never terminates them leaks entries until
/// process restart. The map is process-local and lost on restart.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

struct RegistryInner {
    sessions: HashMap<String, StreamTransport>,
    /// Ids of closed sessions. Never re-admitted.
    retired: HashSet<String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner {
                sessions: HashMap::new(),
                retired: HashSet::new(),
            })),
        }
    }

    /// Register an activated transport under its own session id.
    ///
    /// Refuses transports that never completed initialization, ids already
    /// present, and ids that belonged to a closed session.
    pub async fn register(&self, transport: StreamTransport) -> Result<String, SessionError> {
        let id = match transport.session_id() {
            Some(id) if transport.state() == TransportState::Active => id.to_string(),
            _ => return Err(SessionError::NotActivated),
        };
        let mut inner = self.inner.write().await;
        if inner.retired.contains(&id) {
            return Err(SessionError::Retired(id));
        }
        if inner.sessions.contains_key(&id) {
            return Err(SessionError::Duplicate(id));
        }
        inner.sessions.insert(id.clone(), transport);
        info!("Registered MCP session: {}", id);
        Ok(id)
    }

    /// Check whether a session id resolves to a live transport.
    pub async fn lookup(&self, id: &str) -> bool {
        let inner = self.inner.read().await;
        inner.sessions.contains_key(id)
    }

    /// Subscribe to a session's server-to-client message stream.
    pub async fn subscribe(&self, id: &str) -> Option<broadcast::Receiver<TransportEvent>> {
        let inner = self.inner.read().await;
        inner.sessions.get(id).map(|t| t.subscribe())
    }

    /// Push an event to a session's subscribers. Returns false for unknown
    /// sessions or when no subscriber is listening.
    pub async fn send_event(&self, id: &str, event: TransportEvent) -> bool {
        let inner = self.inner.read().await;
        match inner.sessions.get(id) {
            Some(transport) => transport.send(event).is_ok(),
            None => false,
        }
    }

    /// Close a session's transport and remove it.
    ///
    /// Removal is keyed by the id the transport itself reports from
    /// `close()`, and the id is retired so it can never be re-registered.
    /// Returns false if the id does not resolve (including a second
    /// terminate for the same id).
    pub async fn terminate(&self, id: &str) -> bool {
        let mut inner = self.inner.write().await;
        let Some(mut transport) = inner.sessions.remove(id) else {
            debug!("Terminate for unknown MCP session: {}", id);
            return false;
        };
        if let Some(resolved) = transport.close() {
            inner.retired.insert(resolved);
        }
        info!("Terminated MCP session: {}", id);
        true
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.sessions.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
