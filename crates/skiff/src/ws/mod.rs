// File: src/ws/mod.rs
// Purpose: WebSocket session multiplexer - routes session events to handlers

pub mod socket;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use skiff_router::PathPattern;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::error::{HandlerException, SkiffError};

/// Close code used when a session is torn down by a transport fault.
const FAULT_CLOSE_CODE: u16 = 1011;

// ----------------------------------------------------------------------------
// Handler signatures
// ----------------------------------------------------------------------------

pub type WsConnectHandler = Arc<dyn Fn(&WsSession) -> Result<(), HandlerException> + Send + Sync>;
pub type WsMessageHandler =
    Arc<dyn Fn(&WsSession, &str) -> Result<(), HandlerException> + Send + Sync>;
pub type WsErrorHandler =
    Arc<dyn Fn(&WsSession, &HandlerException) -> Result<(), HandlerException> + Send + Sync>;
pub type WsCloseHandler =
    Arc<dyn Fn(&WsSession, u16, &str) -> Result<(), HandlerException> + Send + Sync>;

/// The per-route callbacks registered at configuration time.
///
/// All four are optional; builder-style setters mirror the route
/// registration surface.
///
/// ```
/// use skiff::ws::WsHandlerSet;
///
/// let handlers = WsHandlerSet::new()
///     .on_message(|session, msg| {
///         session.send(format!("echo: {msg}"))?;
///         Ok(())
///     })
///     .on_error(|_session, exc| {
///         tracing::warn!(error = %exc, "socket fault");
///         Ok(())
///     });
/// ```
#[derive(Default, Clone)]
pub struct WsHandlerSet {
    connect: Option<WsConnectHandler>,
    message: Option<WsMessageHandler>,
    error: Option<WsErrorHandler>,
    close: Option<WsCloseHandler>,
}

impl WsHandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect<F>(mut self, f: F) -> Self
    where
        F: Fn(&WsSession) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.connect = Some(Arc::new(f));
        self
    }

    pub fn on_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&WsSession, &str) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.message = Some(Arc::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&WsSession, &HandlerException) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(f));
        self
    }

    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: Fn(&WsSession, u16, &str) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.close = Some(Arc::new(f));
        self
    }
}

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

/// Lifecycle of one WebSocket connection.
///
/// `CONNECTING → OPEN → CLOSING → CLOSED`, with `OPEN → CLOSED` directly on
/// a terminal error. Stored as an atomic so handler threads and the
/// transport thread can race on close without locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> SessionState {
        match value {
            0 => SessionState::Connecting,
            1 => SessionState::Open,
            2 => SessionState::Closing,
            _ => SessionState::Closed,
        }
    }
}

/// One live WebSocket connection: identity, the route it was opened on,
/// extracted path parameters, lifecycle state, and the outbound queue.
pub struct WsSession {
    id: Uuid,
    route: String,
    path: String,
    params: HashMap<String, String>,
    state: AtomicU8,
    outbound: Mutex<Option<UnboundedSender<String>>>,
    handlers: Arc<WsHandlerSet>,
}

impl std::fmt::Debug for WsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsSession")
            .field("id", &self.id)
            .field("route", &self.route)
            .field("state", &self.state())
            .finish()
    }
}

impl WsSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The route pattern this session was opened on.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// The actual request path of the upgrade handshake.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.params.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Queue a text frame for delivery to the peer.
    pub fn send(&self, message: impl Into<String>) -> Result<(), SkiffError> {
        if !self.is_open() {
            return Err(SkiffError::SessionClosed(self.id));
        }
        let guard = self.outbound.lock().expect("outbound lock poisoned");
        match guard.as_ref() {
            Some(tx) => tx
                .send(message.into())
                .map_err(|_| SkiffError::SessionClosed(self.id)),
            None => Err(SkiffError::SessionClosed(self.id)),
        }
    }

    /// Request an orderly close. Idempotent: later calls are no-ops.
    ///
    /// Transitions `OPEN → CLOSING` and shuts the outbound queue so the
    /// transport task starts the close handshake. The close notification
    /// itself fires once, when the transport confirms via
    /// [`WsMultiplexer::handle_close`].
    pub fn close(&self) {
        let transitioned = self
            .state
            .compare_exchange(
                SessionState::Open as u8,
                SessionState::Closing as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if transitioned {
            self.outbound.lock().expect("outbound lock poisoned").take();
        }
    }

    /// Terminal transition; returns the previous state, so exactly one
    /// caller observes a non-`Closed` value and performs the close
    /// notification.
    fn transition_closed(&self) -> SessionState {
        let previous = self.state.swap(SessionState::Closed as u8, Ordering::SeqCst);
        self.outbound.lock().expect("outbound lock poisoned").take();
        SessionState::from_u8(previous)
    }
}

// ----------------------------------------------------------------------------
// Multiplexer
// ----------------------------------------------------------------------------

struct WsRoute {
    pattern: PathPattern,
    handlers: Arc<WsHandlerSet>,
}

/// Tracks active WebSocket sessions and dispatches open/message/error/close
/// events to the callbacks registered for the route each session was
/// opened on.
///
/// Routes are registered during the single-threaded configuration phase;
/// the session registry is mutated concurrently (sessions open and close
/// from independent tasks) and is guarded by a `RwLock`.
#[derive(Default)]
pub struct WsMultiplexer {
    routes: Vec<WsRoute>,
    sessions: RwLock<HashMap<Uuid, Arc<WsSession>>>,
}

impl WsMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler set for a ws route pattern.
    pub fn register(&mut self, pattern: &str, handlers: WsHandlerSet) -> Result<(), SkiffError> {
        let compiled = PathPattern::compile(pattern).map_err(|source| SkiffError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.routes.push(WsRoute {
            pattern: compiled,
            handlers: Arc::new(handlers),
        });
        Ok(())
    }

    /// Handshake success: create a session bound to the matched route's
    /// handler set, transition to OPEN, and invoke the connect callback.
    ///
    /// `outbound` is the transport's send queue; `None` for sessions with
    /// no attached transport (not-yet-wired or test use).
    pub fn handle_open(
        &self,
        path: &str,
        ignore_trailing_slashes: bool,
        outbound: Option<UnboundedSender<String>>,
    ) -> Result<Arc<WsSession>, SkiffError> {
        let (route, params) = self
            .routes
            .iter()
            .find_map(|route| {
                route
                    .pattern
                    .matches(path, ignore_trailing_slashes)
                    .map(|params| (route, params))
            })
            .ok_or_else(|| SkiffError::NoWsRoute(path.to_string()))?;

        let (raw_params, _splat) = params.into_parts();
        let decoded_params = raw_params
            .into_iter()
            .map(|(name, value)| {
                let decoded = urlencoding::decode(&value)
                    .map(|v| v.into_owned())
                    .unwrap_or(value);
                (name, decoded)
            })
            .collect();
        let session = Arc::new(WsSession {
            id: Uuid::new_v4(),
            route: route.pattern.raw().to_string(),
            path: path.to_string(),
            params: decoded_params,
            state: AtomicU8::new(SessionState::Connecting as u8),
            outbound: Mutex::new(outbound),
            handlers: route.handlers.clone(),
        });

        self.sessions
            .write()
            .expect("session registry lock poisoned")
            .insert(session.id, session.clone());

        session
            .state
            .store(SessionState::Open as u8, Ordering::SeqCst);
        tracing::debug!(session = %session.id, route = session.route(), "websocket session opened");

        if let Some(connect) = &session.handlers.connect {
            if let Err(exc) = connect(&session) {
                self.fault(&session, &exc);
            }
        }

        Ok(session)
    }

    /// Inbound text frame: dispatch to the route's message handler.
    ///
    /// A failure inside the message handler is a session-level error and is
    /// routed to the error handler — at most once per originating fault.
    /// Nothing is dispatched once the session has left OPEN.
    pub fn handle_message(&self, session: &Arc<WsSession>, message: &str) {
        if !session.is_open() {
            return;
        }
        if let Some(handler) = &session.handlers.message {
            if let Err(exc) = handler(session, message) {
                self.fault(session, &exc);
            }
        }
    }

    /// Transport/protocol fault on an open session: invoke the error
    /// handler, then force the session toward CLOSED.
    pub fn handle_error(&self, session: &Arc<WsSession>, exc: &HandlerException) {
        if session.state() == SessionState::Closed {
            return;
        }
        self.fault(session, exc);
        self.finish(session, FAULT_CLOSE_CODE, "terminal error");
    }

    /// Close notification from the transport. Idempotent: exactly one close
    /// dispatch per session lifecycle, even when the handler thread and the
    /// transport thread both reach it.
    pub fn handle_close(&self, session: &Arc<WsSession>, code: u16, reason: &str) {
        self.finish(session, code, reason);
    }

    /// Number of sessions currently tracked.
    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .expect("session registry lock poisoned")
            .len()
    }

    pub fn session(&self, id: Uuid) -> Option<Arc<WsSession>> {
        self.sessions
            .read()
            .expect("session registry lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Dispatch to the error handler without re-entrancy: a failure inside
    /// the error handler itself is only logged.
    fn fault(&self, session: &Arc<WsSession>, exc: &HandlerException) {
        let Some(handler) = &session.handlers.error else {
            tracing::warn!(session = %session.id, error = %exc, "websocket fault with no error handler");
            return;
        };
        if let Err(nested) = handler(session, exc) {
            tracing::error!(
                session = %session.id,
                error = %nested,
                "websocket error handler failed"
            );
        }
    }

    fn finish(&self, session: &Arc<WsSession>, code: u16, reason: &str) {
        let previous = session.transition_closed();
        if previous == SessionState::Closed {
            return; // already notified
        }

        self.sessions
            .write()
            .expect("session registry lock poisoned")
            .remove(&session.id);
        tracing::debug!(session = %session.id, code, "websocket session closed");

        if let Some(close) = &session.handlers.close {
            if let Err(exc) = close(session, code, reason) {
                tracing::error!(session = %session.id, error = %exc, "websocket close handler failed");
            }
        }
    }
}
