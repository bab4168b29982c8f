use crate::framework::ActorRef;
use crate::message::{Message, SocketEvent};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Close status used when the peer sent no code.
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Close status used when the connection dropped without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// One WebSocket connection as seen by its handler.
#[derive(Debug, Clone)]
pub struct SocketSession {
    id: u64,
    url: Arc<str>,
    open: Arc<AtomicBool>,
}

impl SocketSession {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            url: url.into(),
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Returns true if this call did the closing.
    pub(crate) fn mark_closed(&self) -> bool {
        self.open.swap(false, Ordering::AcqRel)
    }
}

/// Why a connection closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: String,
}

impl CloseReason {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::new(CLOSE_ABNORMAL, reason)
    }
}

/// Callbacks for a WebSocket connection.
///
/// `on_open` runs once before any message; `on_close` runs once, last.
#[async_trait]
pub trait WebSocketHandler: Send + Sync + 'static {
    async fn on_open(&self, session: &SocketSession);
    async fn on_close(&self, session: &SocketSession, reason: CloseReason);
    async fn on_message(&self, text: String);
}

/// Forwards socket callbacks to one actor as [`Message::Socket`].
#[derive(Debug, Clone)]
pub struct ActorSocketHandler {
    actor: ActorRef,
}

impl ActorSocketHandler {
    pub fn new(actor: ActorRef) -> Self {
        Self { actor }
    }

    async fn deliver(&self, event: SocketEvent) {
        if let Err(e) = self.actor.tell(Message::Socket(event), None).await {
            warn!(recipient = %self.actor, error = %e, "Dead letter: socket event");
        }
    }
}

#[async_trait]
impl WebSocketHandler for ActorSocketHandler {
    async fn on_open(&self, session: &SocketSession) {
        self.deliver(SocketEvent::Opened {
            session: session.id(),
            url: session.url().to_string(),
        })
        .await;
    }

    async fn on_close(&self, session: &SocketSession, reason: CloseReason) {
        self.deliver(SocketEvent::Closed {
            session: session.id(),
            code: reason.code,
            reason: reason.reason,
        })
        .await;
    }

    async fn on_message(&self, text: String) {
        self.deliver(SocketEvent::Text(text)).await;
    }
}
