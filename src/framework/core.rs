//! # Core Actor Runtime
//!
//! A small actor runtime: one tokio task and one mpsc mailbox per actor.
//! The gateway only needs two things from its host runtime, and this module provides both:
//!
//! - a way to **deliver** a [`Message`] to a named recipient with a declared sender
//!   ([`ActorRef::tell`]), and
//! - a **message loop** that hands each delivery to an [`Actor`] together with an explicit
//!   [`ActorContext`] (who am I, who is my parent, who sent this).
//!
//! ## Key Types
//!
//! - [`ActorRef`]: cloneable identity + mailbox handle. Equality is by identity, not path.
//! - [`Delivery`]: what actually travels through a mailbox (message + declared sender).
//! - [`Actor`]: the behaviour trait, with a default unhandled-message policy.
//! - [`ActorCell`]: the run loop that owns an actor and its receiver.
//! - [`FrameworkError`]: runtime errors (closed mailboxes).

use crate::message::Message;
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default mailbox capacity used by [`spawn_actor`] callers that don't care.
pub const DEFAULT_MAILBOX_SIZE: usize = 32;

static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

// =============================================================================
// 1. ERRORS
// =============================================================================

/// Errors that can occur within the actor runtime itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FrameworkError {
    #[error("Actor closed: {0}")]
    ActorClosed(String),
}

// =============================================================================
// 2. IDENTITY & DELIVERY
// =============================================================================

/// A message together with the identity the sender chose to declare.
///
/// The declared sender is what recipients use for replies and for the pipe actor's
/// loop-back check, so it is part of the delivery rather than of the message.
#[derive(Debug)]
pub struct Delivery {
    pub message: Message,
    pub sender: Option<ActorRef>,
}

/// Cloneable handle to an actor's mailbox.
///
/// # Identity
/// Every `ActorRef` created through [`ActorRef::new`] gets a process-unique id. Clones
/// share that id, so `a == b` means "the same actor", which is exactly the question the
/// pipe actor asks when it checks whether an envelope came from itself.
#[derive(Clone)]
pub struct ActorRef {
    id: u64,
    path: Arc<str>,
    mailbox: mpsc::Sender<Delivery>,
}

impl ActorRef {
    pub fn new(path: impl Into<Arc<str>>, mailbox: mpsc::Sender<Delivery>) -> Self {
        Self {
            id: NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed),
            path: path.into(),
            mailbox,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true once the receiving actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }

    /// Delivers `message` to this actor, declaring `sender` as its origin.
    ///
    /// Waits for mailbox capacity; fails only if the actor has stopped.
    pub async fn tell(
        &self,
        message: Message,
        sender: Option<&ActorRef>,
    ) -> Result<(), FrameworkError> {
        let delivery = Delivery {
            message,
            sender: sender.cloned(),
        };
        self.mailbox
            .send(delivery)
            .await
            .map_err(|_| FrameworkError::ActorClosed(self.path.to_string()))
    }
}

impl PartialEq for ActorRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ActorRef {}

impl fmt::Debug for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorRef({}#{})", self.path, self.id)
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

// =============================================================================
// 3. BEHAVIOUR
// =============================================================================

/// Per-delivery context handed to [`Actor::receive`].
///
/// The actor's "self" is explicit here instead of being ambient state.
#[derive(Debug, Clone)]
pub struct ActorContext {
    self_ref: ActorRef,
    parent: Option<ActorRef>,
    sender: Option<ActorRef>,
}

impl ActorContext {
    pub fn new(self_ref: ActorRef, parent: Option<ActorRef>, sender: Option<ActorRef>) -> Self {
        Self {
            self_ref,
            parent,
            sender,
        }
    }

    pub fn self_ref(&self) -> &ActorRef {
        &self.self_ref
    }

    pub fn parent(&self) -> Option<&ActorRef> {
        self.parent.as_ref()
    }

    /// The declared sender of the message currently being handled.
    pub fn sender(&self) -> Option<&ActorRef> {
        self.sender.as_ref()
    }

    /// True when the current message was declared as sent by this actor.
    pub fn is_from_self(&self) -> bool {
        self.sender.as_ref() == Some(&self.self_ref)
    }
}

/// Behaviour of an actor hosted by [`ActorCell`].
///
/// Messages are handled one at a time, so implementors can keep plain mutable state.
#[async_trait]
pub trait Actor: Send + 'static {
    /// Handle one delivered message.
    async fn receive(&mut self, message: Message, ctx: &ActorContext);

    /// Default policy for message kinds an actor does not understand: log and drop.
    async fn unhandled(&mut self, message: Message, ctx: &ActorContext) {
        warn!(
            actor = %ctx.self_ref(),
            kind = message.kind(),
            sender = ?ctx.sender(),
            "Unhandled message"
        );
    }
}

// =============================================================================
// 4. THE RUN LOOP
// =============================================================================

/// Owns an actor and the receiving half of its mailbox.
///
/// The cell keeps only a weak handle to its own mailbox, so the loop ends once every
/// external [`ActorRef`] (including ones parked inside in-flight envelopes) is dropped.
pub struct ActorCell<A: Actor> {
    actor: A,
    receiver: mpsc::Receiver<Delivery>,
    id: u64,
    path: Arc<str>,
    weak: mpsc::WeakSender<Delivery>,
    parent: Option<ActorRef>,
}

impl<A: Actor> ActorCell<A> {
    /// Creates the cell and the first strong reference to it.
    pub fn new(
        actor: A,
        path: impl Into<Arc<str>>,
        buffer_size: usize,
        parent: Option<ActorRef>,
    ) -> (Self, ActorRef) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let weak = sender.downgrade();
        let actor_ref = ActorRef::new(path, sender);
        let cell = Self {
            actor,
            receiver,
            id: actor_ref.id,
            path: actor_ref.path.clone(),
            weak,
            parent,
        };
        (cell, actor_ref)
    }

    /// Runs the actor's message loop until its mailbox closes.
    pub async fn run(mut self) {
        info!(actor = %self.path, "Actor started");
        let mut handled: u64 = 0;

        while let Some(Delivery { message, sender }) = self.receiver.recv().await {
            // A delivery can still be queued after the last strong ref went away.
            let Some(mailbox) = self.weak.upgrade() else {
                break;
            };
            let self_ref = ActorRef {
                id: self.id,
                path: self.path.clone(),
                mailbox,
            };
            debug!(actor = %self.path, kind = message.kind(), sender = ?sender, "Receive");
            let ctx = ActorContext::new(self_ref, self.parent.clone(), sender);
            self.actor.receive(message, &ctx).await;
            handled += 1;
        }

        info!(actor = %self.path, handled, "Shutdown");
    }
}

/// Spawns `actor` on the current tokio runtime.
pub fn spawn_actor<A: Actor>(
    actor: A,
    path: impl Into<Arc<str>>,
    buffer_size: usize,
    parent: Option<ActorRef>,
) -> (ActorRef, JoinHandle<()>) {
    let (cell, actor_ref) = ActorCell::new(actor, path, buffer_size, parent);
    let handle = tokio::spawn(cell.run());
    (actor_ref, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::GetRequest;

    /// Records what it sees so the test can inspect it afterwards.
    struct Recorder {
        seen: mpsc::UnboundedSender<(String, bool)>,
    }

    #[async_trait]
    impl Actor for Recorder {
        async fn receive(&mut self, message: Message, ctx: &ActorContext) {
            match message {
                Message::Get(get) => {
                    let _ = self.seen.send((get.url, ctx.is_from_self()));
                }
                other => self.unhandled(other, ctx).await,
            }
        }
    }

    #[tokio::test]
    async fn test_actor_receives_with_declared_sender() {
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        let (actor_ref, handle) = spawn_actor(Recorder { seen: seen_tx }, "recorder", 8, None);

        let get = || Message::Get(GetRequest::new("http://example.test/"));
        actor_ref.tell(get(), None).await.unwrap();
        actor_ref.tell(get(), Some(&actor_ref)).await.unwrap();
        // Unhandled kinds are dropped, not fatal.
        actor_ref.tell(Message::StreamEnd, None).await.unwrap();

        assert_eq!(seen_rx.recv().await, Some(("http://example.test/".into(), false)));
        assert_eq!(seen_rx.recv().await, Some(("http://example.test/".into(), true)));

        drop(actor_ref);
        handle.await.unwrap();
        assert!(seen_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_identity_is_by_id_not_path() {
        let (tx_a, _rx_a) = mpsc::channel(1);
        let (tx_b, _rx_b) = mpsc::channel(1);
        let a = ActorRef::new("same", tx_a);
        let b = ActorRef::new("same", tx_b);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[tokio::test]
    async fn test_tell_to_stopped_actor_fails() {
        let (tx, rx) = mpsc::channel(1);
        let gone = ActorRef::new("gone", tx);
        drop(rx);
        let err = gone.tell(Message::StreamEnd, None).await.unwrap_err();
        assert_eq!(err, FrameworkError::ActorClosed("gone".into()));
        assert!(gone.is_closed());
    }
}
