use crate::framework::ActorRef;
use crate::message::{Message, StreamData, StreamFailure};
use crate::transport::SseEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Translates one stream's transport events into actor messages.
///
/// Bound to a single `consumer` (receives everything) and a single `owner` (receives
/// `StreamStart`'s declared sender and the terminal message).
///
/// # Ordering guarantees
/// - `StreamStart` is sent at most once, and before any `StreamData`.
/// - Exactly one terminal message (`StreamEnd` or `StreamFailure`) is ever emitted, to the
///   consumer first and then the owner.
/// - Nothing is sent after the terminal message.
#[derive(Debug)]
pub struct StreamListener {
    consumer: ActorRef,
    owner: ActorRef,
    started: AtomicBool,
    terminated: AtomicBool,
}

impl StreamListener {
    pub fn new(consumer: ActorRef, owner: ActorRef) -> Self {
        Self {
            consumer,
            owner,
            started: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub async fn on_open(&self) {
        if self.is_terminated() || self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(consumer = %self.consumer, owner = %self.owner, "Stream opened");
        self.deliver(&self.consumer, Message::StreamStart, Some(&self.owner))
            .await;
    }

    pub async fn on_event(&self, event: SseEvent) {
        if self.is_terminated() || !self.started.load(Ordering::Acquire) {
            return;
        }
        debug!(id = ?event.id, event_type = ?event.event_type, "Stream data");
        let data = StreamData::new(event.id, event.event_type, event.data);
        self.deliver(&self.consumer, Message::StreamData(data), None)
            .await;
    }

    pub async fn on_closed(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(consumer = %self.consumer, "Stream closed");
        self.deliver(&self.consumer, Message::StreamEnd, None).await;
        self.deliver(&self.owner, Message::StreamEnd, None).await;
    }

    pub async fn on_failure(&self, failure: StreamFailure) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        match &failure.cause {
            Some(cause) => warn!(consumer = %self.consumer, error = %cause, "Stream failed"),
            None => warn!(
                consumer = %self.consumer,
                status = failure.response.as_ref().map(|r| r.status),
                "Stream rejected"
            ),
        }
        self.deliver(
            &self.consumer,
            Message::StreamFailure(failure.clone()),
            None,
        )
        .await;
        self.deliver(&self.owner, Message::StreamFailure(failure), None)
            .await;
    }

    async fn deliver(&self, to: &ActorRef, message: Message, sender: Option<&ActorRef>) {
        let kind = message.kind();
        if let Err(e) = to.tell(message, sender).await {
            warn!(recipient = %to, kind, error = %e, "Dead letter");
        }
    }
}
