//! # Mock Actors
//!
//! Utilities for asserting what the gateway delivers without spawning real actors.
//!
//! A mock actor is an [`ActorRef`] whose mailbox receiver stays in the test's hands. Pass the
//! mock actor wherever the gateway expects a recipient (envelope sender, stream consumer,
//! stream owner, pipe parent) and then pull deliveries off the receiver with the
//! `expect_*` helpers.
//!
//! ```ignore
//! let (consumer, mut inbox) = create_mock_actor("consumer", 16);
//! // ... open a stream with `consumer` ...
//! let start = expect_delivery(&mut inbox).await.expect("Expected StreamStart");
//! assert!(matches!(start.message, Message::StreamStart));
//! ```

use crate::envelope::Envelope;
use crate::framework::{ActorRef, Delivery};
use crate::message::Message;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long the `expect_*` helpers wait before giving up.
pub const EXPECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates a mock actor and the receiver for asserting deliveries.
///
/// # Testing Strategy
/// Rather than spinning up an [`Actor`](crate::framework::Actor) that records what it sees,
/// tests hold the receiving half of the mailbox directly. This keeps assertions in the
/// test body and makes ordering checks trivial.
pub fn create_mock_actor(path: &str, buffer_size: usize) -> (ActorRef, mpsc::Receiver<Delivery>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ActorRef::new(path, sender), receiver)
}

/// Waits for the next delivery, or `None` on timeout or a closed mailbox.
pub async fn expect_delivery(receiver: &mut mpsc::Receiver<Delivery>) -> Option<Delivery> {
    tokio::time::timeout(EXPECT_TIMEOUT, receiver.recv())
        .await
        .ok()
        .flatten()
}

/// Waits for the next delivery and requires it to be an envelope.
pub async fn expect_envelope(
    receiver: &mut mpsc::Receiver<Delivery>,
) -> Option<(Envelope, Option<ActorRef>)> {
    match expect_delivery(receiver).await {
        Some(Delivery {
            message: Message::Envelope(envelope),
            sender,
        }) => Some((envelope, sender)),
        _ => None,
    }
}

/// Asserts that nothing arrives within `quiet`.
pub async fn expect_silence(receiver: &mut mpsc::Receiver<Delivery>, quiet: Duration) -> bool {
    tokio::time::timeout(quiet, receiver.recv()).await.is_err()
}

/// Drains every delivery that arrives until the mailbox stays quiet for `quiet`.
pub async fn drain(receiver: &mut mpsc::Receiver<Delivery>, quiet: Duration) -> Vec<Delivery> {
    let mut out = Vec::new();
    while let Ok(Some(delivery)) = tokio::time::timeout(quiet, receiver.recv()).await {
        out.push(delivery);
    }
    out
}
