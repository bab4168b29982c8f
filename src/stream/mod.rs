//! # Streaming
//!
//! Server-sent-event streams delivered as actor messages.
//!
//! [`StreamSession`] owns one open stream: it awaits the transport's events in order and
//! hands each to a [`StreamListener`], which turns them into `StreamStart`, `StreamData`,
//! `StreamEnd` and `StreamFailure` deliveries. The caller keeps a [`StreamHandle`] for
//! cancellation.

pub mod listener;
pub mod session;

pub use listener::StreamListener;
pub use session::{StreamHandle, StreamSession};
