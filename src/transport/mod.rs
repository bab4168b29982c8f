//! # Transport Facade
//!
//! The gateway never talks to the network directly. It goes through [`Transport`], which
//! exposes exactly what the correlation and streaming layers need:
//!
//! - [`Transport::execute`]: perform one request and resolve with the full response.
//! - [`Transport::event_stream`]: open a server-sent-event stream.
//!
//! The blocking call is layered on top of `execute` by
//! [`HttpDispatcher::request_blocking`](crate::dispatcher::HttpDispatcher::request_blocking).
//!
//! The production implementation is [`ReqwestTransport`]. Tests use [`mock::MockTransport`].
//! Construct the transport once at start-up and share it as an `Arc<dyn Transport>`.

pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod sse;

pub use client::ReqwestTransport;
pub use config::TransportConfig;
pub use error::TransportError;
pub use sse::SseEvent;

use crate::message::StreamFailure;
use crate::model::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// An opened event stream: the response head plus the events still to come.
///
/// The event stream ends with `None` when the server closes the connection, or yields an
/// `Err` once if reading fails.
pub struct EventStream {
    pub response: HttpResponse,
    pub events: BoxStream<'static, Result<SseEvent, TransportError>>,
}

/// Opaque HTTP execution capability.
///
/// Implementations run their I/O on their own tasks; callers only ever await the
/// returned futures.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Performs `request` and resolves with the complete response.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Opens a server-sent-event stream.
    ///
    /// Fails with a [`StreamFailure`] carrying the response head when the server answers
    /// but not with a successful `text/event-stream`.
    async fn event_stream(&self, request: HttpRequest) -> Result<EventStream, StreamFailure>;
}
