//! # Correlation Dispatcher
//!
//! [`HttpDispatcher`] takes an [`Envelope`], runs its request on the transport without
//! blocking the caller, fills in the outcome and delivers the envelope back to the actor
//! recorded in it, declaring the acting component as the sender.
//!
//! It is also the entry point for streams ([`HttpDispatcher::open_stream`]) and for the
//! rarely needed blocking call ([`HttpDispatcher::request_blocking`]).

use crate::envelope::Envelope;
use crate::framework::ActorRef;
use crate::message::Message;
use crate::model::{HttpRequest, HttpResponse, RequestError};
use crate::stream::{StreamHandle, StreamListener, StreamSession};
use crate::transport::{Transport, TransportError};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

/// Errors surfaced by the dispatcher's own entry points.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The dispatcher was created outside a tokio runtime.
    #[error("No tokio runtime available")]
    NoRuntime,

    /// The task performing a blocking request went away without answering.
    #[error("Blocking request abandoned")]
    Abandoned,

    /// An actor task panicked or was aborted during shutdown.
    #[error("Actor task failed: {0}")]
    ActorFailed(String),
}

/// Dispatches envelopes and streams over a shared [`Transport`].
///
/// Cheap to clone; every clone shares the same transport and runtime handle.
#[derive(Clone)]
pub struct HttpDispatcher {
    transport: Arc<dyn Transport>,
    runtime: Handle,
}

impl HttpDispatcher {
    /// Binds the dispatcher to `transport` and to the current tokio runtime.
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self, GatewayError> {
        let runtime = Handle::try_current().map_err(|_| GatewayError::NoRuntime)?;
        Ok(Self::with_runtime(transport, runtime))
    }

    pub fn with_runtime(transport: Arc<dyn Transport>, runtime: Handle) -> Self {
        Self { transport, runtime }
    }

    /// Performs the envelope's request and delivers the completed envelope to its sender.
    ///
    /// Returns immediately. On completion exactly one of `response` / `failure` is set and
    /// the envelope is told to [`Envelope::sender`] with `acting` as declared sender. A
    /// closed recipient is logged as a dead letter; nothing is retried.
    #[instrument(skip_all, fields(key = %envelope.key(), url = %envelope.request.url))]
    pub fn dispatch(&self, mut envelope: Envelope, acting: &ActorRef) {
        debug!(method = %envelope.request.method, recipient = %envelope.sender(), "Dispatch");
        let transport = self.transport.clone();
        let acting = acting.clone();

        self.runtime.spawn(async move {
            let outcome = transport.execute(envelope.request.clone()).await;
            match &outcome {
                Ok(response) => debug!(key = envelope.key(), status = response.status, "Completed"),
                Err(e) => warn!(key = envelope.key(), error = %e, "Request failed"),
            }
            envelope.complete(outcome);

            let recipient = envelope.sender().clone();
            if let Err(e) = recipient.tell(Message::Envelope(envelope), Some(&acting)).await {
                warn!(error = %e, "Dead letter: envelope recipient has stopped");
            }
        });
    }

    /// Simple case: GET on `url`, reply to `acting`.
    pub fn get(&self, url: &str, acting: &ActorRef) -> Result<(), GatewayError> {
        let request = HttpRequest::get(url)?;
        self.dispatch(Envelope::new(acting.clone(), request), acting);
        Ok(())
    }

    /// GET on `url` with headers; a `User-Agent` is added if missing.
    pub fn get_with_headers<I, K, V>(
        &self,
        url: &str,
        headers: I,
        acting: &ActorRef,
    ) -> Result<(), GatewayError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let request = HttpRequest::get_with_headers(url, headers)?;
        self.dispatch(Envelope::new(acting.clone(), request), acting);
        Ok(())
    }

    /// GET on `url` with a tag that rides along with the request and response.
    pub fn get_tagged(&self, url: &str, tag: Value, acting: &ActorRef) -> Result<(), GatewayError> {
        let request = HttpRequest::get(url)?;
        self.dispatch(Envelope::with_tag(acting.clone(), request, Some(tag)), acting);
        Ok(())
    }

    /// Synchronous request: blocks the calling thread until the response or failure.
    ///
    /// Performs no actor delivery. Call it from outside the async executor, for example
    /// inside `tokio::task::spawn_blocking` or a plain thread.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context.
    pub fn request_blocking(&self, request: HttpRequest) -> Result<HttpResponse, GatewayError> {
        let transport = self.transport.clone();
        let (tx, rx) = oneshot::channel();
        self.runtime.spawn(async move {
            let _ = tx.send(transport.execute(request).await);
        });
        let outcome = rx.blocking_recv().map_err(|_| GatewayError::Abandoned)?;
        Ok(outcome?)
    }

    /// Opens a server-sent-event stream on behalf of `owner`, delivering to `consumer`.
    ///
    /// Returns at once with a handle that either party holding it may cancel.
    #[instrument(skip_all, fields(url = %request.url, consumer = %consumer, owner = %owner))]
    pub fn open_stream(
        &self,
        request: HttpRequest,
        consumer: ActorRef,
        owner: ActorRef,
    ) -> StreamHandle {
        info!("Opening stream");
        let listener = StreamListener::new(consumer, owner);
        StreamSession::spawn(&self.runtime, self.transport.clone(), request, listener)
    }
}
