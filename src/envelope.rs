//! # Request/Response Envelope
//!
//! The unit of correlation between an actor that wants an HTTP call made and the reply it
//! eventually receives. An [`Envelope`] travels out with only its request filled in and
//! comes back, exactly once, with either a response or a failure.

use crate::framework::ActorRef;
use crate::model::{HttpRequest, HttpResponse};
use crate::transport::TransportError;
use serde::Serialize;
use serde_json::Value;

/// Generic request/response message.
///
/// # Invariant
/// The outcome is stored as a single `Option<Result<..>>`: before completion both
/// [`response`](Envelope::response) and [`failure`](Envelope::failure) are `None`; after
/// completion exactly one of them is `Some`.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub request: HttpRequest,
    /// Companion value returned untouched, usually whatever prompted the request.
    pub tag: Option<Value>,
    sender: ActorRef,
    key: Option<String>,
    outcome: Option<Result<HttpResponse, TransportError>>,
}

impl Envelope {
    /// A fresh envelope whose reply goes to `sender`.
    pub fn new(sender: ActorRef, request: HttpRequest) -> Self {
        Self {
            request,
            tag: None,
            sender,
            key: None,
            outcome: None,
        }
    }

    /// A fresh envelope carrying an already-encoded tag.
    pub fn with_tag(sender: ActorRef, request: HttpRequest, tag: Option<Value>) -> Self {
        Self {
            tag,
            ..Self::new(sender, request)
        }
    }

    /// A fresh envelope tagged with any serializable value.
    pub fn tagged<T: Serialize>(
        sender: ActorRef,
        request: HttpRequest,
        tag: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::with_tag(sender, request, Some(serde_json::to_value(tag)?)))
    }

    /// Overrides the correlation key (defaults to the request host).
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Who receives this envelope once it is completed.
    pub fn sender(&self) -> &ActorRef {
        &self.sender
    }

    /// Correlation key: the override if set, else the request host.
    pub fn key(&self) -> &str {
        match &self.key {
            Some(key) => key,
            None => self.request.host().unwrap_or_default(),
        }
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.outcome.as_ref().and_then(|o| o.as_ref().ok())
    }

    pub fn failure(&self) -> Option<&TransportError> {
        self.outcome.as_ref().and_then(|o| o.as_ref().err())
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    /// Takes the outcome out of a completed envelope.
    pub fn into_result(self) -> Option<Result<HttpResponse, TransportError>> {
        self.outcome
    }

    /// Records the transport's outcome. Only the dispatcher completes envelopes.
    pub(crate) fn complete(&mut self, outcome: Result<HttpResponse, TransportError>) {
        debug_assert!(self.outcome.is_none(), "envelope completed twice");
        self.outcome = Some(outcome);
    }
}
