//! # Mock Transport
//!
//! A scripted [`Transport`] for testing the gateway without a network.
//!
//! Expectations are queued in order and consumed one per call. Each call is matched by
//! URL; a call with no matching expectation resolves with a
//! `TransportError::Protocol("unexpected ...")` failure, which makes the mismatch visible in
//! the envelope or stream message the test is already inspecting.
//!
//! ```ignore
//! let mock = MockTransport::new();
//! mock.expect_request("http://example.test/ok")
//!     .return_ok(HttpResponse::new(200, "http://example.test/ok"));
//! mock.expect_stream("http://example.test/events")
//!     .emit(Some("1"), Some("msg"), "hello")
//!     .close();
//!
//! let transport: Arc<dyn Transport> = Arc::new(mock.clone());
//! // ... drive the dispatcher ...
//! mock.verify(); // Ensures all expectations were met
//! ```

use super::{EventStream, SseEvent, Transport, TransportError};
use crate::message::StreamFailure;
use crate::model::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a scripted stream finishes after its events.
#[derive(Debug, Clone)]
enum StreamEnding {
    Close,
    Fail(TransportError),
    HoldOpen,
}

#[derive(Debug)]
enum Expectation {
    Request {
        url: String,
        response: Result<HttpResponse, TransportError>,
        delay: Option<Duration>,
    },
    Stream {
        url: String,
        open: Result<HttpResponse, StreamFailure>,
        events: Vec<SseEvent>,
        ending: StreamEnding,
        delay: Option<Duration>,
    },
}

impl Expectation {
    fn url(&self) -> &str {
        match self {
            Expectation::Request { url, .. } | Expectation::Stream { url, .. } => url,
        }
    }
}

/// A transport that answers from a queue of expectations.
#[derive(Clone, Default)]
pub struct MockTransport {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    /// Creates a new mock transport with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects an `execute` call for `url`.
    pub fn expect_request(&self, url: &str) -> RequestExpectationBuilder {
        RequestExpectationBuilder {
            url: url.to_string(),
            delay: None,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects an `event_stream` call for `url`.
    pub fn expect_stream(&self, url: &str) -> StreamExpectationBuilder {
        StreamExpectationBuilder {
            url: url.to_string(),
            events: Vec::new(),
            delay: None,
            expectations: self.expectations.clone(),
        }
    }

    /// Number of calls made so far, matched or not.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received so far, in call order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }

    fn take(&self, request: &HttpRequest) -> Option<Expectation> {
        self.requests.lock().unwrap().push(request.clone());
        let mut exps = self.expectations.lock().unwrap();
        let position = exps.iter().position(|e| e.url() == request.url.as_str())?;
        exps.remove(position)
    }
}

fn unexpected(request: &HttpRequest) -> TransportError {
    TransportError::Protocol(format!("unexpected {} {}", request.method, request.url))
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        match self.take(&request) {
            Some(Expectation::Request {
                response, delay, ..
            }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            _ => Err(unexpected(&request)),
        }
    }

    async fn event_stream(&self, request: HttpRequest) -> Result<EventStream, StreamFailure> {
        let Some(Expectation::Stream {
            open,
            events,
            ending,
            delay,
            ..
        }) = self.take(&request)
        else {
            return Err(StreamFailure::from(unexpected(&request)));
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let response = open?;
        let scripted = stream::iter(events.into_iter().map(Ok));
        let events = match ending {
            StreamEnding::Close => scripted.boxed(),
            StreamEnding::Fail(e) => scripted.chain(stream::once(async move { Err(e) })).boxed(),
            StreamEnding::HoldOpen => scripted.chain(stream::pending()).boxed(),
        };
        Ok(EventStream { response, events })
    }
}

/// Builder for `execute` expectations.
pub struct RequestExpectationBuilder {
    url: String,
    delay: Option<Duration>,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl RequestExpectationBuilder {
    /// Resolves only after `delay`.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, response: HttpResponse) {
        self.push(Ok(response));
    }

    /// Sets the expectation to return a transport failure.
    pub fn return_err(self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<HttpResponse, TransportError>) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation::Request {
            url: self.url,
            response,
            delay: self.delay,
        });
    }
}

/// Builder for `event_stream` expectations.
pub struct StreamExpectationBuilder {
    url: String,
    events: Vec<SseEvent>,
    delay: Option<Duration>,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl StreamExpectationBuilder {
    /// The stream opens (or is rejected) only after `delay`.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues one event to be emitted after the stream opens.
    pub fn emit(mut self, id: Option<&str>, event_type: Option<&str>, data: &str) -> Self {
        self.events.push(SseEvent {
            id: id.map(str::to_string),
            event_type: event_type.map(str::to_string),
            data: data.to_string(),
            retry: None,
        });
        self
    }

    /// The server closes the stream after the queued events.
    pub fn close(self) {
        self.push(StreamEnding::Close);
    }

    /// Reading fails with `error` after the queued events.
    pub fn fail(self, error: TransportError) {
        self.push(StreamEnding::Fail(error));
    }

    /// The stream stays open after the queued events until cancelled.
    pub fn hold_open(self) {
        self.push(StreamEnding::HoldOpen);
    }

    /// The server answers, but the stream never opens.
    pub fn reject(self, failure: StreamFailure) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation::Stream {
            url: self.url,
            open: Err(failure),
            events: Vec::new(),
            ending: StreamEnding::Close,
            delay: self.delay,
        });
    }

    fn push(self, ending: StreamEnding) {
        let open = Ok(HttpResponse::new(200, self.url.clone())
            .with_header("content-type", "text/event-stream"));
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation::Stream {
            url: self.url,
            open,
            events: self.events,
            ending,
            delay: self.delay,
        });
    }
}
