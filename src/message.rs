//! # Messages
//!
//! Every mailbox in the gateway carries one closed type, [`Message`]. Recipients match on
//! it exhaustively; anything they don't understand goes to
//! [`Actor::unhandled`](crate::framework::Actor::unhandled).

use crate::envelope::Envelope;
use crate::model::{HttpRequest, HttpResponse, RequestError};
use crate::transport::TransportError;

/// Everything the gateway delivers, and everything a gateway actor accepts.
#[derive(Debug)]
pub enum Message {
    /// A request to perform, or a completed request coming back.
    Envelope(Envelope),
    /// Plain "fetch this URL" request.
    Get(GetRequest),
    /// A stream opened. The declared sender is the stream's owner.
    StreamStart,
    /// One server-sent event.
    StreamData(StreamData),
    /// A stream closed normally.
    StreamEnd,
    /// A stream failed, or was cancelled.
    StreamFailure(StreamFailure),
    /// Lifecycle or text from a WebSocket connection.
    Socket(SocketEvent),
}

impl Message {
    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Envelope(_) => "Envelope",
            Message::Get(_) => "Get",
            Message::StreamStart => "StreamStart",
            Message::StreamData(_) => "StreamData",
            Message::StreamEnd => "StreamEnd",
            Message::StreamFailure(_) => "StreamFailure",
            Message::Socket(_) => "Socket",
        }
    }

    /// True for the two messages that end a stream session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Message::StreamEnd | Message::StreamFailure(_))
    }
}

/// Do a GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub url: String,
}

impl GetRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn into_request(self) -> Result<HttpRequest, RequestError> {
        HttpRequest::get(&self.url)
    }
}

/// A server-sent data packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamData {
    /// Id from the streaming source.
    pub id: Option<String>,
    /// Event type from the streaming source.
    pub event_type: Option<String>,
    pub data: String,
}

impl StreamData {
    pub fn new(id: Option<String>, event_type: Option<String>, data: impl Into<String>) -> Self {
        Self {
            id,
            event_type,
            data: data.into(),
        }
    }
}

/// Why a stream ended abnormally, with whatever response head was received.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamFailure {
    pub cause: Option<TransportError>,
    pub response: Option<HttpResponse>,
}

impl StreamFailure {
    pub fn new(cause: Option<TransportError>, response: Option<HttpResponse>) -> Self {
        Self { cause, response }
    }

    pub fn cancelled() -> Self {
        Self::new(Some(TransportError::Cancelled), None)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cause == Some(TransportError::Cancelled)
    }
}

impl From<TransportError> for StreamFailure {
    fn from(cause: TransportError) -> Self {
        Self::new(Some(cause), None)
    }
}

/// WebSocket lifecycle translated for an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened { session: u64, url: String },
    Closed { session: u64, code: u16, reason: String },
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_USER_AGENT;
    use reqwest::Method;

    #[test]
    fn test_only_end_and_failure_are_terminal() {
        assert!(Message::StreamEnd.is_terminal());
        assert!(Message::StreamFailure(StreamFailure::cancelled()).is_terminal());
        assert!(!Message::StreamStart.is_terminal());
        assert!(!Message::StreamData(StreamData::new(None, None, "x")).is_terminal());
        assert!(!Message::Get(GetRequest::new("http://example.test/")).is_terminal());
    }

    #[test]
    fn test_get_request_builds_a_plain_get() {
        let request = GetRequest::new("http://example.test/items?page=2")
            .into_request()
            .unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url.as_str(), "http://example.test/items?page=2");
        assert_eq!(request.header("user-agent"), Some(DEFAULT_USER_AGENT));
        assert_eq!(request.body, None);

        let err = GetRequest::new("not a url").into_request().unwrap_err();
        assert!(matches!(err, RequestError::InvalidUrl { .. }));
    }
}
