//! [`Transport`] backed by a shared `reqwest::Client`.

use super::sse::SseParser;
use super::{EventStream, Transport, TransportConfig, TransportError};
use crate::message::StreamFailure;
use crate::model::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use futures::{future, stream, StreamExt};
use reqwest::redirect::Policy;
use tracing::{debug, instrument};

const EVENT_STREAM: &str = "text/event-stream";

/// The production transport.
///
/// Owns one connection pool (and cookie jar) for the whole process. Build it once from a
/// [`TransportConfig`] and share it; cloning is cheap.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl ReqwestTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let redirect = if config.follow_redirects {
            Policy::limited(config.max_redirects)
        } else {
            Policy::none()
        };

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .redirect(redirect)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .cookie_store(config.cookie_store)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    fn prepare(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self
            .prepare(request)
            .timeout(self.config.write_timeout)
            .send()
            .await?;
        let head = response_head(&response);
        let body = response.bytes().await?;
        debug!(status = head.status, bytes = body.len(), "Response received");
        Ok(head.with_body(body))
    }

    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn event_stream(&self, mut request: HttpRequest) -> Result<EventStream, StreamFailure> {
        if request.header("accept").is_none() {
            request
                .headers
                .push(("Accept".to_string(), EVENT_STREAM.to_string()));
        }

        let response = self
            .prepare(request)
            .send()
            .await
            .map_err(|e| StreamFailure::from(TransportError::from(e)))?;
        let head = response_head(&response);

        if !head.is_success() {
            return Err(StreamFailure::new(None, Some(head)));
        }
        let content_type = head.header("content-type").unwrap_or_default();
        if !content_type.starts_with(EVENT_STREAM) {
            let cause = TransportError::Protocol(format!("Invalid content-type: {content_type}"));
            return Err(StreamFailure::new(Some(cause), Some(head)));
        }
        debug!(status = head.status, "Event stream opened");

        let events = response
            .bytes_stream()
            .scan(SseParser::new(), |parser, chunk| {
                let parsed: Vec<_> = match chunk {
                    Ok(bytes) => parser.feed(&bytes).into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(TransportError::from(e))],
                };
                future::ready(Some(stream::iter(parsed)))
            })
            .flatten()
            .boxed();

        Ok(EventStream {
            response: head,
            events,
        })
    }
}

/// Status, final URL and headers; the body is left to the caller.
fn response_head(response: &reqwest::Response) -> HttpResponse {
    let mut head = HttpResponse::new(response.status().as_u16(), response.url().as_str());
    for (name, value) in response.headers() {
        head = head.with_header(
            name.as_str(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }
    head
}
