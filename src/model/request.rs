use bytes::Bytes;
use reqwest::{Method, Url};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Header added when the caller did not supply a `User-Agent`.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:91.0) Gecko/20100101 Firefox/91.0";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Errors raised while building a request, before anything touches the network.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RequestError {
    /// Only GET, POST, PUT, DELETE and HEAD are supported.
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// The URL could not be parsed.
    #[error("Invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A JSON body could not be serialized.
    #[error("Body serialization failed: {0}")]
    Body(String),
}

/// An outbound HTTP request description.
///
/// This is plain data: building one never performs I/O, and it can be cloned freely
/// into envelopes and resubmitted.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Builds a request from its parts.
    ///
    /// `method` must be one of `GET`, `POST`, `PUT`, `DELETE` or `HEAD`. A bodyless `GET`
    /// or `HEAD` drops any supplied body. A default `User-Agent` is added unless `headers`
    /// already carries one.
    pub fn build<I, K, V>(
        url: &str,
        method: &str,
        body: Option<Bytes>,
        headers: I,
    ) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let method = match method {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "HEAD" => Method::HEAD,
            other => {
                warn!(method = other, "Bad method");
                return Err(RequestError::UnsupportedMethod(other.to_string()));
            }
        };
        let url = parse_url(url)?;

        let mut headers: Vec<(String, String)> = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if !headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("user-agent"))
        {
            headers.push(("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string()));
        }

        let body = match method {
            Method::GET | Method::HEAD => None,
            _ => body,
        };

        Ok(Self {
            method,
            url,
            headers,
            body,
        })
    }

    /// `GET` with default headers.
    pub fn get(url: &str) -> Result<Self, RequestError> {
        Self::build(url, "GET", None, Vec::<(String, String)>::new())
    }

    /// `GET` with the given headers.
    pub fn get_with_headers<I, K, V>(url: &str, headers: I) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::build(url, "GET", None, headers)
    }

    /// `POST` of a pre-encoded JSON string.
    pub fn post<I, K, V>(
        url: &str,
        body: impl Into<String>,
        headers: I,
    ) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut request = Self::build(url, "POST", Some(Bytes::from(body.into())), headers)?;
        request.set_default_header("Content-Type", JSON_CONTENT_TYPE);
        Ok(request)
    }

    /// `POST` of any serializable value, encoded as JSON.
    pub fn post_json<T, I, K, V>(url: &str, body: &T, headers: I) -> Result<Self, RequestError>
    where
        T: Serialize + ?Sized,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let encoded = serde_json::to_string(body).map_err(|e| RequestError::Body(e.to_string()))?;
        Self::post(url, encoded, headers)
    }

    /// The request's target host, if the URL has one.
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn set_default_header(&mut self, name: &str, value: &str) {
        if self.header(name).is_none() {
            self.headers.push((name.to_string(), value.to_string()));
        }
    }
}

/// Appends query parameters to `base`, skipping parameters whose value is `None`.
pub fn build_url<'a, I>(base: &str, params: I) -> Result<String, RequestError>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut url = parse_url(base)?;
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            if let Some(value) = value {
                pairs.append_pair(key, value);
            }
        }
    }
    // An empty `query_pairs_mut` session leaves a dangling `?`.
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url.to_string())
}

fn parse_url(url: &str) -> Result<Url, RequestError> {
    Url::parse(url).map_err(|e| RequestError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
