//! Transport module - the HTTP-shaped boundary between rpcwire and a network.
//!
//! rpcwire does not ship an HTTP stack. A client binding implements
//! [`HttpClient`]; a server binding feeds requests into a
//! [`Router`](crate::handler::Router). [`LocalTransport`] connects the two
//! in-process, which is what tests and embedded setups use.
//!
//! Request headers are a plain string map; response headers may repeat and
//! map to a list of values.

mod local;

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::Result;
use crate::BoxFuture;

pub use local::LocalTransport;

/// Name of the header that selects the body format.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Media type of plain text error bodies.
pub const TEXT_MEDIA_TYPE: &str = "text/plain; charset=utf-8";

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Delete => "DELETE",
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Trace => "TRACE",
        }
    }
}

/// A request or response body together with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub content: Bytes,
    pub media_type: Option<String>,
}

impl Body {
    pub fn new(content: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            media_type: Some(media_type.into()),
        }
    }
}

/// An outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub body: Option<Body>,
    pub headers: HashMap<String, String>,
}

impl HttpRequest {
    /// Media type of the body, falling back to the `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|body| body.media_type.as_deref())
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE))
                    .map(|(_, value)| value.as_str())
            })
    }
}

/// Status line of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStatus {
    pub code: u16,
    pub message: String,
}

impl HttpStatus {
    /// Status with the standard reason phrase for `code`.
    pub fn new(code: u16) -> Self {
        Self {
            code,
            message: reason_phrase(code).to_string(),
        }
    }

    /// Whether the code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// An incoming response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: HttpStatus,
    pub body: Option<Body>,
    pub headers: HashMap<String, Vec<String>>,
}

impl HttpResponse {
    /// Media type of the body, falling back to the `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|body| body.media_type.as_deref())
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE))
                    .and_then(|(_, values)| values.first())
                    .map(String::as_str)
            })
    }
}

/// Client side of a transport binding.
///
/// Implementations perform one request/response exchange. Dropping the
/// returned future should abort the exchange. Deadlines, retries and
/// connection management belong to the implementation.
pub trait HttpClient: Send + Sync {
    /// Send a request and wait for its response.
    ///
    /// # Errors
    ///
    /// Returns error if no response could be obtained. A response with a
    /// non-2xx status is not an error.
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse>>;
}

/// Standard reason phrase of the status codes rpcwire produces.
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        415 => "Unsupported Media Type",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}
