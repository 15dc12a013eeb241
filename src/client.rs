//! Client stub runtime.
//!
//! An [`Endpoint`] is the call path every generated stub goes through:
//! encode the input, `POST` it to `{base_url}/{service}/{method}` through an
//! [`HttpClient`], and decode the reply into a [`Try`]. A call never fails
//! outside its `Try`; transport faults and unexpected statuses become
//! failures with a kind derived from what went wrong.
//!
//! # Example
//!
//! ```ignore
//! use rpcwire::client::Endpoint;
//! use rpcwire::codec::Format;
//!
//! let endpoint = Endpoint::builder(http, "https://api.example.com/rpc")
//!     .format(Format::Binary)
//!     .header("Authorization", "Bearer token")
//!     .build();
//!
//! let stub = user_service::client(endpoint);
//! let user = stub.try_get_user(GetRequest { id: 42 }).await;
//! ```

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

use crate::codec::Format;
use crate::handler::DispatchMode;
use crate::result::{ErrorKind, Failure, Try};
use crate::transport::{Body, HttpClient, HttpMethod, HttpRequest, HttpResponse, CONTENT_TYPE};

/// Builder for configuring an [`Endpoint`].
pub struct EndpointBuilder {
    http: Arc<dyn HttpClient>,
    base_url: String,
    format: Format,
    mode: DispatchMode,
    status_kinds: StatusKinds,
    headers: HashMap<String, String>,
}

impl EndpointBuilder {
    /// Set the body format (default: JSON).
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Add a header sent with every call.
    ///
    /// `Content-Type` is always taken from the format and cannot be
    /// overridden here.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set how the server writes outcomes back (default: structured).
    ///
    /// Must match the router's dispatch mode.
    pub fn dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set how bare error statuses map to kinds (default: generic).
    pub fn status_kinds(mut self, status_kinds: StatusKinds) -> Self {
        self.status_kinds = status_kinds;
        self
    }

    pub fn build(self) -> Endpoint {
        Endpoint {
            http: self.http,
            base_url: self.base_url,
            format: self.format,
            mode: self.mode,
            status_kinds: self.status_kinds,
            headers: Arc::new(self.headers),
        }
    }
}

/// Address, format and transport of a remote server.
///
/// Cheap to clone and safe to share between tasks.
#[derive(Clone)]
pub struct Endpoint {
    http: Arc<dyn HttpClient>,
    base_url: String,
    format: Format,
    mode: DispatchMode,
    status_kinds: StatusKinds,
    headers: Arc<HashMap<String, String>>,
}

impl Endpoint {
    /// Endpoint with default settings: JSON, structured outcomes.
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self::builder(http, base_url).build()
    }

    /// Create a builder for configuring an endpoint.
    pub fn builder(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder {
            http,
            base_url: base_url.into(),
            format: Format::default(),
            mode: DispatchMode::default(),
            status_kinds: StatusKinds::default(),
            headers: HashMap::new(),
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.mode
    }

    /// Target address of `service`/`method`.
    pub fn url(&self, service: &str, method: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            service,
            method
        )
    }

    /// Call `method` of `service` with `input`.
    pub async fn call<I, O>(&self, service: &str, method: &str, input: &I) -> Try<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let url = self.url(service, method);
        let body = match self.format.encode(input) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Could not encode input of {}: {}", url, e);
                return Try::Failure(Failure::new(
                    ErrorKind::Internal,
                    format!("Could not encode request: {}", e),
                ));
            }
        };

        let media_type = self.format.media_type();
        let mut headers = (*self.headers).clone();
        headers.retain(|name, _| !name.eq_ignore_ascii_case(CONTENT_TYPE));
        headers.insert(CONTENT_TYPE.to_string(), media_type.to_string());

        let request = HttpRequest {
            url,
            method: HttpMethod::Post,
            body: Some(Body::new(body, media_type)),
            headers,
        };

        tracing::debug!("Calling {} as {}", request.url, self.format);
        let url = request.url.clone();
        match self.http.send(request).await {
            Ok(response) => self.read_response(&url, response),
            Err(e) => {
                tracing::warn!("Call to {} failed: {}", url, e);
                Try::Failure(Failure::new(ErrorKind::Unavailable, e.to_string()))
            }
        }
    }

    fn read_response<O: DeserializeOwned>(&self, url: &str, response: HttpResponse) -> Try<O> {
        let content = response
            .body
            .as_ref()
            .map(|body| body.content.clone())
            .unwrap_or_default();

        if !response.status.is_success() {
            return Try::Failure(self.failure_from_status(&response, &content));
        }

        let decoded = match self.mode {
            DispatchMode::Structured => self.format.decode::<Try<O>>(&content),
            DispatchMode::Opaque => self.format.decode::<O>(&content).map(Try::Success),
        };
        decoded.unwrap_or_else(|e| {
            tracing::error!("Could not decode response of {}: {}", url, e);
            Try::Failure(Failure::new(
                ErrorKind::Internal,
                format!("Could not decode response: {}", e),
            ))
        })
    }

    /// Failure for a non-2xx response.
    ///
    /// A structured failure body in the endpoint's format wins; a plain text
    /// `KIND: message` body is read next; otherwise the kind follows the
    /// status code.
    fn failure_from_status(&self, response: &HttpResponse, content: &[u8]) -> Failure {
        let same_format = response
            .content_type()
            .and_then(Format::from_content_type)
            .is_some_and(|format| format == self.format);
        if same_format {
            if let Ok(Try::Failure(failure)) = self.format.decode::<Try<IgnoredAny>>(content) {
                return failure;
            }
        }

        let text = String::from_utf8_lossy(content);
        let text = text.trim();
        if let Some((kind, message)) = text.split_once(": ") {
            if let Ok(kind) = ErrorKind::from_str(kind) {
                return Failure::new(kind, message);
            }
        }

        let code = response.status.code;
        let message = if text.is_empty() {
            format!("HTTP {} {}", code, response.status.message)
        } else {
            format!("HTTP {} {}: {}", code, response.status.message, text)
        };
        Failure::new(self.status_kinds.kind_for(code), message)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("base_url", &self.base_url)
            .field("format", &self.format)
            .field("mode", &self.mode)
            .field("status_kinds", &self.status_kinds)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Kinds given to error responses that carry no readable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusKinds {
    /// 429, 502, 503 and 504 are UNAVAILABLE, anything else is INTERNAL.
    #[default]
    Generic,
    /// Like `Generic`, but 401, 403 and 404 keep their meaning as
    /// UNAUTHENTICATED, PERMISSION_DENIED and UNIMPLEMENTED.
    Detailed,
}

impl StatusKinds {
    /// Kind of a failed call answered with `code`.
    pub fn kind_for(self, code: u16) -> ErrorKind {
        match (self, code) {
            (Self::Detailed, 401) => ErrorKind::Unauthenticated,
            (Self::Detailed, 403) => ErrorKind::PermissionDenied,
            (Self::Detailed, 404) => ErrorKind::Unimplemented,
            (_, 429 | 502 | 503 | 504) => ErrorKind::Unavailable,
            _ => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, RpcWireError};
    use crate::transport::HttpStatus;
    use crate::BoxFuture;
    use std::sync::Mutex;

    /// Answers every request with a canned response and records it.
    struct Canned {
        response: Mutex<Option<Result<HttpResponse>>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(response: Result<HttpResponse>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(response)),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn reply(code: u16, content_type: &str, body: Vec<u8>) -> Arc<Self> {
            Self::new(Ok(HttpResponse {
                status: HttpStatus::new(code),
                body: Some(Body::new(body, content_type)),
                headers: HashMap::new(),
            }))
        }
    }

    impl HttpClient for Canned {
        fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse>> {
            self.seen.lock().unwrap().push(request);
            let response = self.response.lock().unwrap().take().unwrap();
            Box::pin(async move { response })
        }
    }

    #[test]
    fn test_builder_defaults() {
        let endpoint = Endpoint::new(Canned::reply(200, "application/json", vec![]), "http://x");
        assert_eq!(endpoint.format(), Format::Json);
        assert_eq!(endpoint.dispatch_mode(), DispatchMode::Structured);
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let http = Canned::reply(200, "application/json", vec![]);
        let endpoint = Endpoint::new(http.clone(), "http://localhost:8080/rpc/");
        assert_eq!(
            endpoint.url("UserService", "getUser"),
            "http://localhost:8080/rpc/UserService/getUser"
        );

        let endpoint = Endpoint::new(http, "http://localhost:8080");
        assert_eq!(
            endpoint.url("UserService", "getUser"),
            "http://localhost:8080/UserService/getUser"
        );
    }

    #[tokio::test]
    async fn test_call_sends_post_with_headers() {
        let http = Canned::reply(
            200,
            "application/octet-stream",
            Format::Binary.encode(&Try::Success(7)).unwrap().to_vec(),
        );
        let endpoint = Endpoint::builder(http.clone(), "http://x")
            .format(Format::Binary)
            .header("Authorization", "Bearer t")
            .header("content-type", "text/plain")
            .build();

        let outcome: Try<i32> = endpoint.call("Svc", "get", &1).await;
        assert_eq!(outcome, Try::Success(7));

        let seen = http.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.url, "http://x/Svc/get");
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.content_type(), Some("application/octet-stream"));
        assert_eq!(
            request.headers.get("Authorization").map(String::as_str),
            Some("Bearer t")
        );
        assert_eq!(
            request.headers.get(CONTENT_TYPE).map(String::as_str),
            Some("application/octet-stream")
        );
        assert!(!request.headers.contains_key("content-type"));
    }

    #[tokio::test]
    async fn test_transport_fault_is_unavailable() {
        let http = Canned::new(Err(RpcWireError::Transport("refused".to_string())));
        let outcome: Try<i32> = Endpoint::new(http, "http://x").call("Svc", "get", &1).await;
        assert_eq!(outcome.failure().unwrap().error, ErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn test_status_without_structured_body() {
        let cases = [
            (401, ErrorKind::Internal),
            (404, ErrorKind::Internal),
            (415, ErrorKind::Internal),
            (503, ErrorKind::Unavailable),
        ];
        for (code, kind) in cases {
            let http = Canned::reply(code, "text/plain", b"nope".to_vec());
            let outcome: Try<i32> = Endpoint::new(http, "http://x").call("Svc", "get", &1).await;
            let failure = outcome.failure().unwrap();
            assert_eq!(failure.error, kind, "status {code}");
            assert!(failure.message.as_deref().unwrap().contains("nope"));
        }
    }

    #[tokio::test]
    async fn test_detailed_status_kinds() {
        let cases = [
            (401, ErrorKind::Unauthenticated),
            (403, ErrorKind::PermissionDenied),
            (404, ErrorKind::Unimplemented),
            (500, ErrorKind::Internal),
        ];
        for (code, kind) in cases {
            let http = Canned::reply(code, "text/plain", b"nope".to_vec());
            let endpoint = Endpoint::builder(http, "http://x")
                .status_kinds(StatusKinds::Detailed)
                .build();
            let outcome: Try<i32> = endpoint.call("Svc", "get", &1).await;
            assert_eq!(outcome.failure().unwrap().error, kind, "status {code}");
        }
    }

    #[tokio::test]
    async fn test_structured_error_body_wins() {
        let failure: Try<i32> = Try::Failure(Failure::new(ErrorKind::InvalidArgument, "bad"));
        let http = Canned::reply(400, "application/json", Format::Json.encode(&failure).unwrap().to_vec());
        let outcome: Try<i32> = Endpoint::new(http, "http://x").call("Svc", "get", &1).await;
        assert_eq!(outcome, failure);
    }

    #[tokio::test]
    async fn test_opaque_text_failure_keeps_kind() {
        let http = Canned::reply(500, "text/plain", b"NOT_FOUND: no user -1".to_vec());
        let endpoint = Endpoint::builder(http, "http://x")
            .dispatch_mode(DispatchMode::Opaque)
            .build();
        let outcome: Try<i32> = endpoint.call("Svc", "get", &1).await;
        assert_eq!(
            outcome,
            Try::Failure(Failure::new(ErrorKind::NotFound, "no user -1"))
        );
    }

    #[tokio::test]
    async fn test_undecodable_success_body_is_internal() {
        let http = Canned::reply(200, "application/json", b"not json".to_vec());
        let outcome: Try<i32> = Endpoint::new(http, "http://x").call("Svc", "get", &1).await;
        assert_eq!(outcome.failure().unwrap().error, ErrorKind::Internal);
    }

    #[test]
    fn test_generic_status_kinds() {
        let kinds = StatusKinds::default();
        assert_eq!(kinds, StatusKinds::Generic);
        assert_eq!(kinds.kind_for(429), ErrorKind::Unavailable);
        assert_eq!(kinds.kind_for(502), ErrorKind::Unavailable);
        assert_eq!(kinds.kind_for(504), ErrorKind::Unavailable);
        assert_eq!(kinds.kind_for(500), ErrorKind::Internal);
        assert_eq!(kinds.kind_for(403), ErrorKind::Internal);
    }
}
