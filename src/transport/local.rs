//! In-process transport binding.
//!
//! [`LocalTransport`] implements [`HttpClient`] by handing each request to a
//! [`Router`] on its own tokio task, the way a server would accept it from a
//! socket. A panic on the server side therefore never unwinds into the
//! caller. Dropping the call future aborts the server task.
//!
//! # Example
//!
//! ```ignore
//! let router = Arc::new(Router::builder().bind(handler)?.build());
//! let transport = Arc::new(LocalTransport::new(router, "http://local"));
//! let stub = user_service::client(Endpoint::new(transport, "http://local"));
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;

use super::{
    Body, HttpClient, HttpMethod, HttpRequest, HttpResponse, HttpStatus, CONTENT_TYPE,
    TEXT_MEDIA_TYPE,
};
use crate::error::{Result, RpcWireError};
use crate::handler::{Routed, Router, RpcResponse};
use crate::BoxFuture;
use tokio::task::{JoinError, JoinHandle};

/// Loopback binding from an [`HttpClient`] straight into a [`Router`].
pub struct LocalTransport {
    router: Arc<Router>,
    base_url: String,
}

impl LocalTransport {
    /// Serve `router` at `base_url`.
    ///
    /// Requests whose URL does not start with `base_url` fail with a
    /// transport error, as an unreachable host would.
    pub fn new(router: Arc<Router>, base_url: impl Into<String>) -> Self {
        Self {
            router,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn path_of<'a>(&self, url: &'a str) -> Option<&'a str> {
        let rest = url.strip_prefix(self.base_url.as_str())?;
        if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('?')) {
            return None;
        }
        Some(rest.split(['?', '#']).next().unwrap_or(""))
    }

    async fn exchange(&self, request: HttpRequest) -> Result<HttpResponse> {
        if request.method != HttpMethod::Post {
            return Ok(text_response(
                405,
                format!("Method {} is not allowed", request.method.as_str()),
            ));
        }

        let path = self
            .path_of(&request.url)
            .ok_or_else(|| RpcWireError::Transport(format!("No route to {}", request.url)))?
            .to_string();
        let content_type = request.content_type().map(str::to_string);
        let body = request.body.map(|body| body.content).unwrap_or_default();

        let router = Arc::clone(&self.router);
        let routed = AbortOnDrop(tokio::spawn(async move {
            router
                .route_path(&path, content_type.as_deref(), body)
                .await
        }))
        .await
        .map_err(|e| {
            tracing::error!("Local server task failed: {}", e);
            RpcWireError::Transport(format!("Server task failed: {}", e))
        })?;

        Ok(match routed {
            Routed::Response(response) => into_http_response(response),
            Routed::PassThrough => text_response(404, String::new()),
        })
    }
}

impl HttpClient for LocalTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse>> {
        Box::pin(self.exchange(request))
    }
}

/// Server task that is aborted when the caller stops waiting for it.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Future for AbortOnDrop<T> {
    type Output = std::result::Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn into_http_response(response: RpcResponse) -> HttpResponse {
    let mut headers = HashMap::new();
    headers.insert(
        CONTENT_TYPE.to_string(),
        vec![response.content_type.clone()],
    );
    HttpResponse {
        status: HttpStatus::new(response.status),
        body: Some(Body::new(response.body, response.content_type)),
        headers,
    }
}

fn text_response(code: u16, message: String) -> HttpResponse {
    into_http_response(RpcResponse {
        status: code,
        content_type: TEXT_MEDIA_TYPE.to_string(),
        body: Bytes::from(message),
    })
}
