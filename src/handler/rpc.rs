//! Per-method dispatch: decode, invoke inside a capture boundary, encode.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::Format;
use crate::result::{DefaultErrorMapper, Empty, ErrorKind, ErrorMapper, Failure, Fault, Try};
use crate::transport::TEXT_MEDIA_TYPE;
use crate::BoxFuture;

/// How the outcome of an invocation is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Every outcome is an encoded [`Try`] with status 200, so failures
    /// reach the client as structured data.
    #[default]
    Structured,
    /// Only success values are encoded. A failure answers 500 with a plain
    /// text body.
    Opaque,
}

/// Server-wide settings handed to every [`RpcHandler`] call.
#[derive(Clone)]
pub struct DispatchOptions {
    pub mode: DispatchMode,
    pub mapper: Arc<dyn ErrorMapper>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            mode: DispatchMode::default(),
            mapper: Arc::new(DefaultErrorMapper),
        }
    }
}

impl std::fmt::Debug for DispatchOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchOptions")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// What the router sends back for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Bytes,
}

impl RpcResponse {
    /// 200 with an encoded body.
    pub fn ok(format: Format, body: Bytes) -> Self {
        Self {
            status: 200,
            content_type: format.media_type().to_string(),
            body,
        }
    }

    /// Plain text response, used for routing errors.
    pub fn text(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            content_type: TEXT_MEDIA_TYPE.to_string(),
            body: Bytes::from(message.into()),
        }
    }

    /// Error response carrying `failure`.
    ///
    /// Structured mode encodes it as a `Try` in `format`; opaque mode, or a
    /// failure to encode, falls back to plain text.
    pub fn failure(status: u16, format: Format, mode: DispatchMode, failure: Failure) -> Self {
        if mode == DispatchMode::Structured {
            let outcome: Try<Empty> = Try::Failure(failure.clone());
            if let Ok(body) = format.encode(&outcome) {
                return Self {
                    status,
                    content_type: format.media_type().to_string(),
                    body,
                };
            }
        }
        Self::text(status, failure.to_string())
    }
}

/// One remote method: input decoder, output encoder, and invocation.
pub trait RpcHandler: Send + Sync {
    /// Handle one call whose body is encoded in `format`.
    fn call(&self, format: Format, body: Bytes, options: DispatchOptions)
        -> BoxFuture<'static, RpcResponse>;
}

/// Signature of a contract method as seen by the dispatch table.
pub type RpcFn<S, I, O> = for<'a> fn(&'a S, I) -> BoxFuture<'a, Result<O, Fault>>;

/// [`RpcHandler`] bound to one method of a shared implementation.
///
/// This is what generated handlers build, one per contract method:
/// `TypedRpcHandler::new(service.clone(), S::get_user)`.
pub struct TypedRpcHandler<S, I, O> {
    service: Arc<S>,
    run: RpcFn<S, I, O>,
    _phantom: PhantomData<fn(I) -> O>,
}

impl<S, I, O> TypedRpcHandler<S, I, O> {
    pub fn new(service: Arc<S>, run: RpcFn<S, I, O>) -> Self {
        Self {
            service,
            run,
            _phantom: PhantomData,
        }
    }
}

impl<S, I, O> RpcHandler for TypedRpcHandler<S, I, O>
where
    S: Send + Sync + 'static,
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
{
    fn call(
        &self,
        format: Format,
        body: Bytes,
        options: DispatchOptions,
    ) -> BoxFuture<'static, RpcResponse> {
        let service = Arc::clone(&self.service);
        let run = self.run;
        Box::pin(dispatch(format, body, options, move |request: I| async move {
            run(service.as_ref(), request).await
        }))
    }
}

/// [`RpcHandler`] wrapping an async closure.
pub struct FnRpcHandler<F, I, O, Fut>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
    Fut: Future<Output = Result<O, Fault>> + Send + 'static,
{
    handler: Arc<F>,
    _phantom: PhantomData<fn(I) -> Fut>,
}

impl<F, I, O, Fut> FnRpcHandler<F, I, O, Fut>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
    Fut: Future<Output = Result<O, Fault>> + Send + 'static,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler: Arc::new(handler),
            _phantom: PhantomData,
        }
    }
}

impl<F, I, O, Fut> RpcHandler for FnRpcHandler<F, I, O, Fut>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
    Fut: Future<Output = Result<O, Fault>> + Send + 'static,
{
    fn call(
        &self,
        format: Format,
        body: Bytes,
        options: DispatchOptions,
    ) -> BoxFuture<'static, RpcResponse> {
        let handler = Arc::clone(&self.handler);
        Box::pin(dispatch(format, body, options, move |request: I| {
            (*handler)(request)
        }))
    }
}

async fn dispatch<I, O, F, Fut>(
    format: Format,
    body: Bytes,
    options: DispatchOptions,
    invoke: F,
) -> RpcResponse
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(I) -> Fut,
    Fut: Future<Output = Result<O, Fault>>,
{
    let request: I = match format.decode(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Could not decode {} request body: {}", format, e);
            let failure = Failure::new(
                ErrorKind::InvalidArgument,
                format!("Could not decode request body: {}", e),
            );
            return RpcResponse::failure(400, format, options.mode, failure);
        }
    };

    // The implementation is only entered on first poll, so a panic while
    // building its future is captured too.
    let invocation = async move { invoke(request).await };
    let outcome = Try::capture_future(options.mapper.as_ref(), invocation).await;
    respond(format, options.mode, outcome)
}

fn respond<O: Serialize>(format: Format, mode: DispatchMode, outcome: Try<O>) -> RpcResponse {
    if let Try::Failure(failure) = &outcome {
        tracing::debug!("Invocation failed: {}", failure);
    }

    let encoded = match (mode, outcome) {
        (DispatchMode::Structured, outcome) => format.encode(&outcome),
        (DispatchMode::Opaque, Try::Success(value)) => format.encode(&value),
        (DispatchMode::Opaque, Try::Failure(failure)) => {
            tracing::error!("Invocation failed in opaque mode: {}", failure);
            return RpcResponse::text(500, failure.to_string());
        }
    };

    match encoded {
        Ok(body) => RpcResponse::ok(format, body),
        Err(e) => {
            tracing::error!("Could not encode {} response: {}", format, e);
            let failure = Failure::new(
                ErrorKind::Internal,
                format!("Could not encode response: {}", e),
            );
            RpcResponse::failure(500, format, mode, failure)
        }
    }
}
