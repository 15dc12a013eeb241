//! Request router.
//!
//! A [`Router`] resolves `(service, rpc, Content-Type)` to a method handler
//! and runs it. Routing errors are answered before anything is decoded:
//!
//! - unknown service: 404, or [`Routed::PassThrough`] when the router is
//!   embedded with [`NotFoundPolicy::PassThrough`]
//! - unknown method of a bound service: 404
//! - `Content-Type` mapping to no [`Format`]: 415
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use rpcwire::handler::{DynamicService, Router};
//! use rpcwire::result::Fault;
//!
//! # futures::executor::block_on(async {
//! let router = Router::builder()
//!     .bind(DynamicService::new("EchoService").rpc("echo", |s: String| async move {
//!         Ok::<_, Fault>(s)
//!     }))
//!     .unwrap()
//!     .build();
//!
//! let response = router
//!     .route("EchoService", "echo", Some("application/json"), Bytes::from_static(b"\"hi\""))
//!     .await
//!     .into_response()
//!     .unwrap();
//! assert_eq!(response.status, 200);
//! assert_eq!(&response.body[..], br#"{"status":"success","value":"hi"}"#);
//! # });
//! ```

use std::sync::Arc;

use bytes::Bytes;

use super::rpc::{DispatchMode, DispatchOptions, RpcResponse};
use super::{ServiceHandler, ServiceRegistry};
use crate::codec::{unsupported_media_type_message, Format};
use crate::error::Result;
use crate::result::ErrorMapper;

/// What to do with a request for a service that is not bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotFoundPolicy {
    /// Answer 404.
    #[default]
    Respond,
    /// Hand the request back to the embedding server.
    PassThrough,
}

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// The router produced a response.
    Response(RpcResponse),
    /// No bound service matched and the router is configured to pass.
    PassThrough,
}

impl Routed {
    /// The response, unless the request was passed through.
    pub fn into_response(self) -> Option<RpcResponse> {
        match self {
            Routed::Response(response) => Some(response),
            Routed::PassThrough => None,
        }
    }
}

/// Builder for configuring a [`Router`].
pub struct RouterBuilder {
    registry: ServiceRegistry,
    options: DispatchOptions,
    not_found: NotFoundPolicy,
    base_path: String,
}

impl RouterBuilder {
    /// Create a builder with an empty registry and default settings.
    pub fn new() -> Self {
        Self::from_registry(ServiceRegistry::new())
    }

    /// Create a builder serving an already populated registry.
    pub fn from_registry(registry: ServiceRegistry) -> Self {
        Self {
            registry,
            options: DispatchOptions::default(),
            not_found: NotFoundPolicy::default(),
            base_path: String::new(),
        }
    }

    /// Bind a service handler.
    ///
    /// # Errors
    ///
    /// Returns error if a service with the same name is already bound.
    pub fn bind<H: ServiceHandler + 'static>(mut self, handler: H) -> Result<Self> {
        self.registry.bind(handler)?;
        Ok(self)
    }

    /// Bind a shared service handler.
    ///
    /// # Errors
    ///
    /// Returns error if a service with the same name is already bound.
    pub fn bind_arc(mut self, handler: Arc<dyn ServiceHandler>) -> Result<Self> {
        self.registry.bind_arc(handler)?;
        Ok(self)
    }

    /// Set how outcomes are written back (default: structured).
    pub fn dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.options.mode = mode;
        self
    }

    /// Replace the [`ErrorMapper`] applied to raised faults and panics.
    pub fn error_mapper(mut self, mapper: impl ErrorMapper + 'static) -> Self {
        self.options.mapper = Arc::new(mapper);
        self
    }

    /// Set the policy for unknown services (default: respond 404).
    pub fn not_found(mut self, policy: NotFoundPolicy) -> Self {
        self.not_found = policy;
        self
    }

    /// Serve routes under `base_path`, e.g. `/rpc` for `/rpc/{service}/{rpc}`.
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        let base_path = base_path.into();
        self.base_path = base_path.trim_end_matches('/').to_string();
        self
    }

    pub fn build(self) -> Router {
        Router {
            registry: self.registry,
            options: self.options,
            not_found: self.not_found,
            base_path: self.base_path,
        }
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes requests to bound services.
pub struct Router {
    registry: ServiceRegistry,
    options: DispatchOptions,
    not_found: NotFoundPolicy,
    base_path: String,
}

impl Router {
    /// Create a builder for configuring a router.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// The services this router serves.
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.options.mode
    }

    /// Route one call to `service`/`rpc`.
    ///
    /// `content_type` is the raw `Content-Type` header, if the request had
    /// one. It selects the format of both the request and response body.
    pub async fn route(
        &self,
        service: &str,
        rpc: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Routed {
        let Some(handler) = self.registry.service(service) else {
            return match self.not_found {
                NotFoundPolicy::Respond => {
                    tracing::warn!("No service named {}", service);
                    Routed::Response(RpcResponse::text(
                        404,
                        format!("Service {} is not bound", service),
                    ))
                }
                NotFoundPolicy::PassThrough => {
                    tracing::debug!("No service named {}, passing through", service);
                    Routed::PassThrough
                }
            };
        };

        let Some(rpc_handler) = handler.rpc_handler(rpc) else {
            tracing::warn!("Service {} has no method {}", service, rpc);
            return Routed::Response(RpcResponse::text(
                404,
                format!("Service {} has no method {}", service, rpc),
            ));
        };

        let Some(format) = content_type.and_then(Format::from_content_type) else {
            tracing::warn!(
                "Rejected {}/{} with media type {:?}",
                service,
                rpc,
                content_type
            );
            return Routed::Response(RpcResponse::text(
                415,
                unsupported_media_type_message(content_type),
            ));
        };

        tracing::debug!("Routing {}/{} as {}", service, rpc, format);
        let response = rpc_handler
            .call(format, body, self.options.clone())
            .await;
        Routed::Response(response)
    }

    /// Route a request by its URL path, `{base_path}/{service}/{rpc}`.
    ///
    /// A query string is ignored. Paths outside the base path, or with a
    /// different number of segments, are treated as an unknown service.
    pub async fn route_path(
        &self,
        path: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Routed {
        let path = path.split(['?', '#']).next().unwrap_or("");
        match self.split_path(path) {
            Some((service, rpc)) => self.route(service, rpc, content_type, body).await,
            None => match self.not_found {
                NotFoundPolicy::Respond => {
                    tracing::warn!("No route for path {}", path);
                    Routed::Response(RpcResponse::text(404, format!("No route for {}", path)))
                }
                NotFoundPolicy::PassThrough => Routed::PassThrough,
            },
        }
    }

    fn split_path<'a>(&self, path: &'a str) -> Option<(&'a str, &'a str)> {
        let rest = path.strip_prefix(self.base_path.as_str())?;
        let rest = rest.strip_prefix('/')?;
        let (service, rpc) = rest.split_once('/')?;
        if service.is_empty() || rpc.is_empty() || rpc.contains('/') {
            return None;
        }
        Some((service, rpc))
    }
}

impl std::fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("not_found", &self.not_found)
            .field("base_path", &self.base_path)
            .finish()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("not_found", &self.not_found)
            .field("base_path", &self.base_path)
            .finish()
    }
}
