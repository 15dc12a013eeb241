//! Handler module - server-side registry, routing and dispatch.
//!
//! Provides:
//! - [`RpcHandler`] - decodes one method's input, runs it, encodes the outcome
//! - [`ServiceHandler`] - one contract's table of method handlers
//! - [`ServiceRegistry`] - bound services keyed by name
//! - [`Router`] - resolves `{service}/{rpc}` and the `Content-Type` to a handler
//!
//! Generated handlers implement [`ServiceHandler`] with [`TypedRpcHandler`]s;
//! [`DynamicService`] builds the same table from closures.
//!
//! # Example
//!
//! ```ignore
//! use rpcwire::handler::{DispatchMode, Router};
//!
//! let router = Router::builder()
//!     .bind(user_service::handler(Arc::new(MyUsers::default())))?
//!     .dispatch_mode(DispatchMode::Structured)
//!     .build();
//!
//! let routed = router.route("UserService", "getUser", Some("application/json"), body).await;
//! ```

mod registry;
mod router;
mod rpc;
mod service;

pub use registry::ServiceRegistry;
pub use router::{NotFoundPolicy, Routed, Router, RouterBuilder};
pub use rpc::{
    DispatchMode, DispatchOptions, FnRpcHandler, RpcFn, RpcHandler, RpcResponse, TypedRpcHandler,
};
pub use service::{DynamicService, ServiceHandler};
