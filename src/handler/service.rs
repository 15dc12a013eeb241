//! Service handlers: the per-contract dispatch tables a router serves.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::rpc::{FnRpcHandler, RpcHandler};
use crate::result::Fault;

/// Dispatch table for one service contract.
///
/// Generated handlers implement this with a `match` over the contract's
/// method names. [`DynamicService`] implements it for tables assembled at
/// runtime.
pub trait ServiceHandler: Send + Sync {
    /// Wire name of the service, the first path segment of its routes.
    fn service_name(&self) -> &str;

    /// Wire names of all methods, in declaration order.
    fn rpc_names(&self) -> Vec<&str>;

    /// Handler for the method named `rpc`, if the contract declares one.
    fn rpc_handler(&self, rpc: &str) -> Option<&dyn RpcHandler>;
}

/// A [`ServiceHandler`] built from closures.
///
/// # Example
///
/// ```
/// use rpcwire::handler::DynamicService;
/// use rpcwire::result::Fault;
///
/// let echo = DynamicService::new("EchoService")
///     .rpc("echo", |text: String| async move { Ok::<_, Fault>(text) });
/// ```
pub struct DynamicService {
    name: String,
    rpcs: Vec<(String, Box<dyn RpcHandler>)>,
}

impl DynamicService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rpcs: Vec::new(),
        }
    }

    /// Add a method. Registering a name twice replaces the first handler.
    pub fn rpc<F, I, O, Fut>(self, name: &str, handler: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        Fut: Future<Output = Result<O, Fault>> + Send + 'static,
    {
        self.rpc_handler_boxed(name, Box::new(FnRpcHandler::new(handler)))
    }

    /// Add a method backed by an existing [`RpcHandler`].
    pub fn rpc_handler_boxed(mut self, name: &str, handler: Box<dyn RpcHandler>) -> Self {
        match self.rpcs.iter_mut().find(|(existing, _)| existing == name) {
            Some(slot) => {
                tracing::warn!(
                    "Method {} registered twice on service {}, replacing",
                    name,
                    self.name
                );
                slot.1 = handler;
            }
            None => self.rpcs.push((name.to_string(), handler)),
        }
        self
    }
}

impl ServiceHandler for DynamicService {
    fn service_name(&self) -> &str {
        &self.name
    }

    fn rpc_names(&self) -> Vec<&str> {
        self.rpcs.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn rpc_handler(&self, rpc: &str) -> Option<&dyn RpcHandler> {
        self.rpcs
            .iter()
            .find(|(name, _)| name == rpc)
            .map(|(_, handler)| handler.as_ref())
    }
}
