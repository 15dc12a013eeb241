//! Service registry keyed by service name.
//!
//! The registry holds the [`ServiceHandler`]s a router serves. Each service
//! name may be bound once; services are reported in bind order.
//!
//! # Example
//!
//! ```
//! use rpcwire::handler::{DynamicService, ServiceRegistry};
//! use rpcwire::result::Fault;
//!
//! let mut registry = ServiceRegistry::new();
//! registry
//!     .bind(DynamicService::new("EchoService").rpc("echo", |s: String| async move {
//!         Ok::<_, Fault>(s)
//!     }))
//!     .unwrap();
//!
//! assert!(registry.contains("EchoService"));
//! assert!(registry.bind(DynamicService::new("EchoService")).is_err());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::ServiceHandler;
use crate::error::{Result, RpcWireError};

/// Registry mapping service names to handlers.
#[derive(Default, Clone)]
pub struct ServiceRegistry {
    /// Handlers by service name.
    services: HashMap<String, Arc<dyn ServiceHandler>>,
    /// Service names in bind order.
    order: Vec<String>,
}

impl ServiceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a service handler.
    ///
    /// # Errors
    ///
    /// Returns [`RpcWireError::DuplicateService`] if a service with the same
    /// name is already bound. The registry is left unchanged.
    pub fn bind<H: ServiceHandler + 'static>(&mut self, handler: H) -> Result<()> {
        self.bind_arc(Arc::new(handler))
    }

    /// Bind a shared service handler.
    ///
    /// # Errors
    ///
    /// Same as [`ServiceRegistry::bind`].
    pub fn bind_arc(&mut self, handler: Arc<dyn ServiceHandler>) -> Result<()> {
        let name = handler.service_name().to_string();
        if self.services.contains_key(&name) {
            tracing::error!("Service {} is already bound", name);
            return Err(RpcWireError::DuplicateService(name));
        }

        tracing::debug!(
            "Bound service {} with methods {:?}",
            name,
            handler.rpc_names()
        );
        self.order.push(name.clone());
        self.services.insert(name, handler);
        Ok(())
    }

    /// Whether a service named `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Get a service handler by name.
    pub fn service(&self, name: &str) -> Option<&dyn ServiceHandler> {
        self.services.get(name).map(|handler| handler.as_ref())
    }

    /// Names of all bound services, in bind order.
    pub fn service_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.order)
            .finish()
    }
}
