// Generated by rpcwire from the UserService contract. Do not edit.

use std::sync::Arc;

use rpcwire::client::Endpoint;
use rpcwire::handler::{RpcHandler, ServiceHandler, TypedRpcHandler};
use rpcwire::result::{Fault, Try};
use rpcwire::BoxFuture;

/// Wire name of the service.
pub const SERVICE_NAME: &str = "UserService";

/// The `UserService` contract.
pub trait UserService: Send + Sync + 'static {
    /// `getUser`
    fn get_user(&self, request: crate::GetRequest) -> BoxFuture<'_, Result<crate::GetResponse, Fault>>;

    /// `deleteUser`
    fn delete_user(&self, request: crate::DeleteRequest) -> BoxFuture<'_, Result<rpcwire::Empty, Fault>>;
}

/// Client stub for `UserService`.
#[derive(Clone, Debug)]
pub struct UserServiceStub {
    endpoint: Endpoint,
}

impl UserServiceStub {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub async fn try_get_user(&self, request: crate::GetRequest) -> Try<crate::GetResponse> {
        self.endpoint.call(SERVICE_NAME, "getUser", &request).await
    }

    pub async fn try_delete_user(&self, request: crate::DeleteRequest) -> Try<rpcwire::Empty> {
        self.endpoint.call(SERVICE_NAME, "deleteUser", &request).await
    }
}

impl UserService for UserServiceStub {
    fn get_user(&self, request: crate::GetRequest) -> BoxFuture<'_, Result<crate::GetResponse, Fault>> {
        Box::pin(async move {
            self.try_get_user(request).await.into_result().map_err(Fault::from)
        })
    }

    fn delete_user(&self, request: crate::DeleteRequest) -> BoxFuture<'_, Result<rpcwire::Empty, Fault>> {
        Box::pin(async move {
            self.try_delete_user(request).await.into_result().map_err(Fault::from)
        })
    }
}

/// Server dispatch table for `UserService`.
pub struct UserServiceHandler<S: UserService> {
    get_user: TypedRpcHandler<S, crate::GetRequest, crate::GetResponse>,
    delete_user: TypedRpcHandler<S, crate::DeleteRequest, rpcwire::Empty>,
}

impl<S: UserService> UserServiceHandler<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            get_user: TypedRpcHandler::new(Arc::clone(&service), S::get_user),
            delete_user: TypedRpcHandler::new(Arc::clone(&service), S::delete_user),
        }
    }
}

impl<S: UserService> ServiceHandler for UserServiceHandler<S> {
    fn service_name(&self) -> &str {
        SERVICE_NAME
    }

    fn rpc_names(&self) -> Vec<&str> {
        vec!["getUser", "deleteUser"]
    }

    fn rpc_handler(&self, rpc: &str) -> Option<&dyn RpcHandler> {
        match rpc {
            "getUser" => Some(&self.get_user),
            "deleteUser" => Some(&self.delete_user),
            _ => None,
        }
    }
}

/// Stub calling `UserService` through `endpoint`.
pub fn client(endpoint: Endpoint) -> UserServiceStub {
    UserServiceStub::new(endpoint)
}

/// Handler serving `UserService` with `service`.
pub fn handler<S: UserService>(service: Arc<S>) -> UserServiceHandler<S> {
    UserServiceHandler::new(service)
}

const _: fn() = || {
    rpcwire::codec::assert_record::<crate::GetRequest>();
    rpcwire::codec::assert_record::<crate::GetResponse>();
    rpcwire::codec::assert_record::<crate::DeleteRequest>();
    rpcwire::codec::assert_record::<rpcwire::Empty>();
};
