//! # rpcwire
//!
//! Contract-first RPC for Rust services.
//!
//! A service interface is declared once, as a JSON contract. The generator
//! turns each contract into a Rust module holding the contract trait, a
//! client stub and a server handler, so client and server can never
//! disagree about names or types.
//!
//! ## Architecture
//!
//! - **Codegen** ([`codegen`]): validates contracts and emits Rust source,
//!   usually from a build script
//! - **Client** ([`client`]): [`Endpoint`] encodes a call, sends it through an
//!   [`HttpClient`](transport::HttpClient) and decodes the reply into a [`Try`]
//! - **Server** ([`handler`]): [`Router`] resolves `POST /{service}/{rpc}`,
//!   negotiates the body format and runs the bound implementation inside a
//!   failure-capturing boundary
//! - **Wire** ([`codec`], [`result`]): JSON or MessagePack bodies, with
//!   outcomes carried as [`Try`] values tagged by [`ErrorKind`]
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rpcwire::{Endpoint, Router};
//! use rpcwire::transport::LocalTransport;
//!
//! mod user_service; // generated
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::builder()
//!         .bind(user_service::handler(Arc::new(Users::default())))?
//!         .build();
//!
//!     let transport = Arc::new(LocalTransport::new(Arc::new(router), "http://local"));
//!     let users = user_service::client(Endpoint::new(transport, "http://local"));
//!
//!     let reply = users.try_get_user(GetRequest { id: 42 }).await;
//!     println!("{:?}", reply);
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod client;
pub mod codec;
pub mod codegen;
pub mod error;
pub mod handler;
pub mod result;
pub mod transport;

/// Boxed future, the return type of contract methods and transports.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use client::Endpoint;
pub use codec::Format;
pub use error::RpcWireError;
pub use handler::{Router, ServiceRegistry};
pub use result::{Empty, ErrorKind, Failure, Fault, Try};
