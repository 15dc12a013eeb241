//! Error types for rpcwire.
//!
//! [`RpcWireError`] covers failures of the plumbing itself: codecs, registry
//! setup, transports, and code generation I/O. Failures of a remote call are
//! never reported through it; those travel as [`crate::result::Failure`].

use thiserror::Error;

/// Main error type for all rpcwire operations.
#[derive(Debug, Error)]
pub enum RpcWireError {
    /// I/O error while writing generated sources or talking to a transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// A service with the same name is already bound to the registry.
    #[error("Registry already bound to service named {0}")]
    DuplicateService(String),

    /// The transport could not deliver a request or produce a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol error (malformed address, unexpected response shape, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type alias using RpcWireError.
pub type Result<T> = std::result::Result<T, RpcWireError>;
