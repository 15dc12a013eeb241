//! Translation of raised faults into [`ErrorKind`]s.
//!
//! A fault that reaches a capture boundary without being pre-tagged as a
//! [`Failure`](super::Failure) is either an error value or a panic. An
//! [`ErrorMapper`] decides which kind each of them becomes. The
//! [`DefaultErrorMapper`] table:
//!
//! | fault | kind |
//! |---|---|
//! | parse errors, JSON/MsgPack decode errors, `io` invalid input/data | `INVALID_ARGUMENT` |
//! | `io` not found, unwrapping a `None` | `NOT_FOUND` |
//! | `io` permission denied | `PERMISSION_DENIED` |
//! | `io` already exists | `ALREADY_EXISTS` |
//! | `io` timed out | `DEADLINE_EXCEEDED` |
//! | `io` unsupported, `unimplemented!`, `todo!` | `UNIMPLEMENTED` |
//! | `io` interrupted | `CANCELLED` |
//! | `io` connection refused/reset/aborted, not connected, broken pipe | `UNAVAILABLE` |
//! | failed `assert!` | `FAILED_PRECONDITION` |
//! | index out of bounds | `OUT_OF_RANGE` |
//! | any other panic | `INTERNAL` |
//! | any other error | `UNKNOWN` |

use std::any::Any;
use std::error::Error;
use std::io;

use super::ErrorKind;
use crate::error::RpcWireError;

/// Pluggable rule table converting raised faults into an [`ErrorKind`].
pub trait ErrorMapper: Send + Sync {
    /// Kind for an error value that was not pre-tagged.
    fn map_error(&self, error: &(dyn Error + 'static)) -> ErrorKind;

    /// Kind for a panic, given its message.
    fn map_panic(&self, message: &str) -> ErrorKind {
        classify_panic(message)
    }
}

/// The built-in mapping table.
///
/// Walks the error's `source()` chain and uses the first cause it
/// recognizes, so an `io::Error` wrapped by an application error still maps
/// to its own kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorMapper;

impl ErrorMapper for DefaultErrorMapper {
    fn map_error(&self, error: &(dyn Error + 'static)) -> ErrorKind {
        std::iter::successors(Some(error), |&e| e.source())
            .find_map(classify_error)
            .unwrap_or(ErrorKind::Unknown)
    }
}

/// Kind of a single error, without looking at its causes.
pub fn classify_error(error: &(dyn Error + 'static)) -> Option<ErrorKind> {
    if let Some(e) = error.downcast_ref::<io::Error>() {
        return Some(classify_io(e.kind()));
    }
    if let Some(e) = error.downcast_ref::<RpcWireError>() {
        return Some(match e {
            RpcWireError::Io(io) => classify_io(io.kind()),
            RpcWireError::Json(_) | RpcWireError::MsgPackDecode(_) => ErrorKind::InvalidArgument,
            RpcWireError::MsgPackEncode(_) | RpcWireError::Protocol(_) => ErrorKind::Internal,
            RpcWireError::DuplicateService(_) => ErrorKind::AlreadyExists,
            RpcWireError::Transport(_) => ErrorKind::Unavailable,
        });
    }
    if error.is::<std::num::ParseIntError>()
        || error.is::<std::num::ParseFloatError>()
        || error.is::<std::str::ParseBoolError>()
        || error.is::<std::str::Utf8Error>()
        || error.is::<std::string::FromUtf8Error>()
        || error.is::<serde_json::Error>()
        || error.is::<rmp_serde::decode::Error>()
    {
        return Some(ErrorKind::InvalidArgument);
    }
    if error.is::<std::num::TryFromIntError>() {
        return Some(ErrorKind::OutOfRange);
    }
    None
}

fn classify_io(kind: io::ErrorKind) -> ErrorKind {
    match kind {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
        io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => ErrorKind::InvalidArgument,
        io::ErrorKind::TimedOut => ErrorKind::DeadlineExceeded,
        io::ErrorKind::Unsupported => ErrorKind::Unimplemented,
        io::ErrorKind::Interrupted => ErrorKind::Cancelled,
        io::ErrorKind::UnexpectedEof => ErrorKind::DataLoss,
        io::ErrorKind::OutOfMemory => ErrorKind::ResourceExhausted,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::BrokenPipe => ErrorKind::Unavailable,
        _ => ErrorKind::Unknown,
    }
}

/// Kind of a panic, from the message the standard macros produce.
pub fn classify_panic(message: &str) -> ErrorKind {
    if message.starts_with("assertion") {
        ErrorKind::FailedPrecondition
    } else if message.starts_with("not implemented") || message.starts_with("not yet implemented")
    {
        ErrorKind::Unimplemented
    } else if message.contains("index out of bounds") || message.contains("out of range for") {
        ErrorKind::OutOfRange
    } else if message.contains("on a `None` value") {
        ErrorKind::NotFound
    } else {
        ErrorKind::Internal
    }
}

/// Extract the message of a panic payload, if it carries one.
pub fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}
