//! Try module - success/failure values that survive the wire.
//!
//! - [`Try`] - `Success(value)` or `Failure(failure)`
//! - [`Failure`] - an [`ErrorKind`] plus an optional message
//! - [`Fault`] - the error type of contract methods; either a pre-tagged
//!   [`Failure`] or any raised `std::error::Error`
//! - [`ErrorMapper`] - decides the kind of faults that were not pre-tagged
//!
//! [`Try::capture`] is the failure-capturing boundary: it runs a block and
//! turns whatever comes out of it, including a panic, into a `Try`.
//!
//! # Example
//!
//! ```
//! use rpcwire::result::{raise, ErrorKind, Try};
//!
//! fn lookup(id: i32) -> Try<String> {
//!     Try::capture(|| {
//!         if id < 0 {
//!             return Err(raise(ErrorKind::NotFound, format!("no user {id}")));
//!         }
//!         let parsed: i32 = "42".parse()?;
//!         Ok(format!("user {}", parsed + id))
//!     })
//! }
//!
//! assert_eq!(lookup(0), Try::Success("user 42".to_string()));
//! assert_eq!(lookup(-1).failure().unwrap().error, ErrorKind::NotFound);
//! ```

mod kind;
mod mapper;
mod wire;

use std::error::Error;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use serde::{Deserialize, Serialize};

pub use kind::ErrorKind;
pub use mapper::{classify_error, classify_panic, panic_message, DefaultErrorMapper, ErrorMapper};

/// Boxed, thread-safe error, as carried by a raised [`Fault`].
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// A failed call: what went wrong, and optionally why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Category of the failure.
    pub error: ErrorKind,
    /// Human readable detail.
    pub message: Option<String>,
}

impl Failure {
    /// Create a failure with a message.
    pub fn new(error: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error,
            message: Some(message.into()),
        }
    }

    /// Create a failure without a message.
    pub fn bare(error: ErrorKind) -> Self {
        Self {
            error,
            message: None,
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.error, message),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Result of an evaluation that may have failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Try<T> {
    Success(T),
    Failure(Failure),
}

/// The unit record: output of methods that return nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Empty {}

impl<T> Try<T> {
    /// Run `f` inside a capturing boundary using the [`DefaultErrorMapper`].
    pub fn capture<F>(f: F) -> Try<T>
    where
        F: FnOnce() -> Result<T, Fault>,
    {
        Self::capture_with(&DefaultErrorMapper, f)
    }

    /// Run `f` inside a capturing boundary.
    ///
    /// `Ok` becomes `Success`, a pre-tagged failure is returned unchanged,
    /// and raised errors and panics are mapped with `mapper`.
    pub fn capture_with<F>(mapper: &dyn ErrorMapper, f: F) -> Try<T>
    where
        F: FnOnce() -> Result<T, Fault>,
    {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => Try::Success(value),
            Ok(Err(fault)) => Try::Failure(fault.into_failure(mapper)),
            Err(payload) => Try::Failure(failure_from_panic(mapper, payload.as_ref())),
        }
    }

    /// Await `future` inside a capturing boundary.
    ///
    /// Same rules as [`Try::capture_with`]; a panic while polling is caught.
    pub async fn capture_future<Fut>(mapper: &dyn ErrorMapper, future: Fut) -> Try<T>
    where
        Fut: Future<Output = Result<T, Fault>>,
    {
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(value)) => Try::Success(value),
            Ok(Err(fault)) => Try::Failure(fault.into_failure(mapper)),
            Err(payload) => Try::Failure(failure_from_panic(mapper, payload.as_ref())),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Try::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Try::Failure(_))
    }

    /// The success value, if any.
    pub fn success(self) -> Option<T> {
        match self {
            Try::Success(value) => Some(value),
            Try::Failure(_) => None,
        }
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Try::Success(_) => None,
            Try::Failure(failure) => Some(failure),
        }
    }

    /// Convert into a `Result`, so `?` can be used on it.
    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Try::Success(value) => Ok(value),
            Try::Failure(failure) => Err(failure),
        }
    }

    /// Transform the success value. A panic in `f` becomes a failure.
    pub fn map<U, F>(self, f: F) -> Try<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Try::Success(value) => Try::capture(|| Ok(f(value))),
            Try::Failure(failure) => Try::Failure(failure),
        }
    }

    /// Chain another fallible step on the success value.
    pub fn and_then<U, F>(self, f: F) -> Try<U>
    where
        F: FnOnce(T) -> Try<U>,
    {
        match self {
            Try::Success(value) => Try::capture(|| f(value).into_result().map_err(Fault::from)),
            Try::Failure(failure) => Try::Failure(failure),
        }
    }

    /// Replace a failure with a value computed from it.
    pub fn recover<F>(self, f: F) -> Try<T>
    where
        F: FnOnce(ErrorKind, Option<&str>) -> T,
    {
        match self {
            Try::Success(value) => Try::Success(value),
            Try::Failure(failure) => {
                Try::capture(|| Ok(f(failure.error, failure.message.as_deref())))
            }
        }
    }

    /// Replace a failure with another fallible step.
    pub fn recover_with<F>(self, f: F) -> Try<T>
    where
        F: FnOnce(ErrorKind, Option<&str>) -> Try<T>,
    {
        match self {
            Try::Success(value) => Try::Success(value),
            Try::Failure(failure) => Try::capture(|| {
                f(failure.error, failure.message.as_deref())
                    .into_result()
                    .map_err(Fault::from)
            }),
        }
    }

    /// Collapse both cases into one value.
    pub fn fold<B, FF, FS>(self, on_failure: FF, on_success: FS) -> Try<B>
    where
        FF: FnOnce(ErrorKind, Option<&str>) -> B,
        FS: FnOnce(T) -> B,
    {
        match self {
            Try::Success(value) => Try::capture(|| Ok(on_success(value))),
            Try::Failure(failure) => {
                Try::capture(|| Ok(on_failure(failure.error, failure.message.as_deref())))
            }
        }
    }
}

impl<T> From<Result<T, Failure>> for Try<T> {
    fn from(result: Result<T, Failure>) -> Self {
        match result {
            Ok(value) => Try::Success(value),
            Err(failure) => Try::Failure(failure),
        }
    }
}

impl<T> From<Try<T>> for Result<T, Failure> {
    fn from(value: Try<T>) -> Self {
        value.into_result()
    }
}

/// Error type of contract methods.
///
/// Any `std::error::Error` converts into a `Fault` with `?`, and so does a
/// [`Failure`]. At a capture boundary a pre-tagged failure passes through
/// unchanged while raised errors are mapped by an [`ErrorMapper`].
pub struct Fault(Repr);

enum Repr {
    Tagged(Failure),
    Raised(BoxError),
}

impl Fault {
    /// A pre-tagged fault.
    pub fn new(error: ErrorKind, message: impl Into<String>) -> Self {
        Fault(Repr::Tagged(Failure::new(error, message)))
    }

    /// A raised fault from an already boxed error.
    pub fn from_boxed(error: BoxError) -> Self {
        Fault(Repr::Raised(error))
    }

    /// The embedded failure, if this fault was pre-tagged.
    pub fn failure(&self) -> Option<&Failure> {
        match &self.0 {
            Repr::Tagged(failure) => Some(failure),
            Repr::Raised(_) => None,
        }
    }

    /// The raised error, if this fault was not pre-tagged.
    pub fn raised(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match &self.0 {
            Repr::Tagged(_) => None,
            Repr::Raised(error) => Some(error.as_ref()),
        }
    }

    /// Resolve into a failure, mapping a raised error with `mapper`.
    pub fn into_failure(self, mapper: &dyn ErrorMapper) -> Failure {
        match self.0 {
            Repr::Tagged(failure) => failure,
            Repr::Raised(error) => {
                let kind = mapper.map_error(error.as_ref());
                Failure::new(kind, error.to_string())
            }
        }
    }
}

impl<E> From<E> for Fault
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Fault(Repr::Raised(Box::new(error)))
    }
}

impl From<Failure> for Fault {
    fn from(failure: Failure) -> Self {
        Fault(Repr::Tagged(failure))
    }
}

impl std::fmt::Debug for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Repr::Tagged(failure) => f.debug_tuple("Fault").field(failure).finish(),
            Repr::Raised(error) => f.debug_tuple("Fault").field(error).finish(),
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Repr::Tagged(failure) => std::fmt::Display::fmt(failure, f),
            Repr::Raised(error) => std::fmt::Display::fmt(error, f),
        }
    }
}

/// Build a pre-tagged fault, for `return Err(raise(...))` inside a method.
pub fn raise(error: ErrorKind, message: impl Into<String>) -> Fault {
    Fault::new(error, message)
}

fn failure_from_panic(mapper: &dyn ErrorMapper, payload: &(dyn std::any::Any + Send)) -> Failure {
    match panic_message(payload) {
        Some(message) => Failure::new(mapper.map_panic(message), message),
        None => Failure::new(mapper.map_panic(""), "panic"),
    }
}
