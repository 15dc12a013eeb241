//! Wire representation of [`Try`].
//!
//! A `Try` is written as a record with a literal `status` tag:
//!
//! ```text
//! { "status": "success", "value": ... }
//! { "status": "failure", "error": "NOT_FOUND", "message": "..." }
//! ```
//!
//! `message` is omitted when absent. The same record shape is used by both
//! codecs; MsgPack writes it as a map keyed by field name.

use serde::de::{self, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{ErrorKind, Failure, Try};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Success,
    Failure,
}

#[derive(Serialize)]
struct TryRecordRef<'a, T> {
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

#[derive(Deserialize)]
struct TryRecord<T> {
    status: Status,
    value: Option<T>,
    error: Option<ErrorKind>,
    message: Option<String>,
}

impl<T: Serialize> Serialize for Try<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = match self {
            Try::Success(value) => TryRecordRef {
                status: Status::Success,
                value: Some(value),
                error: None,
                message: None,
            },
            Try::Failure(failure) => TryRecordRef {
                status: Status::Failure,
                value: None,
                error: Some(failure.error),
                message: failure.message.as_deref(),
            },
        };
        record.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Try<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = TryRecord::<T>::deserialize(deserializer)?;
        match record.status {
            Status::Success => match record.value {
                Some(value) => Ok(Try::Success(value)),
                // A unit-like value (`()`, `None`) may be written as null or
                // dropped entirely.
                None => {
                    let unit: de::value::UnitDeserializer<D::Error> = ().into_deserializer();
                    T::deserialize(unit)
                        .map(Try::Success)
                        .map_err(|_| de::Error::missing_field("value"))
                }
            },
            Status::Failure => {
                let error = record
                    .error
                    .ok_or_else(|| de::Error::missing_field("error"))?;
                Ok(Try::Failure(Failure {
                    error,
                    message: record.message,
                }))
            }
        }
    }
}
