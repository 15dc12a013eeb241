//! Codec module - the two wire formats an RPC body can use.
//!
//! - [`JsonCodec`] - JSON text via `serde_json` (`application/json`)
//! - [`MsgPackCodec`] - MessagePack via `rmp-serde` (`application/octet-stream`)
//!
//! [`Format`] ties each codec to its media type. Clients pick a format when
//! building an [`Endpoint`](crate::client::Endpoint); servers negotiate it per
//! request from the `Content-Type` header.
//!
//! # Example
//!
//! ```
//! use rpcwire::codec::Format;
//!
//! let format = Format::from_content_type("application/json; charset=utf-8").unwrap();
//! assert_eq!(format, Format::Json);
//!
//! let body = format.encode(&vec![1, 2, 3]).unwrap();
//! let decoded: Vec<i32> = format.decode(&body).unwrap();
//! assert_eq!(decoded, vec![1, 2, 3]);
//! ```

mod json;
mod msgpack;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;

/// Media type of JSON bodies.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Media type of MessagePack bodies.
pub const BINARY_MEDIA_TYPE: &str = "application/octet-stream";

/// Serialization format of a request or response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// JSON text.
    #[default]
    Json,
    /// MessagePack binary.
    Binary,
}

impl Format {
    /// All supported formats, in negotiation order.
    pub const ALL: [Format; 2] = [Format::Json, Format::Binary];

    /// The media type carried in `Content-Type` for this format.
    pub fn media_type(self) -> &'static str {
        match self {
            Format::Json => JSON_MEDIA_TYPE,
            Format::Binary => BINARY_MEDIA_TYPE,
        }
    }

    /// Map a `Content-Type` header value to a format.
    ///
    /// Parameters after `;` are ignored and the comparison is
    /// case-insensitive, so `Application/JSON; charset=utf-8` maps to
    /// [`Format::Json`]. Returns `None` for anything else.
    pub fn from_content_type(content_type: &str) -> Option<Format> {
        let media_type = content_type.split(';').next().unwrap_or("").trim();
        Self::ALL
            .into_iter()
            .find(|format| format.media_type().eq_ignore_ascii_case(media_type))
    }

    /// Encode a value in this format.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Bytes> {
        let encoded = match self {
            Format::Json => JsonCodec::encode(value)?,
            Format::Binary => MsgPackCodec::encode(value)?,
        };
        Ok(Bytes::from(encoded))
    }

    /// Decode a value in this format.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type T.
    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T> {
        match self {
            Format::Json => JsonCodec::decode(bytes),
            Format::Binary => MsgPackCodec::decode(bytes),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.media_type())
    }
}

/// Compile-time check that `T` can travel as a request or response body.
#[doc(hidden)]
pub fn assert_record<T: Serialize + DeserializeOwned>() {}

/// Message listing both accepted media types, used in 415 responses.
pub fn unsupported_media_type_message(content_type: Option<&str>) -> String {
    format!(
        "Media type '{}' is not supported. Must be either '{}' or '{}'.",
        content_type.unwrap_or(""),
        JSON_MEDIA_TYPE,
        BINARY_MEDIA_TYPE
    )
}
