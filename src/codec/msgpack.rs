//! MsgPack codec using `rmp-serde`.
//!
//! Records are written with `to_vec_named`, i.e. as maps keyed by field
//! name. Field order may then change between versions of a record without
//! breaking peers, and optional fields can be omitted, which the `Try`
//! envelope relies on.

use crate::error::Result;

/// MessagePack codec for binary bodies.
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode a value to MsgPack bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    /// Decode MsgPack bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
