//! Contract declarations as read from a JSON schema document.
//!
//! ```json
//! {
//!   "services": [{
//!     "name": "UserService",
//!     "methods": [{
//!       "name": "getUser",
//!       "params": [{ "name": "request", "type": "crate::GetRequest" }],
//!       "output": "crate::GetResponse"
//!     }]
//!   }]
//! }
//! ```
//!
//! Nothing here is checked beyond JSON well-formedness; see
//! [`validate`](super::validate).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A set of service declarations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub services: Vec<ServiceDecl>,
}

impl Schema {
    /// Parse a schema document.
    ///
    /// # Errors
    ///
    /// Returns error if `json` is not a schema document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a schema document.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a schema document.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// An unvalidated service interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDecl {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

/// An unvalidated method signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    /// Output record type; absent for methods that return nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}
