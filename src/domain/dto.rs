//! Data Transfer Objects for API requests and responses.
//!
//! Callers never supply a `uid`; any `uid` field in a request body is ignored
//! and replaced by the server-assigned identifier in the response.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::service::Counter;

/// The four CRUD operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    /// Counter incremented when the operation succeeds.
    #[must_use]
    pub const fn counter(self) -> Counter {
        match self {
            Self::Create => Counter::Create,
            Self::Read => Counter::Read,
            Self::Update => Counter::Update,
            Self::Delete => Counter::Delete,
        }
    }

    /// Lowercase operation name, as used in routes and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of create and update requests.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteRequest {
    /// Storage key (required, non-empty).
    #[serde(default)]
    pub key: String,

    /// Value to store. Empty strings are legal values.
    pub value: String,
}

impl WriteRequest {
    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingKey`] if `key` is empty.
    pub fn validate(&self) -> Result<()> {
        validate_key(&self.key)
    }
}

/// Body of read and delete requests.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyRequest {
    /// Storage key (required, non-empty).
    #[serde(default)]
    pub key: String,
}

impl KeyRequest {
    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingKey`] if `key` is empty.
    pub fn validate(&self) -> Result<()> {
        validate_key(&self.key)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(AppError::MissingKey);
    }
    Ok(())
}

/// Response for every successful CRUD request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordResponse {
    /// Server-assigned request identifier.
    pub uid: u64,

    /// Key the operation applied to.
    pub key: String,

    /// Stored or fetched value; absent for deletes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl RecordResponse {
    /// Response carrying a value.
    #[must_use]
    pub const fn with_value(uid: u64, key: String, value: String) -> Self {
        Self {
            uid,
            key,
            value: Some(value),
        }
    }

    /// Response without a value.
    #[must_use]
    pub const fn without_value(uid: u64, key: String) -> Self {
        Self {
            uid,
            key,
            value: None,
        }
    }
}
