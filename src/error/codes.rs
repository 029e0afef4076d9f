//! Error code constants.
//!
//! Error codes are grouped by range:
//! - 3xxx: Validation errors (caller input)
//! - 4xxx: Resource errors
//! - 5xxx: Internal/System errors

/// Numeric code carried in every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(i32);

impl ErrorCode {
    // ===== Validation Errors (3xxx) =====

    /// Request body could not be decoded.
    pub const MALFORMED_BODY: Self = Self(3001);

    /// Required `key` field missing or empty.
    pub const MISSING_KEY: Self = Self(3002);

    /// HTTP method not accepted by the endpoint.
    pub const METHOD_NOT_ALLOWED: Self = Self(3003);

    // ===== Resource Errors (4xxx) =====

    /// Key does not exist in the backend.
    pub const KEY_NOT_FOUND: Self = Self(4001);

    // ===== Internal/System Errors (5xxx) =====

    /// Backend command failed.
    pub const BACKEND_ERROR: Self = Self(5001);

    /// Backend unavailable (pool exhausted or closed).
    pub const BACKEND_UNAVAILABLE: Self = Self(5003);

    /// Identifier assignment failed.
    pub const GENERATOR_ERROR: Self = Self(5004);

    /// Response encoding failed.
    pub const SERIALIZATION_ERROR: Self = Self(5005);

    /// Get the error code as an i32.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}
