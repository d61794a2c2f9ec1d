//! Error types for push message assembly.
//!
//! Engine errors pass through unchanged; the client adds only the
//! failures that can happen before encryption starts (subscription
//! validation) or after it finishes (gateway wrapping).

use pushframe_ece::EceError;
use thiserror::Error;

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, WebPushError>;

/// Errors that can occur while validating a subscription or building a
/// push request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebPushError {
    /// Subscription JSON did not parse
    #[error("subscription info is malformed: {0}")]
    MalformedSubscription(String),

    /// Subscription lacks a required key field
    #[error("subscription is missing required key material: {field}")]
    MissingKeyMaterial {
        /// Name of the absent field
        field: &'static str,
    },

    /// Subscription key field did not decode as base64url
    #[error("subscription field {field} is not valid base64url: {source}")]
    KeyDecode {
        /// Name of the undecodable field
        field: &'static str,
        /// Underlying decode failure
        source: base64::DecodeError,
    },

    /// Endpoint requires the legacy gateway but no API key was supplied
    #[error("API key not provided for gcm endpoint")]
    MissingGcmApiKey,

    /// Failure inside the content encoding engine
    #[error(transparent)]
    Ece(#[from] EceError),
}
