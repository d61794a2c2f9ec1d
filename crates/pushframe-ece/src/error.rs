//! Error types for the content encoding engine.
//!
//! Every variant is terminal for the message being processed: record
//! boundaries and counters are derived sequentially, so a failed record
//! cannot be skipped and decoding aborts. Nothing is retried internally.

use thiserror::Error;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EceError>;

/// Errors that can occur while deriving keys or encoding/decoding records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EceError {
    /// Salt was not exactly 16 octets
    #[error("salt must be a 16 octet value, got {len} octets")]
    InvalidSalt {
        /// Length of the rejected salt
        len: usize,
    },

    /// Pad size other than 1 (legacy) or 2 (standard) requested
    #[error("unsupported pad size: {0}")]
    UnsupportedPadMode(u8),

    /// No usable secret material was supplied to derivation
    #[error("unable to determine the secret")]
    MissingSecret,

    /// Record size does not leave room for the padding prefix
    #[error("record size {record_size} must exceed pad size {pad_size}")]
    RecordSizeTooSmall {
        /// Requested record size
        record_size: usize,
        /// Pad size in effect
        pad_size: usize,
    },

    /// Ciphertext body length is consistent with a dropped final record
    #[error("message truncated ({body_len} byte body)")]
    MessageTruncated {
        /// Length of the rejected body
        body_len: usize,
    },

    /// Record counter exceeded 64 bits
    #[error("record counter exceeded 64 bits")]
    CounterOverflow,

    /// AEAD authentication tag did not verify
    #[error("record authentication failed")]
    AuthenticationFailed,

    /// Padding prefix was malformed or pad bytes were not all zero
    #[error("bad record padding")]
    BadPadding,

    /// Public key was not a valid uncompressed curve point
    #[error("invalid public key encoding: {reason} ({len} octets)")]
    InvalidPublicKeyEncoding {
        /// What was wrong with the encoding
        reason: &'static str,
        /// Length of the rejected key
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_offending_values() {
        let err = EceError::InvalidSalt { len: 12 };
        assert!(err.to_string().contains("12"));

        let err = EceError::RecordSizeTooSmall { record_size: 2, pad_size: 2 };
        assert!(err.to_string().contains('2'));

        let err = EceError::MessageTruncated { body_len: 52 };
        assert!(err.to_string().contains("52"));
    }
}
