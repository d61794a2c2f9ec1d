//! Pushframe Encrypted Content Encoding
//!
//! Record-based authenticated encryption for push message delivery. Pure
//! functions with deterministic outputs; the only randomness entry points
//! are [`P256KeyPair::generate`] and [`generate_salt`], both explicit.
//!
//! # Message Lifecycle
//!
//! A message is encrypted once per delivery under keys derived from an
//! ECDH agreement between a fresh ephemeral key pair and the subscriber's
//! long-lived receiver key, bound to a random per-message salt:
//!
//! ```text
//! ECDH Shared Secret (or raw pre-shared key)
//!        │
//!        ▼
//! HKDF → Content Key (16 bytes) + Nonce Base (12 bytes)
//!        │
//!        ▼
//! Record Codec → padded fixed-size records, counters 0,1,2,…
//!        │
//!        ▼
//! AEAD Encryption → ciphertext ‖ tag per record
//! ```
//!
//! Key material is derived once per message, is never reused across two
//! salts, and is zeroized on drop.
//!
//! # Security
//!
//! Confidentiality and integrity:
//! - AES-128-GCM AEAD per record; a failed tag rejects the whole message
//! - Padding is verified independently of the tag; nonzero pad bytes
//!   reject the record even when authentication succeeds
//!
//! Nonce uniqueness:
//! - Per-record nonce = nonce base XOR record counter (low 64 bits)
//! - Counters are strictly sequential within a message
//! - Distinct salts derive distinct nonce bases across messages
//!
//! Framing:
//! - Every message ends in a short record; an encoder emits a trailing
//!   padding-only terminator record when the plaintext divides evenly
//!   into chunks, so decoders detect dropped tails as truncation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod agreement;
pub mod codec;
pub mod derive;
pub mod error;
pub mod record;

pub use agreement::{
    KeyAgreement, P256KeyPair, SHARED_SECRET_SIZE, UNCOMPRESSED_POINT_SIZE, validate_public_key,
};
pub use codec::{DEFAULT_RECORD_SIZE, decode_message, encode_message};
pub use derive::{
    CONTENT_KEY_SIZE, Mode, NONCE_BASE_SIZE, PadSize, RecordKeyMaterial, SALT_SIZE, SecretSource,
    derive_key_and_nonce, generate_salt,
};
pub use error::{EceError, Result};
pub use record::{TAG_SIZE, open_record, seal_record};
