//! Key derivation for record encryption.
//!
//! Turns a shared secret (or raw pre-shared key), a 16-octet salt, and
//! an optional authentication secret into the per-message content key
//! and nonce base. Derivation is HKDF-SHA-256 throughout, with info
//! strings that bind the output to the content encoding and, for
//! agreed secrets, to both parties' public keys.
//!
//! The secret source is an explicit parameter. There is no process-wide
//! key registry: everything a derivation needs travels in the
//! [`SecretSource`] value, so concurrent messages never share mutable
//! state.

use hkdf::Hkdf;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::{
    agreement::KeyAgreement,
    error::{EceError, Result},
};

/// Salt length in octets. Anything else is rejected.
pub const SALT_SIZE: usize = 16;

/// Content key length (AES-128-GCM key).
pub const CONTENT_KEY_SIZE: usize = 16;

/// Nonce base length (96-bit GCM nonce).
pub const NONCE_BASE_SIZE: usize = 12;

/// Info string for strengthening the secret with an auth secret.
const AUTH_INFO: &[u8] = b"Content-Encoding: auth\0";

/// Fixed info strings for the legacy single-octet pad mode. These
/// predate context binding and carry no public key material.
const LEGACY_KEY_INFO: &[u8] = b"Content-Encoding: aesgcm128";
const LEGACY_NONCE_INFO: &[u8] = b"Content-Encoding: nonce";

/// Strengthened secret length after auth-secret mixing.
const STRENGTHENED_SECRET_SIZE: usize = 32;

/// Whether material is being derived to encrypt or to decrypt.
///
/// The mode decides which party is the sender in the HKDF context:
/// when encrypting, the local key pair is the sender; when decrypting,
/// the peer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Local party is producing ciphertext (local key = sender).
    Encrypt,
    /// Local party is consuming ciphertext (local key = receiver).
    Decrypt,
}

/// Width of the padding-length prefix at the front of each record.
///
/// Doubles as the scheme version: two octets is the current encoding,
/// one octet is the legacy draft that derives from fixed info strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadSize {
    /// One-octet prefix, legacy `aesgcm128` derivation.
    Legacy,
    /// Two-octet prefix, context-bound `aesgcm` derivation.
    Standard,
}

impl PadSize {
    /// Parse a pad size from its wire value.
    ///
    /// # Errors
    ///
    /// - `UnsupportedPadMode` for any value other than 1 or 2
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Legacy),
            2 => Ok(Self::Standard),
            other => Err(EceError::UnsupportedPadMode(other)),
        }
    }

    /// Prefix width in octets.
    pub fn bytes(self) -> usize {
        match self {
            Self::Legacy => 1,
            Self::Standard => 2,
        }
    }
}

/// Where the input keying material comes from.
///
/// Exactly one source per derivation, passed by value. The agreement
/// variant carries the local key pair directly so role assignment and
/// context construction need no external lookup.
pub enum SecretSource<'a> {
    /// Raw pre-shared key, used as HKDF input keying material as-is.
    Raw(&'a [u8]),
    /// ECDH agreement between a local key pair and a peer public key.
    Agreement {
        /// Local key pair (the ephemeral sender key when encrypting).
        local: &'a dyn KeyAgreement,
        /// Peer's wire-encoded uncompressed public key.
        peer_public: &'a [u8],
    },
}

/// Derived per-message key material.
///
/// Valid for exactly one (salt, secret) pair; reused across every
/// record of that message and never across messages. Zeroized on drop.
pub struct RecordKeyMaterial {
    content_key: [u8; CONTENT_KEY_SIZE],
    nonce_base: [u8; NONCE_BASE_SIZE],
}

impl RecordKeyMaterial {
    /// Assemble material from already-derived parts.
    ///
    /// For callers that transport derived keys out-of-band; normal use
    /// goes through [`derive_key_and_nonce`].
    pub fn new(content_key: [u8; CONTENT_KEY_SIZE], nonce_base: [u8; NONCE_BASE_SIZE]) -> Self {
        Self { content_key, nonce_base }
    }

    /// AES-128-GCM content key.
    pub fn content_key(&self) -> &[u8; CONTENT_KEY_SIZE] {
        &self.content_key
    }

    /// Base value from which per-record nonces are constructed.
    pub fn nonce_base(&self) -> &[u8; NONCE_BASE_SIZE] {
        &self.nonce_base
    }
}

impl Drop for RecordKeyMaterial {
    fn drop(&mut self) {
        self.content_key.zeroize();
        self.nonce_base.zeroize();
    }
}

/// Generate a fresh random 16-octet salt from OS randomness.
///
/// Salts must be unique per message; reusing a salt with the same
/// secret breaks confidentiality.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive the content key and nonce base for one message.
///
/// When `auth_secret` is present the secret is first strengthened by an
/// HKDF pass keyed on the auth secret. The final key and nonce expand
/// from a single extract over `salt`, with info strings selected by
/// `pad_size`.
///
/// # Errors
///
/// - `InvalidSalt` if `salt` is not exactly 16 octets
/// - `MissingSecret` if the source yields no usable secret
/// - `InvalidPublicKeyEncoding` if an agreement peer key is malformed
pub fn derive_key_and_nonce(
    mode: Mode,
    salt: &[u8],
    source: &SecretSource<'_>,
    auth_secret: Option<&[u8]>,
    pad_size: PadSize,
) -> Result<RecordKeyMaterial> {
    if salt.len() != SALT_SIZE {
        return Err(EceError::InvalidSalt { len: salt.len() });
    }

    let (mut secret, context) = resolve_secret(mode, source)?;

    if let Some(auth) = auth_secret {
        let mut strengthened = strengthen_secret(auth, &secret);
        secret.zeroize();
        secret = strengthened.to_vec();
        strengthened.zeroize();
    }

    let (key_info, nonce_info) = match pad_size {
        PadSize::Standard => {
            (build_info(b"aesgcm", &context), build_info(b"nonce", &context))
        },
        PadSize::Legacy => (LEGACY_KEY_INFO.to_vec(), LEGACY_NONCE_INFO.to_vec()),
    };

    let hkdf = Hkdf::<Sha256>::new(Some(salt), &secret);

    let mut content_key = [0u8; CONTENT_KEY_SIZE];
    let Ok(()) = hkdf.expand(&key_info, &mut content_key) else {
        unreachable!("16 bytes is a valid HKDF-SHA256 output length");
    };

    let mut nonce_base = [0u8; NONCE_BASE_SIZE];
    let Ok(()) = hkdf.expand(&nonce_info, &mut nonce_base) else {
        unreachable!("12 bytes is a valid HKDF-SHA256 output length");
    };

    secret.zeroize();

    Ok(RecordKeyMaterial { content_key, nonce_base })
}

/// Resolve the secret and HKDF context from the source.
///
/// Raw secrets carry no context; agreed secrets bind both public keys
/// with sender/receiver roles assigned by `mode`.
fn resolve_secret(mode: Mode, source: &SecretSource<'_>) -> Result<(Vec<u8>, Vec<u8>)> {
    match source {
        SecretSource::Raw(key) => {
            if key.is_empty() {
                return Err(EceError::MissingSecret);
            }
            Ok((key.to_vec(), Vec::new()))
        },
        SecretSource::Agreement { local, peer_public } => {
            let shared = local.shared_secret(peer_public)?;
            let context = agreement_context(mode, *local, peer_public);
            Ok((shared.to_vec(), context))
        },
    }
}

/// Mix the auth secret into the shared secret.
fn strengthen_secret(auth_secret: &[u8], secret: &[u8]) -> [u8; STRENGTHENED_SECRET_SIZE] {
    let hkdf = Hkdf::<Sha256>::new(Some(auth_secret), secret);

    let mut strengthened = [0u8; STRENGTHENED_SECRET_SIZE];
    let Ok(()) = hkdf.expand(AUTH_INFO, &mut strengthened) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    strengthened
}

/// Build `label ‖ 0x00 ‖ len(receiver) ‖ receiver ‖ len(sender) ‖ sender`.
///
/// Lengths are big-endian u16 prefixes. The receiver key always comes
/// first regardless of which side derives.
fn agreement_context(mode: Mode, local: &dyn KeyAgreement, peer_public: &[u8]) -> Vec<u8> {
    let (sender, receiver) = match mode {
        Mode::Encrypt => (local.public_key(), peer_public),
        Mode::Decrypt => (peer_public, local.public_key()),
    };

    let label = local.label().as_bytes();
    let mut context =
        Vec::with_capacity(label.len() + 1 + 4 + receiver.len() + sender.len());
    context.extend_from_slice(label);
    context.push(0);
    push_length_prefixed(&mut context, receiver);
    push_length_prefixed(&mut context, sender);
    context
}

/// Append a big-endian u16 length prefix followed by the key itself.
fn push_length_prefixed(out: &mut Vec<u8>, key: &[u8]) {
    out.extend_from_slice(&(key.len() as u16).to_be_bytes());
    out.extend_from_slice(key);
}

/// Build `"Content-Encoding: " ‖ base ‖ 0x00 ‖ context`.
fn build_info(base: &[u8], context: &[u8]) -> Vec<u8> {
    const PREFIX: &[u8] = b"Content-Encoding: ";

    let mut info = Vec::with_capacity(PREFIX.len() + base.len() + 1 + context.len());
    info.extend_from_slice(PREFIX);
    info.extend_from_slice(base);
    info.push(0);
    info.extend_from_slice(context);
    info
}
