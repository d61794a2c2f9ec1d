//! Key agreement provider for deriving per-message shared secrets.
//!
//! The derivation engine consumes key agreement through the
//! [`KeyAgreement`] capability trait so the HKDF/record logic never
//! touches curve arithmetic. The single production implementation is
//! [`P256KeyPair`] (NIST P-256 ECDH); future agreement schemes slot in
//! without touching derivation or encoding.
//!
//! Public keys travel as uncompressed SEC1 points: `0x04 ‖ X ‖ Y`, with
//! X and Y left-padded to the 32-byte field length.

// `raw_secret_bytes().as_slice()` resolves to `GenericArray::as_slice`, which
// the resolved generic-array 0.14.x marks deprecated in favour of the 1.x
// API. The call site is correct; silence the forward-looking lint.
#![allow(deprecated)]

use p256::{PublicKey, ecdh::EphemeralSecret, elliptic_curve::sec1::ToEncodedPoint};
use rand::rngs::OsRng;

use crate::error::{EceError, Result};

/// Length of an uncompressed P-256 public key: form byte plus two
/// 32-byte field elements.
pub const UNCOMPRESSED_POINT_SIZE: usize = 65;

/// Length of an ECDH shared secret in bytes.
pub const SHARED_SECRET_SIZE: usize = 32;

/// SEC1 conversion-form byte for uncompressed points.
const UNCOMPRESSED_FORM: u8 = 0x04;

/// Capability interface over an asymmetric key agreement scheme.
///
/// Implemented by a local key pair. The trait carries everything the
/// derivation engine needs: the scheme label used for HKDF context
/// binding, the local public key in wire encoding, and the shared
/// secret computation against a peer's public key.
pub trait KeyAgreement {
    /// Fixed ASCII identifier of the agreement scheme, bound into the
    /// HKDF context string.
    fn label(&self) -> &'static str;

    /// Local public key in uncompressed wire encoding.
    fn public_key(&self) -> &[u8];

    /// Compute the shared secret against a peer's wire-encoded public
    /// key.
    ///
    /// # Errors
    ///
    /// - `InvalidPublicKeyEncoding` if the peer key is not a valid
    ///   uncompressed point on the scheme's curve
    fn shared_secret(&self, peer_public: &[u8]) -> Result<[u8; SHARED_SECRET_SIZE]>;
}

/// NIST P-256 key pair for ECDH agreement.
///
/// Generated fresh per message; the secret scalar never leaves this
/// type and is dropped with the message. Reusing a pair across messages
/// defeats the scheme's per-message key separation.
pub struct P256KeyPair {
    /// Ephemeral scalar; zeroized on drop by the curve implementation.
    secret: EphemeralSecret,
    /// Cached uncompressed encoding of the public point.
    public: [u8; UNCOMPRESSED_POINT_SIZE],
}

impl P256KeyPair {
    /// Generate a fresh key pair from OS randomness.
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random(&mut OsRng);
        let point = secret.public_key().to_encoded_point(false);

        let mut public = [0u8; UNCOMPRESSED_POINT_SIZE];
        public.copy_from_slice(point.as_bytes());

        Self { secret, public }
    }
}

impl KeyAgreement for P256KeyPair {
    fn label(&self) -> &'static str {
        "P-256"
    }

    fn public_key(&self) -> &[u8] {
        &self.public
    }

    fn shared_secret(&self, peer_public: &[u8]) -> Result<[u8; SHARED_SECRET_SIZE]> {
        validate_public_key(peer_public)?;

        let peer =
            PublicKey::from_sec1_bytes(peer_public).map_err(|_| {
                EceError::InvalidPublicKeyEncoding {
                    reason: "not a point on the curve",
                    len: peer_public.len(),
                }
            })?;

        let shared = self.secret.diffie_hellman(&peer);

        let mut secret = [0u8; SHARED_SECRET_SIZE];
        secret.copy_from_slice(shared.raw_secret_bytes().as_slice());
        Ok(secret)
    }
}

/// Validate the wire encoding of an uncompressed public key.
///
/// Checks length and the leading conversion-form byte only; curve
/// membership is verified by the agreement implementation.
///
/// # Errors
///
/// - `InvalidPublicKeyEncoding` on wrong length or wrong form byte
pub fn validate_public_key(point: &[u8]) -> Result<()> {
    if point.len() != UNCOMPRESSED_POINT_SIZE {
        return Err(EceError::InvalidPublicKeyEncoding {
            reason: "expected a 65 octet uncompressed point",
            len: point.len(),
        });
    }
    if point[0] != UNCOMPRESSED_FORM {
        return Err(EceError::InvalidPublicKeyEncoding {
            reason: "expected the 0x04 uncompressed form byte",
            len: point.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_public_key_is_uncompressed() {
        let pair = P256KeyPair::generate();

        assert_eq!(pair.public_key().len(), UNCOMPRESSED_POINT_SIZE);
        assert_eq!(pair.public_key()[0], UNCOMPRESSED_FORM);
    }

    #[test]
    fn fresh_pairs_have_distinct_keys() {
        let a = P256KeyPair::generate();
        let b = P256KeyPair::generate();

        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn both_sides_agree_on_the_shared_secret() {
        let a = P256KeyPair::generate();
        let b = P256KeyPair::generate();

        let ab = a.shared_secret(b.public_key()).unwrap();
        let ba = b.shared_secret(a.public_key()).unwrap();

        assert_eq!(ab, ba, "ECDH must be symmetric");
    }

    #[test]
    fn distinct_peers_produce_distinct_secrets() {
        let local = P256KeyPair::generate();
        let peer_a = P256KeyPair::generate();
        let peer_b = P256KeyPair::generate();

        let sa = local.shared_secret(peer_a.public_key()).unwrap();
        let sb = local.shared_secret(peer_b.public_key()).unwrap();

        assert_ne!(sa, sb);
    }

    #[test]
    fn reject_wrong_length_key() {
        let local = P256KeyPair::generate();

        let result = local.shared_secret(&[0x04; 64]);
        assert!(matches!(
            result,
            Err(EceError::InvalidPublicKeyEncoding { len: 64, .. })
        ));
    }

    #[test]
    fn reject_wrong_form_byte() {
        let local = P256KeyPair::generate();
        let mut key = [0u8; UNCOMPRESSED_POINT_SIZE];
        key.copy_from_slice(local.public_key());
        key[0] = 0x02;

        let result = local.shared_secret(&key);
        assert!(matches!(result, Err(EceError::InvalidPublicKeyEncoding { .. })));
    }

    #[test]
    fn reject_garbage_point() {
        let local = P256KeyPair::generate();
        let mut key = [0xFFu8; UNCOMPRESSED_POINT_SIZE];
        key[0] = UNCOMPRESSED_FORM;

        let result = local.shared_secret(&key);
        assert!(matches!(result, Err(EceError::InvalidPublicKeyEncoding { .. })));
    }

    #[test]
    fn validate_accepts_real_key() {
        let pair = P256KeyPair::generate();
        assert!(validate_public_key(pair.public_key()).is_ok());
    }

    #[test]
    fn validate_rejects_empty_key() {
        assert!(matches!(
            validate_public_key(&[]),
            Err(EceError::InvalidPublicKeyEncoding { len: 0, .. })
        ));
    }
}
