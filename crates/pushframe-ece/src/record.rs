//! Record encryption using AES-128-GCM.
//!
//! One record is one padded plaintext chunk sealed under the message's
//! content key with a counter-derived nonce. Padding and authentication
//! are independent checks on open: a record with a valid tag but
//! nonzero pad bytes is still rejected.

// `Key`/`Nonce` construction goes through `GenericArray::from_slice`, which
// the resolved generic-array 0.14.x marks deprecated in favour of the 1.x
// API. The call sites are correct; silence the forward-looking lint.
#![allow(deprecated)]

use aes_gcm::{
    Aes128Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};

use crate::{
    derive::{NONCE_BASE_SIZE, PadSize, RecordKeyMaterial},
    error::{EceError, Result},
};

/// GCM authentication tag size appended to every record.
pub const TAG_SIZE: usize = 16;

/// Construct the nonce for one record.
///
/// The low 64 bits of the nonce base are XORed with the record counter;
/// the leading 4 octets pass through unchanged. Sequential counters
/// therefore give distinct nonces for every record of a message.
pub fn record_nonce(nonce_base: &[u8; NONCE_BASE_SIZE], counter: u64) -> [u8; NONCE_BASE_SIZE] {
    let mut mask_bytes = [0u8; 8];
    mask_bytes.copy_from_slice(&nonce_base[4..]);
    let mask = u64::from_be_bytes(mask_bytes);

    let mut nonce = *nonce_base;
    nonce[4..].copy_from_slice(&(mask ^ counter).to_be_bytes());
    nonce
}

/// Seal one plaintext chunk into a record.
///
/// The chunk is prefixed with a `pad_size`-octet zero padding length
/// (this encoder never emits nonzero padding) and encrypted; the output
/// is ciphertext followed by the 16-octet tag.
pub fn seal_record(
    material: &RecordKeyMaterial,
    counter: u64,
    plaintext: &[u8],
    pad_size: PadSize,
) -> Vec<u8> {
    let nonce = record_nonce(material.nonce_base(), counter);
    let cipher = Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(material.content_key()));

    let mut padded = vec![0u8; pad_size.bytes()];
    padded.extend_from_slice(plaintext);

    let Ok(sealed) = cipher.encrypt(Nonce::from_slice(&nonce), padded.as_slice()) else {
        unreachable!("AES-GCM encryption cannot fail with valid inputs");
    };
    sealed
}

/// Open one record back into its plaintext chunk.
///
/// # Errors
///
/// - `AuthenticationFailed` if the tag does not verify
/// - `BadPadding` if the padding prefix is malformed or any pad octet
///   is nonzero
pub fn open_record(
    material: &RecordKeyMaterial,
    counter: u64,
    record: &[u8],
    pad_size: PadSize,
) -> Result<Vec<u8>> {
    let nonce = record_nonce(material.nonce_base(), counter);
    let cipher = Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(material.content_key()));

    let padded = cipher
        .decrypt(Nonce::from_slice(&nonce), record)
        .map_err(|_| EceError::AuthenticationFailed)?;

    strip_padding(&padded, pad_size)
}

/// Verify and remove the padding prefix.
///
/// The first `pad_size` octets encode the pad length big-endian; that
/// many following octets must all be zero.
fn strip_padding(padded: &[u8], pad_size: PadSize) -> Result<Vec<u8>> {
    let prefix = pad_size.bytes();

    let Some(header) = padded.get(..prefix) else {
        return Err(EceError::BadPadding);
    };
    let pad_len = header.iter().fold(0usize, |acc, &b| (acc << 8) | usize::from(b));

    let end = prefix.checked_add(pad_len).ok_or(EceError::BadPadding)?;
    let Some(padding) = padded.get(prefix..end) else {
        return Err(EceError::BadPadding);
    };
    if padding.iter().any(|&b| b != 0) {
        return Err(EceError::BadPadding);
    }

    Ok(padded[end..].to_vec())
}
