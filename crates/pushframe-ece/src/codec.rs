//! Message framing over sequences of encrypted records.
//!
//! A message is split into fixed-size records, each sealed with a
//! sequential counter. The encoder always ends on a short record: when
//! the plaintext divides evenly into chunks it emits one extra
//! padding-only terminator record, which is what lets the decoder
//! detect a body whose tail was dropped in transit.

use crate::{
    derive::{PadSize, RecordKeyMaterial},
    error::{EceError, Result},
    record::{TAG_SIZE, open_record, seal_record},
};

/// Record size used when the caller does not override it.
pub const DEFAULT_RECORD_SIZE: usize = 4096;

/// Encrypt a full payload into a concatenated record body.
///
/// Each record carries `record_size - pad_size` octets of plaintext.
///
/// # Errors
///
/// - `RecordSizeTooSmall` if `record_size` does not exceed the pad size
/// - `CounterOverflow` if the record counter would exceed 64 bits
pub fn encode_message(
    plaintext: &[u8],
    material: &RecordKeyMaterial,
    record_size: usize,
    pad_size: PadSize,
) -> Result<Vec<u8>> {
    check_record_size(record_size, pad_size)?;
    let stride = record_size - pad_size.bytes();

    let records = plaintext.len() / stride + 1;
    let mut body = Vec::with_capacity(records * (record_size + TAG_SIZE));

    let mut counter: u64 = 0;
    // Chunk boundaries run over [0, len] inclusive: when the plaintext
    // divides evenly into chunks the final boundary lands on the end
    // and seals an empty chunk, the padding-only terminator record.
    // Decoders rely on it for truncation detection; do not trim it.
    for start in (0..=plaintext.len()).step_by(stride) {
        let end = (start + stride).min(plaintext.len());

        body.extend_from_slice(&seal_record(material, counter, &plaintext[start..end], pad_size));
        counter = next_counter(counter)?;
    }

    Ok(body)
}

/// Decrypt a concatenated record body back into the payload.
///
/// # Errors
///
/// - `RecordSizeTooSmall` if `record_size` does not exceed the pad size
/// - `MessageTruncated` if the body length divides evenly into wire
///   records (the terminator was dropped) or a trailing record is too
///   short to hold a pad prefix and tag
/// - `AuthenticationFailed` / `BadPadding` from the failing record;
///   decoding aborts on the first bad record
pub fn decode_message(
    body: &[u8],
    material: &RecordKeyMaterial,
    record_size: usize,
    pad_size: PadSize,
) -> Result<Vec<u8>> {
    check_record_size(record_size, pad_size)?;
    let wire_record = record_size + TAG_SIZE;

    // A complete body always ends in a short record (partial final
    // chunk or padding-only terminator), so an exact multiple of the
    // wire record length means the tail went missing. This also
    // rejects the empty body.
    if body.len() % wire_record == 0 {
        return Err(EceError::MessageTruncated { body_len: body.len() });
    }

    let mut plaintext = Vec::with_capacity(body.len());
    let mut counter: u64 = 0;
    for record in body.chunks(wire_record) {
        if record.len() < pad_size.bytes() + TAG_SIZE {
            return Err(EceError::MessageTruncated { body_len: body.len() });
        }
        plaintext.extend_from_slice(&open_record(material, counter, record, pad_size)?);
        counter = next_counter(counter)?;
    }

    Ok(plaintext)
}

fn check_record_size(record_size: usize, pad_size: PadSize) -> Result<()> {
    if record_size <= pad_size.bytes() {
        return Err(EceError::RecordSizeTooSmall { record_size, pad_size: pad_size.bytes() });
    }
    Ok(())
}

fn next_counter(counter: u64) -> Result<u64> {
    counter.checked_add(1).ok_or(EceError::CounterOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::{Mode, SALT_SIZE, SecretSource, derive_key_and_nonce};

    fn test_material() -> RecordKeyMaterial {
        let secret: Vec<u8> = (0u8..32).collect();
        derive_key_and_nonce(
            Mode::Encrypt,
            &[0u8; SALT_SIZE],
            &SecretSource::Raw(&secret),
            None,
            PadSize::Standard,
        )
        .unwrap()
    }

    #[test]
    fn roundtrip_single_record() {
        let material = test_material();

        let body = encode_message(b"hello", &material, 20, PadSize::Standard).unwrap();
        assert_eq!(body.len(), 2 + 5 + TAG_SIZE);

        let plaintext = decode_message(&body, &material, 20, PadSize::Standard).unwrap();
        assert_eq!(plaintext, b"hello");
    }

    #[test]
    fn single_record_matches_reference_ciphertext() {
        // AES-128-GCM over the derive.rs reference vectors: key
        // 02bd78bd9fe7107394abe717edfdbee8, nonce 003c475d4ea4be4c49eac21b,
        // plaintext 0x0000 ‖ "hello".
        let material = test_material();

        let body = encode_message(b"hello", &material, 20, PadSize::Standard).unwrap();
        assert_eq!(
            body,
            hex::decode("a2a3dc4aa5176d140ace7f2c1ca2175338ed9124a9a552").unwrap()
        );
    }

    #[test]
    fn roundtrip_empty_plaintext() {
        let material = test_material();

        let body = encode_message(b"", &material, 20, PadSize::Standard).unwrap();
        // One padding-only record
        assert_eq!(body.len(), 2 + TAG_SIZE);

        let plaintext = decode_message(&body, &material, 20, PadSize::Standard).unwrap();
        assert!(plaintext.is_empty());
    }

    #[test]
    fn roundtrip_multiple_records() {
        let material = test_material();
        let payload: Vec<u8> = (0u8..=255).cycle().take(1000).collect();

        let body = encode_message(&payload, &material, 64, PadSize::Standard).unwrap();
        let plaintext = decode_message(&body, &material, 64, PadSize::Standard).unwrap();
        assert_eq!(plaintext, payload);
    }

    #[test]
    fn exact_multiple_emits_terminator_record() {
        let material = test_material();
        // stride = 20 - 2 = 18; 36 bytes = exactly two chunks
        let payload = [0x42u8; 36];

        let body = encode_message(&payload, &material, 20, PadSize::Standard).unwrap();

        // Two full records plus the padding-only terminator
        let full = 20 + TAG_SIZE;
        assert_eq!(body.len(), 2 * full + (2 + TAG_SIZE));

        let plaintext = decode_message(&body, &material, 20, PadSize::Standard).unwrap();
        assert_eq!(plaintext, payload);
    }

    #[test]
    fn partial_final_chunk_gets_no_terminator() {
        let material = test_material();
        // stride 18: one full chunk plus a 17-byte final chunk; only an
        // exact multiple earns the extra terminator record
        let payload = [0x24u8; 35];

        let body = encode_message(&payload, &material, 20, PadSize::Standard).unwrap();
        let full = 20 + TAG_SIZE;
        assert_eq!(body.len(), full + (2 + 17 + TAG_SIZE));

        let plaintext = decode_message(&body, &material, 20, PadSize::Standard).unwrap();
        assert_eq!(plaintext, payload);
    }

    #[test]
    fn one_byte_shy_of_a_chunk_roundtrips() {
        let material = test_material();
        let payload = [0x17u8; 17];

        let body = encode_message(&payload, &material, 20, PadSize::Standard).unwrap();
        assert_eq!(body.len(), 2 + 17 + TAG_SIZE);

        let plaintext = decode_message(&body, &material, 20, PadSize::Standard).unwrap();
        assert_eq!(plaintext, payload);
    }

    #[test]
    fn dropped_terminator_is_detected_as_truncation() {
        let material = test_material();
        let payload = [0x42u8; 36];

        let mut body = encode_message(&payload, &material, 20, PadSize::Standard).unwrap();
        // Drop the padding-only terminator record
        body.truncate(2 * (20 + TAG_SIZE));

        let result = decode_message(&body, &material, 20, PadSize::Standard);
        assert_eq!(result.err(), Some(EceError::MessageTruncated { body_len: 72 }));
    }

    #[test]
    fn exact_wire_multiple_is_truncated() {
        let material = test_material();

        // recordSize 10 -> wire record 26; 52 bytes is two exact records
        let body = [0u8; 52];
        let result = decode_message(&body, &material, 10, PadSize::Standard);
        assert_eq!(result.err(), Some(EceError::MessageTruncated { body_len: 52 }));
    }

    #[test]
    fn empty_body_is_truncated() {
        let material = test_material();

        let result = decode_message(&[], &material, 20, PadSize::Standard);
        assert_eq!(result.err(), Some(EceError::MessageTruncated { body_len: 0 }));
    }

    #[test]
    fn undersized_trailing_record_is_truncated() {
        let material = test_material();

        // 17 bytes: shorter than pad prefix + tag, decryption can never
        // succeed and the body is not a wire-record multiple
        let body = [0u8; 17];
        let result = decode_message(&body, &material, 20, PadSize::Standard);
        assert_eq!(result.err(), Some(EceError::MessageTruncated { body_len: 17 }));
    }

    #[test]
    fn record_size_must_exceed_pad_size() {
        let material = test_material();

        let encode = encode_message(b"x", &material, 2, PadSize::Standard);
        assert_eq!(
            encode.err(),
            Some(EceError::RecordSizeTooSmall { record_size: 2, pad_size: 2 })
        );

        let decode = decode_message(&[0u8; 5], &material, 1, PadSize::Legacy);
        assert_eq!(
            decode.err(),
            Some(EceError::RecordSizeTooSmall { record_size: 1, pad_size: 1 })
        );
    }

    #[test]
    fn tampered_record_aborts_the_whole_message() {
        let material = test_material();
        let payload = [0x11u8; 100];

        let mut body = encode_message(&payload, &material, 20, PadSize::Standard).unwrap();
        body[40] ^= 0x01; // inside the second record

        let result = decode_message(&body, &material, 20, PadSize::Standard);
        assert_eq!(result.err(), Some(EceError::AuthenticationFailed));
    }

    #[test]
    fn legacy_pad_roundtrip() {
        let secret: Vec<u8> = (0u8..32).collect();
        let material = derive_key_and_nonce(
            Mode::Encrypt,
            &[0u8; SALT_SIZE],
            &SecretSource::Raw(&secret),
            None,
            PadSize::Legacy,
        )
        .unwrap();

        let payload = b"legacy mode payload";
        let body = encode_message(payload, &material, 20, PadSize::Legacy).unwrap();
        let plaintext = decode_message(&body, &material, 20, PadSize::Legacy).unwrap();
        assert_eq!(plaintext, payload);
    }

    #[test]
    fn counter_increment_is_checked() {
        assert_eq!(next_counter(0).unwrap(), 1);
        assert_eq!(next_counter(u64::MAX).err(), Some(EceError::CounterOverflow));
    }
}
