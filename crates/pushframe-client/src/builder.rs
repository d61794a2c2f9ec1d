//! Push request assembly.
//!
//! One builder call performs the whole per-message sequence: fresh
//! ephemeral key pair, fresh salt, key derivation against the
//! subscriber's receiver key, record encoding, and header directive
//! assembly. Every message gets its own key pair and salt; nothing is
//! carried over between calls.

use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use pushframe_ece::{
    DEFAULT_RECORD_SIZE, KeyAgreement, Mode, P256KeyPair, PadSize, SecretSource,
    derive_key_and_nonce, encode_message, generate_salt,
};

use crate::{
    error::{Result, WebPushError},
    subscription::Subscriber,
};

/// Key identifier subscribers expect in the key-exchange directives.
const KEY_ID: &str = "p256dh";

/// Content encoding advertised alongside the encrypted body.
const CONTENT_ENCODING: &str = "aesgcm";

/// Legacy vendor gateway. Endpoints under this prefix take a JSON
/// envelope and an API-key authorization header instead of a raw body.
const GCM_ENDPOINT: &str = "https://android.googleapis.com/gcm/send";

/// Per-message build options.
#[derive(Debug, Clone)]
pub struct MessageOptions {
    /// Record size for the encoded body.
    pub record_size: usize,

    /// Seconds the push service should retain the message if the
    /// subscriber is offline. Zero discards immediately.
    pub ttl: u32,

    /// Use the legacy single-octet pad mode (`aesgcm128` derivation)
    /// for subscribers on the earlier draft.
    pub legacy_pad: bool,

    /// API key for the legacy vendor gateway. Required only when the
    /// subscriber's endpoint is under that gateway.
    pub gcm_api_key: Option<String>,

    /// Existing `crypto-key` header value to append the key-exchange
    /// directive to (e.g. a caller-managed application server key).
    pub crypto_key: Option<String>,
}

impl Default for MessageOptions {
    fn default() -> Self {
        Self {
            record_size: DEFAULT_RECORD_SIZE,
            ttl: 0,
            legacy_pad: false,
            gcm_api_key: None,
            crypto_key: None,
        }
    }
}

/// A wire-ready encrypted push request.
///
/// Delivery is the caller's: POST `body` to `endpoint` with `headers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    /// URL to deliver the message to.
    pub endpoint: String,

    /// Header directives the push service needs to route and the
    /// subscriber needs to reverse the encryption.
    pub headers: Vec<(&'static str, String)>,

    /// Encrypted record body, or the gateway JSON envelope around it.
    pub body: Vec<u8>,
}

/// Builds encrypted push requests for one subscriber.
pub struct MessageBuilder {
    subscriber: Subscriber,
}

impl MessageBuilder {
    /// Create a builder for the given subscriber.
    pub fn new(subscriber: Subscriber) -> Self {
        Self { subscriber }
    }

    /// Encrypt `plaintext` and assemble the complete request.
    ///
    /// # Errors
    ///
    /// - `Ece` variants from derivation or encoding
    /// - `MissingGcmApiKey` if the endpoint requires the legacy gateway
    ///   and no API key was supplied
    pub fn build(&self, plaintext: &[u8], options: &MessageOptions) -> Result<PushRequest> {
        let key_pair = P256KeyPair::generate();
        let salt = generate_salt();
        let pad_size = if options.legacy_pad { PadSize::Legacy } else { PadSize::Standard };

        let material = derive_key_and_nonce(
            Mode::Encrypt,
            &salt,
            &SecretSource::Agreement {
                local: &key_pair,
                peer_public: self.subscriber.receiver_key(),
            },
            Some(self.subscriber.auth_secret()),
            pad_size,
        )?;
        let body = encode_message(plaintext, &material, options.record_size, pad_size)?;

        let dh = URL_SAFE_NO_PAD.encode(key_pair.public_key());
        let exchange = format!("keyid={KEY_ID};dh={dh}");
        // Join with ';' rather than ',': some push services reject
        // comma-separated crypto-key directives.
        let crypto_key = match options.crypto_key.as_deref() {
            Some(existing) if !existing.is_empty() => format!("{existing};{exchange}"),
            _ => exchange,
        };
        let salt_b64 = URL_SAFE_NO_PAD.encode(salt);

        let headers = vec![
            ("crypto-key", crypto_key),
            ("encryption", format!("keyid={KEY_ID};salt={salt_b64}")),
            ("content-encoding", CONTENT_ENCODING.to_string()),
            ("ttl", options.ttl.to_string()),
        ];

        if self.subscriber.endpoint().starts_with(GCM_ENDPOINT) {
            return self.wrap_for_gateway(body, headers, options);
        }

        tracing::debug!(body_len = body.len(), "assembled push request");

        Ok(PushRequest { endpoint: self.subscriber.endpoint().to_string(), headers, body })
    }

    /// Wrap the encrypted body in the legacy gateway's JSON envelope.
    ///
    /// The registration id is the final path segment of the
    /// subscriber's endpoint; the raw body travels standard-base64
    /// inside the envelope and the request targets the gateway itself.
    fn wrap_for_gateway(
        &self,
        body: Vec<u8>,
        mut headers: Vec<(&'static str, String)>,
        options: &MessageOptions,
    ) -> Result<PushRequest> {
        let api_key =
            options.gcm_api_key.as_deref().ok_or(WebPushError::MissingGcmApiKey)?;
        let registration_id = self.subscriber.endpoint().rsplit('/').next().unwrap_or("");

        let envelope = serde_json::json!({
            "registration_ids": [registration_id],
            "raw_data": STANDARD.encode(&body),
        });
        let Ok(wrapped) = serde_json::to_vec(&envelope) else {
            unreachable!("an envelope of strings always serializes");
        };

        headers.push(("authorization", format!("key={api_key}")));
        headers.push(("content-type", "application/json".to_string()));

        tracing::debug!(registration_id, body_len = wrapped.len(), "wrapped body for legacy gateway");

        Ok(PushRequest { endpoint: GCM_ENDPOINT.to_string(), headers, body: wrapped })
    }
}
