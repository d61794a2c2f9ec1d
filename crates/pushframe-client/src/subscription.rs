//! Subscriber identity from browser push subscriptions.
//!
//! A `PushSubscription.getJSON()` object carries the delivery endpoint
//! plus two base64url values: the subscriber's P-256 receiver key
//! (`p256dh`) and the out-of-band auth secret (`auth`). [`Subscriber`]
//! is the validated form the message builder consumes.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use pushframe_ece::validate_public_key;
use serde::Deserialize;

use crate::error::{Result, WebPushError};

/// Raw subscription info as produced by the browser.
///
/// Field presence is checked by [`Subscriber::from_info`], not by
/// deserialization, so callers get a `MissingKeyMaterial` error naming
/// the absent field rather than a serde message.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionInfo {
    /// Push service delivery URL for this subscriber.
    pub endpoint: String,

    /// Key material block.
    #[serde(default)]
    pub keys: SubscriptionKeys,
}

/// The `keys` block of a subscription.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionKeys {
    /// Base64url uncompressed P-256 receiver public key.
    #[serde(default)]
    pub p256dh: Option<String>,

    /// Base64url 16-octet authentication secret.
    #[serde(default)]
    pub auth: Option<String>,
}

/// Validated subscriber identity.
///
/// Immutable; supplied per message. The receiver key has been checked
/// to be a well-formed uncompressed point, the auth secret is kept as
/// opaque bytes.
#[derive(Debug, Clone)]
pub struct Subscriber {
    endpoint: String,
    receiver_key: Vec<u8>,
    auth_secret: Vec<u8>,
}

impl Subscriber {
    /// Validate raw subscription info.
    ///
    /// Accepts both padded and unpadded base64url in the key fields;
    /// browsers emit unpadded values but stored copies often regain
    /// their padding.
    ///
    /// # Errors
    ///
    /// - `MissingKeyMaterial` if `p256dh` or `auth` is absent
    /// - `KeyDecode` if a key field is not valid base64url
    /// - `Ece(InvalidPublicKeyEncoding)` if the receiver key is not a
    ///   65-octet uncompressed point
    pub fn from_info(info: &SubscriptionInfo) -> Result<Self> {
        let p256dh = info
            .keys
            .p256dh
            .as_deref()
            .ok_or(WebPushError::MissingKeyMaterial { field: "p256dh" })?;
        let auth = info
            .keys
            .auth
            .as_deref()
            .ok_or(WebPushError::MissingKeyMaterial { field: "auth" })?;

        let receiver_key = decode_key_field("p256dh", p256dh)?;
        validate_public_key(&receiver_key)?;

        let auth_secret = decode_key_field("auth", auth)?;

        Ok(Self { endpoint: info.endpoint.clone(), receiver_key, auth_secret })
    }

    /// Parse and validate a subscription from its JSON form.
    ///
    /// # Errors
    ///
    /// - `MalformedSubscription` if the JSON does not parse
    /// - plus everything [`Subscriber::from_info`] rejects
    pub fn from_json(json: &str) -> Result<Self> {
        let info: SubscriptionInfo = serde_json::from_str(json)
            .map_err(|e| WebPushError::MalformedSubscription(e.to_string()))?;
        Self::from_info(&info)
    }

    /// Push service delivery URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Uncompressed P-256 receiver public key.
    pub fn receiver_key(&self) -> &[u8] {
        &self.receiver_key
    }

    /// Opaque authentication secret.
    pub fn auth_secret(&self) -> &[u8] {
        &self.auth_secret
    }
}

/// Decode a base64url subscription field, tolerating trailing padding.
fn decode_key_field(field: &'static str, value: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(value.trim_end_matches('='))
        .map_err(|source| WebPushError::KeyDecode { field, source })
}
