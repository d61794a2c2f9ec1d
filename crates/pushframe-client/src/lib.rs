//! Pushframe push-message client.
//!
//! Turns a raw plaintext and a subscriber's public identity into a
//! complete, wire-ready encrypted request: a fresh ephemeral key pair
//! and salt per message, derivation and record encoding through
//! [`pushframe_ece`], and the header directives the push service needs
//! to reverse the encryption.
//!
//! Transport is the caller's: [`PushRequest`] carries the endpoint,
//! headers, and body, and any HTTP client can deliver it. Endpoints
//! under the legacy vendor gateway get their body wrapped in that
//! gateway's JSON envelope instead of being sent raw.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod builder;
pub mod error;
pub mod subscription;

pub use builder::{MessageBuilder, MessageOptions, PushRequest};
pub use error::{Result, WebPushError};
pub use subscription::{Subscriber, SubscriptionInfo, SubscriptionKeys};
