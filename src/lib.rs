//! Signed-token core for the feedback platform.
//!
//! This crate is the cryptographic trust boundary shared by the (out of
//! scope) web layer. It covers three independent concerns:
//! - Widget SSO identity tokens (HMAC-SHA256): issue + verify
//! - Short-lived service assertions (RSA-SHA256) for calling the external
//!   app platform: issue only
//! - Inbound webhook signature checks (`sha256=<hex>`): verify only
//!
//! Callers pass key material into every operation; nothing here reads the
//! environment, touches a database, or retains secrets between calls.

pub mod crypto;
pub mod error;
pub mod services;
pub mod token;

pub use crypto::{CryptoError, CryptoProvider, RustCryptoProvider};
pub use error::TokenError;
pub use services::identity_token::{IdentityTokenCodec, UserIdentity};
pub use services::service_assertion::ServiceAssertionIssuer;
pub use services::webhook_signature::WebhookSignatureVerifier;
pub use token::{SignedToken, SigningAlgorithm};
