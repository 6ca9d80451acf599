//! Inbound webhook signature checks.
//!
//! The external platform signs each delivery with HMAC-SHA256 over the raw
//! request body and sends `sha256=<hex>` in a header. We recompute over the
//! exact bytes received — never a re-serialized form, which would break on
//! any formatting difference — and compare in constant time.
//!
//! This is strictly a boolean gate: it never panics and never returns an
//! error. Missing header, empty secret, malformed header, or any
//! provider-level failure all degrade to `false`. That swallowing is
//! confined to this boundary; issuance paths elsewhere stay loud.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::crypto::{CryptoProvider, RustCryptoProvider};

const SUPPORTED_SCHEME: &str = "sha256";

#[derive(Clone)]
pub struct WebhookSignatureVerifier {
    provider: Arc<dyn CryptoProvider>,
}

impl fmt::Debug for WebhookSignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSignatureVerifier").finish()
    }
}

impl Default for WebhookSignatureVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookSignatureVerifier {
    pub fn new() -> Self {
        Self::with_provider(Arc::new(RustCryptoProvider))
    }

    pub fn with_provider(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    /// True iff `signature_header` is `sha256=<hex>` and the digest matches
    /// HMAC-SHA256 of `payload` under `secret`.
    ///
    /// A `None` header or empty secret means "not verifiable" — callers
    /// decide whether that skips verification or rejects the delivery.
    pub fn verify(&self, payload: &[u8], signature_header: Option<&str>, secret: &str) -> bool {
        let Some(header) = signature_header else {
            debug!("webhook delivery has no signature header");
            return false;
        };
        if secret.is_empty() {
            debug!("webhook secret is empty, payload not verifiable");
            return false;
        }

        // Exactly two `=`-separated parts, scheme pinned to sha256.
        let mut parts = header.split('=');
        let (Some(scheme), Some(digest), None) = (parts.next(), parts.next(), parts.next()) else {
            debug!("webhook signature header is malformed");
            return false;
        };
        if scheme != SUPPORTED_SCHEME {
            debug!(scheme, "unsupported webhook signature scheme");
            return false;
        }

        let mac = match self.provider.hmac_sha256(secret.as_bytes(), payload) {
            Ok(mac) => mac,
            Err(e) => {
                debug!(error = %e, "webhook hmac computation failed");
                return false;
            }
        };

        // Lowercase hex on our side; an uppercase digest will not match,
        // per the header contract. Length mismatches are rejected up front
        // by the constant-time comparison.
        let expected = hex::encode(mac);
        self.provider
            .constant_time_eq(expected.as_bytes(), digest.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CryptoError;

    const PAYLOAD: &[u8] = br#"{"action":"test"}"#;
    const SECRET: &str = "my_secret_key";

    // hex(HMAC-SHA256("my_secret_key", payload)), computed independently.
    const GOOD_DIGEST: &str = "7d2382b6b8e65af6cdd78b47eab3212e6a646fb94ec18d5d6e0adb8ae6b72838";
    // Same payload signed with "wrong_key".
    const WRONG_KEY_DIGEST: &str =
        "b4f076c5646a534ac387688025542de03ba35de00e07bf41125b086b80ac9983";

    #[test]
    fn known_vector_verifies() {
        let verifier = WebhookSignatureVerifier::new();
        let header = format!("sha256={GOOD_DIGEST}");
        assert!(verifier.verify(PAYLOAD, Some(&header), SECRET));
    }

    #[test]
    fn digest_from_wrong_key_is_rejected() {
        let verifier = WebhookSignatureVerifier::new();
        let header = format!("sha256={WRONG_KEY_DIGEST}");
        assert!(!verifier.verify(PAYLOAD, Some(&header), SECRET));
    }

    #[test]
    fn missing_header_and_empty_secret_are_not_verifiable() {
        let verifier = WebhookSignatureVerifier::new();
        assert!(!verifier.verify(PAYLOAD, None, SECRET));
        assert!(!verifier.verify(PAYLOAD, Some(&format!("sha256={GOOD_DIGEST}")), ""));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let verifier = WebhookSignatureVerifier::new();
        for bad in [
            "",
            "sha256",
            &format!("sha256={GOOD_DIGEST}=extra"),
            &format!("sha1={GOOD_DIGEST}"),
            &format!("SHA256={GOOD_DIGEST}"),
            &format!("sha256 {GOOD_DIGEST}"),
        ] {
            assert!(
                !verifier.verify(PAYLOAD, Some(bad), SECRET),
                "{bad:?} should not verify"
            );
        }
    }

    #[test]
    fn digest_casing_and_truncation_are_rejected() {
        let verifier = WebhookSignatureVerifier::new();
        let uppercase = format!("sha256={}", GOOD_DIGEST.to_uppercase());
        assert!(!verifier.verify(PAYLOAD, Some(&uppercase), SECRET));

        let truncated = format!("sha256={}", &GOOD_DIGEST[..GOOD_DIGEST.len() - 2]);
        assert!(!verifier.verify(PAYLOAD, Some(&truncated), SECRET));
    }

    #[test]
    fn payload_bytes_are_used_verbatim() {
        // Re-serialization would turn this into different bytes; the
        // verifier must not. Whitespace variant of the same JSON fails.
        let verifier = WebhookSignatureVerifier::new();
        let header = format!("sha256={GOOD_DIGEST}");
        assert!(!verifier.verify(br#"{ "action": "test" }"#, Some(&header), SECRET));
    }

    #[test]
    fn provider_failure_degrades_to_false() {
        struct FailingProvider;
        impl CryptoProvider for FailingProvider {
            fn hmac_sha256(&self, _: &[u8], _: &[u8]) -> Result<Vec<u8>, CryptoError> {
                Err(CryptoError::MacKeyRejected)
            }
            fn constant_time_eq(&self, _: &[u8], _: &[u8]) -> bool {
                true
            }
        }

        let verifier = WebhookSignatureVerifier::with_provider(Arc::new(FailingProvider));
        let header = format!("sha256={GOOD_DIGEST}");
        assert!(!verifier.verify(PAYLOAD, Some(&header), SECRET));
    }
}
