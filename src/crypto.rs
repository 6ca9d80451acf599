//! Cryptographic primitives behind a small provider seam.
//!
//! The token services only need two symmetric primitives (HMAC-SHA256 and a
//! constant-time comparison), so they take them through `CryptoProvider`
//! instead of calling the crates directly. That keeps the services testable
//! with a fake provider. RSA signing for service assertions stays with
//! `jsonwebtoken` inside the issuer itself.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Provider-level failures. These are converted at the service boundary:
/// issuance surfaces them as `TokenError`, the webhook verifier degrades
/// them to `false`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("mac key rejected by provider")]
    MacKeyRejected,

    #[error("invalid base64url data")]
    InvalidBase64,
}

/// Injected cryptographic capability.
///
/// Implementations must be pure: no caching of keys or MAC state between
/// calls.
pub trait CryptoProvider: Send + Sync {
    /// HMAC-SHA256 of `message` under `key` (raw key bytes, any length).
    fn hmac_sha256(&self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Constant-time equality.
    ///
    /// Unequal lengths are an immediate `false` without reading past either
    /// buffer; for equal lengths the running time does not depend on where
    /// the buffers first differ.
    fn constant_time_eq(&self, a: &[u8], b: &[u8]) -> bool;
}

/// Default provider backed by the `hmac`/`sha2`/`subtle` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

impl CryptoProvider for RustCryptoProvider {
    fn hmac_sha256(&self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        // HMAC accepts any key length, so this only fails if the provider
        // itself is broken.
        let mut mac = HmacSha256::new_from_slice(key).map_err(|_| CryptoError::MacKeyRejected)?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn constant_time_eq(&self, a: &[u8], b: &[u8]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        a.ct_eq(b).into()
    }
}

/// URL-safe base64 without padding, as used for every token segment.
pub fn b64url_encode(data: &[u8]) -> String {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    URL_SAFE_NO_PAD.encode(data)
}

pub fn b64url_decode(segment: &str) -> Result<Vec<u8>, CryptoError> {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| CryptoError::InvalidBase64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_sha256_matches_known_vector() {
        // RFC 4231 test case 2.
        let mac = RustCryptoProvider
            .hmac_sha256(b"Jefe", b"what do ya want for nothing?")
            .unwrap();
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn constant_time_eq_rejects_unequal_lengths() {
        let p = RustCryptoProvider;
        assert!(!p.constant_time_eq(b"abc", b"abcd"));
        assert!(!p.constant_time_eq(b"abcd", b"abc"));
        assert!(!p.constant_time_eq(b"", b"a"));
    }

    #[test]
    fn constant_time_eq_equal_and_differing() {
        let p = RustCryptoProvider;
        assert!(p.constant_time_eq(b"same-bytes", b"same-bytes"));
        assert!(p.constant_time_eq(b"", b""));
        assert!(!p.constant_time_eq(b"same-bytes", b"same-bytez"));
    }

    #[test]
    fn b64url_roundtrip_without_padding() {
        let encoded = b64url_encode(b"\xfb\xff\xfe segment");
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert_eq!(b64url_decode(&encoded).unwrap(), b"\xfb\xff\xfe segment");
    }

    #[test]
    fn b64url_decode_rejects_standard_alphabet() {
        assert_eq!(b64url_decode("a+b/"), Err(CryptoError::InvalidBase64));
        assert_eq!(b64url_decode("abc="), Err(CryptoError::InvalidBase64));
    }
}
