use crate::crypto::CryptoError;

/// Errors returned by token issuance and verification.
///
/// Verification failures are expected steady-state outcomes and are always
/// returned as values, never panicked on. The variants are deliberately
/// coarse but distinguishable: callers can tell "malformed" from "forged"
/// from "expired" for logging, even if they surface all three as a single
/// generic rejection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The caller passed an empty or otherwise unusable required field.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Structural parse failure: wrong segment count, bad base64, bad JSON,
    /// unexpected algorithm, or a missing required claim.
    #[error("malformed token: {0}")]
    MalformedToken(&'static str),

    /// Structurally fine, but the signature does not match.
    #[error("signature mismatch")]
    InvalidSignature,

    /// Structurally and cryptographically valid, but past its time window.
    #[error("token expired")]
    Expired,

    /// Key material the cryptographic provider rejects.
    #[error("key material rejected")]
    InvalidKey,
}

impl From<CryptoError> for TokenError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::MacKeyRejected => TokenError::InvalidKey,
            CryptoError::InvalidBase64 => TokenError::MalformedToken("invalid base64url segment"),
        }
    }
}
