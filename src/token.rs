//! Wire-level token types shared by the issuing services.
//!
//! A signed token is three base64url segments joined by `.`:
//! `header.payload.signature`, no padding. Segments are immutable once
//! produced; verification never rewrites or re-encodes them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Signing algorithm named in a token header.
///
/// Each verifier hardcodes the single algorithm it accepts and rejects
/// tokens naming any other one, so the header value is never negotiable
/// (algorithm-confusion defense). Unknown strings fail deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    HS256,
    RS256,
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningAlgorithm::HS256 => f.write_str("HS256"),
            SigningAlgorithm::RS256 => f.write_str("RS256"),
        }
    }
}

/// JOSE-style header: `{"alg":"...","typ":"JWT"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoseHeader {
    pub alg: SigningAlgorithm,
    pub typ: String,
}

impl JoseHeader {
    pub fn new(alg: SigningAlgorithm) -> Self {
        Self {
            alg,
            typ: "JWT".to_string(),
        }
    }

    /// True when this header names exactly the expected algorithm and typ.
    pub fn matches(&self, expected: SigningAlgorithm) -> bool {
        self.alg == expected && self.typ == "JWT"
    }
}

/// A produced token in its wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken(String);

impl SignedToken {
    pub(crate) fn new(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SignedToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Split a candidate token into its three segments.
///
/// This is the first check every verifier runs: anything other than exactly
/// three segments is rejected before any cryptographic work.
pub(crate) fn split_segments(token: &str) -> Result<[&str; 3], TokenError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::MalformedToken("expected three segments"));
    };
    Ok([header, payload, signature])
}
