//! Widget SSO identity tokens (HS256).
//!
//! The web layer hands us a user identity and a shared secret; we hand back
//! a bearer token the embeddable widget can present, and turn presented
//! tokens back into validated identities. The secret is a per-call
//! parameter: this codec never stores key material.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::crypto::{CryptoProvider, RustCryptoProvider, b64url_decode, b64url_encode};
use crate::error::TokenError;
use crate::token::{JoseHeader, SignedToken, SigningAlgorithm, split_segments};

/// Default identity-token lifetime: one day.
pub const DEFAULT_TTL_SECONDS: u64 = 86_400;

/// User-identity claim set carried by an SSO token.
///
/// Fields are carried through verbatim in both directions; callers own the
/// formatting of email/name. Only `subject_id` is mandatory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserIdentity {
    pub subject_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Free-form caller metadata, embedded in the payload as-is.
    pub metadata: Option<Map<String, Value>>,
}

impl UserIdentity {
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            ..Self::default()
        }
    }
}

/// Wire payload. Claim names are the external contract (camelCase), so this
/// stays a flat struct: field order here is the serialization order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityClaims {
    subject_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Map<String, Value>>,
    issued_at: i64,
    expires_at: i64,
}

impl IdentityClaims {
    fn from_identity(identity: UserIdentity, issued_at: i64, expires_at: i64) -> Self {
        Self {
            subject_id: identity.subject_id,
            email: identity.email,
            display_name: identity.display_name,
            avatar_url: identity.avatar_url,
            metadata: identity.metadata,
            issued_at,
            expires_at,
        }
    }

    fn into_identity(self) -> UserIdentity {
        UserIdentity {
            subject_id: self.subject_id,
            email: self.email,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            metadata: self.metadata,
        }
    }
}

/// Issues and verifies HS256 identity tokens.
///
/// Holds only policy knobs (lifetime, verification leeway) and the injected
/// crypto provider. Safe to share across threads; every operation is a pure
/// function of (input, secret, clock).
#[derive(Clone)]
pub struct IdentityTokenCodec {
    provider: Arc<dyn CryptoProvider>,
    ttl_seconds: u64,
    leeway_seconds: u64,
}

impl fmt::Debug for IdentityTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityTokenCodec")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl Default for IdentityTokenCodec {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECONDS, 0)
    }
}

impl IdentityTokenCodec {
    /// `leeway_seconds` widens the expiry check at verification time to
    /// tolerate clock skew between issuer and verifier. Zero (no tolerance)
    /// is the default.
    pub fn new(ttl_seconds: u64, leeway_seconds: u64) -> Self {
        Self::with_provider(ttl_seconds, leeway_seconds, Arc::new(RustCryptoProvider))
    }

    pub fn with_provider(
        ttl_seconds: u64,
        leeway_seconds: u64,
        provider: Arc<dyn CryptoProvider>,
    ) -> Self {
        Self {
            provider,
            ttl_seconds,
            leeway_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn leeway_seconds(&self) -> u64 {
        self.leeway_seconds
    }

    /// Issue a token for `identity`, signed with `secret`.
    pub fn issue(&self, identity: &UserIdentity, secret: &str) -> Result<SignedToken, TokenError> {
        self.issue_at(identity, secret, Utc::now())
    }

    /// Same as [`issue`](Self::issue) with an explicit clock.
    pub fn issue_at(
        &self,
        identity: &UserIdentity,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedToken, TokenError> {
        if secret.is_empty() {
            warn!("refusing to issue identity token with an empty secret");
            return Err(TokenError::InvalidInput("secret"));
        }
        if identity.subject_id.is_empty() {
            return Err(TokenError::InvalidInput("subject_id"));
        }
        if self.ttl_seconds == 0 {
            // expires_at must end up strictly greater than issued_at.
            return Err(TokenError::InvalidInput("ttl_seconds"));
        }

        let issued_at = now.timestamp();
        let expires_at = issued_at + self.ttl_seconds as i64;
        let claims = IdentityClaims::from_identity(identity.clone(), issued_at, expires_at);

        let header_json = serde_json::to_vec(&JoseHeader::new(SigningAlgorithm::HS256))
            .map_err(|e| {
                error!(error = %e, "failed to serialize identity token header");
                TokenError::InvalidInput("header")
            })?;
        let payload_json = serde_json::to_vec(&claims).map_err(|e| {
            error!(error = %e, "failed to serialize identity token claims");
            TokenError::InvalidInput("identity")
        })?;

        let signing_input = format!(
            "{}.{}",
            b64url_encode(&header_json),
            b64url_encode(&payload_json)
        );
        let mac = self
            .provider
            .hmac_sha256(secret.as_bytes(), signing_input.as_bytes())?;

        Ok(SignedToken::new(format!(
            "{signing_input}.{}",
            b64url_encode(&mac)
        )))
    }

    /// Verify `token` against `secret` and return its identity claims.
    ///
    /// Read-only and safe to call concurrently; a token can be consumed any
    /// number of times until the clock passes its expiry.
    pub fn verify(&self, token: &str, secret: &str) -> Result<UserIdentity, TokenError> {
        self.verify_at(token, secret, Utc::now())
    }

    /// Same as [`verify`](Self::verify) with an explicit clock.
    pub fn verify_at(
        &self,
        token: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<UserIdentity, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidInput("secret"));
        }

        let [header_b64, payload_b64, signature_b64] = split_segments(token)?;

        // Authenticate before parsing: attacker-controlled JSON is only
        // decoded once the signature checks out. The algorithm is pinned to
        // HS256 here regardless of what the header claims.
        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
        let expected = self
            .provider
            .hmac_sha256(secret.as_bytes(), signing_input.as_bytes())?;
        let presented = b64url_decode(signature_b64)?;
        if !self.provider.constant_time_eq(&expected, &presented) {
            debug!("identity token signature mismatch");
            return Err(TokenError::InvalidSignature);
        }

        let header: JoseHeader = serde_json::from_slice(&b64url_decode(header_b64)?)
            .map_err(|_| TokenError::MalformedToken("invalid header json"))?;
        if !header.matches(SigningAlgorithm::HS256) {
            debug!(alg = %header.alg, "identity token names an unexpected algorithm");
            return Err(TokenError::MalformedToken("unexpected algorithm"));
        }

        let claims: IdentityClaims = serde_json::from_slice(&b64url_decode(payload_b64)?)
            .map_err(|_| TokenError::MalformedToken("invalid payload json"))?;
        if claims.subject_id.is_empty() {
            return Err(TokenError::MalformedToken("empty subjectId claim"));
        }

        // Millisecond comparison; the deadline only stretches by the
        // configured leeway. Saturating math guards hostile expiry values.
        let deadline_ms = claims
            .expires_at
            .saturating_mul(1_000)
            .saturating_add((self.leeway_seconds as i64).saturating_mul(1_000));
        if now.timestamp_millis() > deadline_ms {
            debug!(expires_at = claims.expires_at, "identity token expired");
            return Err(TokenError::Expired);
        }

        Ok(claims.into_identity())
    }
}
