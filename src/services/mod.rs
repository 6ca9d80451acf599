pub mod identity_token;
pub mod service_assertion;
pub mod webhook_signature;

pub use identity_token::IdentityTokenCodec;
pub use service_assertion::ServiceAssertionIssuer;
pub use webhook_signature::WebhookSignatureVerifier;
