//! Webhook secret and signature verification
//!
//! The default scheme compares a shared secret supplied out-of-band (usually
//! a request header) against the configured one. Providers that sign the
//! request body opt into [`SignatureScheme::HmacSha256`] explicitly. Both
//! end in the same constant-time comparison.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Compare two secrets in time that depends only on the length of `expected`.
///
/// Returns `false` immediately when the lengths differ. That leaks the
/// length, never the content. Equal-length inputs are compared in full with
/// an OR-accumulator over the byte-wise XOR, with no early exit.
pub fn verify(expected: &str, provided: &str) -> bool {
    verify_bytes(expected.as_bytes(), provided.as_bytes())
}

/// Byte-slice form of [`verify`].
pub fn verify_bytes(expected: &[u8], provided: &[u8]) -> bool {
    if expected.len() != provided.len() {
        return false;
    }

    let diff = expected
        .iter()
        .zip(provided)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));

    std::hint::black_box(diff) == 0
}

/// How an integration authenticates its webhook deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SignatureScheme {
    /// The header carries the shared secret itself.
    #[default]
    SharedSecret,
    /// The header carries a hex HMAC-SHA256 of the raw body, optionally
    /// prefixed (GitHub uses `sha256=`).
    HmacSha256 { prefix: Option<String> },
}

/// Verifies inbound deliveries for one integration.
#[derive(Clone)]
pub struct WebhookVerifier {
    /// Secret shared with the provider
    secret: String,
    scheme: SignatureScheme,
    /// Header the provider puts its secret or signature in
    header: String,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"<redacted>")
            .field("scheme", &self.scheme)
            .field("header", &self.header)
            .finish()
    }
}

impl WebhookVerifier {
    pub fn new(
        secret: impl Into<String>,
        scheme: SignatureScheme,
        header: impl Into<String>,
    ) -> Self {
        Self {
            secret: secret.into(),
            scheme,
            header: header.into(),
        }
    }

    /// Shared-secret verifier reading the given header.
    pub fn shared_secret(secret: impl Into<String>, header: impl Into<String>) -> Self {
        Self::new(secret, SignatureScheme::SharedSecret, header)
    }

    pub fn scheme(&self) -> &SignatureScheme {
        &self.scheme
    }

    /// The request header holding the secret or signature.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Check a delivery.
    ///
    /// # Arguments
    /// * `payload` - The raw request body
    /// * `provided` - The value of the verification header
    pub fn verify_request(&self, payload: &[u8], provided: &str) -> bool {
        match &self.scheme {
            SignatureScheme::SharedSecret => verify(&self.secret, provided),
            SignatureScheme::HmacSha256 { .. } => {
                verify(&self.compute_signature(payload), provided.trim())
            }
        }
    }

    /// The header value a genuine delivery of `payload` would carry.
    ///
    /// This is useful for testing and for signing replayed deliveries.
    pub fn compute_signature(&self, payload: &[u8]) -> String {
        match &self.scheme {
            SignatureScheme::SharedSecret => self.secret.clone(),
            SignatureScheme::HmacSha256 { prefix } => {
                let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
                    .expect("HMAC can take any key size");
                mac.update(payload);
                let digest = hex::encode(mac.finalize().into_bytes());
                match prefix {
                    Some(prefix) => format!("{}{}", prefix, digest),
                    None => digest,
                }
            }
        }
    }
}
