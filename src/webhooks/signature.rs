//! GitHub webhook signature verification using HMAC-SHA256.
//!
//! GitHub signs webhook payloads using HMAC-SHA256 with a shared secret.
//! The signature is provided in the `X-Hub-Signature-256` header as `sha256=<hex>`.
//!
//! Verification is the first step in webhook processing; deliveries with an
//! invalid signature are rejected before the payload is parsed.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Why a delivery's signature was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The header is not `sha256=<hex>`.
    #[error("malformed signature header")]
    Malformed,

    /// The header is well formed but does not match the payload.
    #[error("signature does not match payload")]
    Mismatch,
}

/// The shared secret configured on the GitHub App's webhook.
#[derive(Clone)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    /// Verifies an `X-Hub-Signature-256` header value against the payload.
    ///
    /// The comparison is constant-time (delegated to the HMAC library).
    ///
    /// # Examples
    ///
    /// ```
    /// use merge_readiness::webhooks::{SignatureError, WebhookSecret};
    ///
    /// let secret = WebhookSecret::new("my-secret-key");
    /// let header = secret.sign(b"Hello, World!");
    ///
    /// assert_eq!(secret.verify(b"Hello, World!", &header), Ok(()));
    /// assert_eq!(
    ///     WebhookSecret::new("other").verify(b"Hello, World!", &header),
    ///     Err(SignatureError::Mismatch)
    /// );
    /// ```
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), SignatureError> {
        let expected = parse_signature_header(signature_header).ok_or(SignatureError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(&self.0).map_err(|_| SignatureError::Mismatch)?;
        mac.update(payload);
        mac.verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }

    /// Produces the header value GitHub would send for this payload.
    pub fn sign(&self, payload: &[u8]) -> String {
        format_signature_header(&compute_signature(payload, &self.0))
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(<redacted>)")
    }
}

/// Parses a GitHub signature header (e.g., "sha256=abc123...") into raw bytes.
///
/// Returns `None` for malformed headers (missing prefix, invalid hex, empty
/// digest). Never panics.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.trim().strip_prefix("sha256=")?;
    if hex_sig.is_empty() {
        return None;
    }
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA256 signature of a payload using the given secret.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature as a GitHub-style header value ("sha256=<hex>").
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}
