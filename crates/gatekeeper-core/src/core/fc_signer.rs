// crates/gatekeeper-core/src/core/fc_signer.rs
// ============================================================================
// Module: Gatekeeper FC Signer
// Description: HMAC-SHA256 sign/verify over canonical JSON.
// Purpose: Bind advisory receipts to a symmetric key shared with verifiers.
// Dependencies: crate::core::hashing, hmac, sha2
// ============================================================================

//! ## Overview
//! The FC ("FederationClient-compatible") signer produces and checks
//! HMAC-SHA256 signatures over canonical JSON bytes. Verification is
//! constant-time; a missing key fails construction rather than producing an
//! unsigned artifact.

// ============================================================================
// SECTION: Imports
// ============================================================================

use hmac::Hmac;
use hmac::Mac;
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::canonicalize;
use crate::core::hashing::hash_bytes;

type HmacSha256 = Hmac<Sha256>;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised constructing or using an [`FcSigner`].
#[derive(Debug, Error)]
pub enum FcSignerError {
    /// The configured symmetric key was empty.
    #[error("fc signer key must not be empty")]
    EmptyKey,
    /// Canonicalization of the value to sign failed.
    #[error(transparent)]
    Canonicalization(#[from] HashError),
}

// ============================================================================
// SECTION: FC Signer
// ============================================================================

/// HMAC-SHA256 signer keyed by a configured symmetric key.
pub struct FcSigner {
    /// Identifier for the configured key, embedded in receipts for rotation.
    key_id: String,
    /// Raw HMAC key bytes.
    key_bytes: Vec<u8>,
}

impl FcSigner {
    /// Creates a new signer from a key id and raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FcSignerError::EmptyKey`] when `key_bytes` is empty.
    pub fn new(key_id: impl Into<String>, key_bytes: impl Into<Vec<u8>>) -> Result<Self, FcSignerError> {
        let key_bytes = key_bytes.into();
        if key_bytes.is_empty() {
            return Err(FcSignerError::EmptyKey);
        }
        Ok(Self {
            key_id: key_id.into(),
            key_bytes,
        })
    }

    /// Returns the configured key identifier.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Computes the SHA-256 hex digest of UTF-8 text.
    #[must_use]
    pub fn sha256_text(text: &str) -> HashDigest {
        hash_bytes(HashAlgorithm::Sha256, text.as_bytes())
    }

    /// Computes the SHA-256 hex digest of raw bytes.
    #[must_use]
    pub fn sha256_bytes(bytes: &[u8]) -> HashDigest {
        hash_bytes(HashAlgorithm::Sha256, bytes)
    }

    /// Renders `value` as canonical JSON using the §4.1 rules.
    ///
    /// # Errors
    ///
    /// Returns [`FcSignerError::Canonicalization`] when serialization fails.
    pub fn to_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, FcSignerError> {
        Ok(canonicalize(value)?)
    }

    /// Signs canonical JSON bytes, returning a lowercase-hex HMAC-SHA256.
    #[must_use]
    pub fn sign(&self, canonical_json: &[u8]) -> String {
        let mut mac = new_mac(&self.key_bytes);
        mac.update(canonical_json);
        hex_encode(&mac.finalize().into_bytes())
    }

    /// Verifies a lowercase-hex HMAC-SHA256 signature in constant time.
    #[must_use]
    pub fn verify(&self, canonical_json: &[u8], signature: &str) -> bool {
        let Ok(expected) = hex_decode(signature) else {
            return false;
        };
        let mut mac = new_mac(&self.key_bytes);
        mac.update(canonical_json);
        mac.verify_slice(&expected).is_ok()
    }
}

/// Builds a fresh HMAC instance from raw key bytes.
///
/// # Panics
///
/// Never panics: `Hmac<Sha256>` accepts keys of any length.
#[allow(
    clippy::unwrap_used,
    reason = "Hmac::new_from_slice is infallible for Sha256 (no key-length restriction)."
)]
fn new_mac(key_bytes: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(key_bytes).unwrap()
}

/// Encodes bytes as lowercase hex.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

/// Decodes a lowercase (or mixed-case) hex string into bytes.
fn hex_decode(text: &str) -> Result<Vec<u8>, ()> {
    if text.len() % 2 != 0 {
        return Err(());
    }
    let mut out = Vec::with_capacity(text.len() / 2);
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let hi = hex_nibble(bytes[i])?;
        let lo = hex_nibble(bytes[i + 1])?;
        out.push((hi << 4) | lo);
        i += 2;
    }
    Ok(out)
}

/// Decodes a single hex nibble.
fn hex_nibble(byte: u8) -> Result<u8, ()> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        _ => Err(()),
    }
}
