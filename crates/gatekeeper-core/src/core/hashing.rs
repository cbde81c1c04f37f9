// crates/gatekeeper-core/src/core/hashing.rs
// ============================================================================
// Module: Gatekeeper Canonical Hashing
// Description: Deterministic canonical JSON bytes and SHA-256 content hashing.
// Purpose: Give every sealed artifact a stable, cross-host, replayable digest.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Canonicalization rules are frozen protocol, not an implementation detail:
//! sorted (ordinal) property names, camelCase keys, no null-valued
//! properties, no insignificant whitespace, `Z`-suffixed UTC timestamps, and
//! enums rendered as camelCase strings. The key ordering, key casing, and
//! null omission are enforced by the `#[serde(...)]` attributes on the data
//! model types in `crate::core`; this module only owns the RFC 8785
//! byte-serialization and the SHA-256 digest on top of it. Any change to
//! these rules invalidates every previously sealed Proof Pack.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported hash algorithms for sealed artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HashAlgorithm {
    /// SHA-256 (the only algorithm this protocol version supports).
    Sha256,
}

/// Default and currently sole supported hash algorithm.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// A lowercase hex-encoded content digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes, or the empty string for empty input.
    pub value: String,
}

impl HashDigest {
    /// Builds a digest from raw hash bytes, applying the empty-input rule.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }

    /// A digest whose value is the frozen empty-hash sentinel.
    #[must_use]
    pub const fn empty(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            value: String::new(),
        }
    }
}

impl std::fmt::Display for HashDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while computing canonical hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed (non-serializable value, e.g. a float).
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Canonicalization
// ============================================================================

/// Returns canonical RFC 8785 JSON bytes for a serializable value.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes raw bytes, honoring the empty-input-to-empty-hash rule.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    if bytes.is_empty() {
        return HashDigest::empty(algorithm);
    }
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            HashDigest::new(algorithm, &hasher.finalize())
        }
    }
}

/// Canonicalizes and hashes a serializable value in one step.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_object<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let bytes = canonicalize(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}

/// Verifies that `bytes` hashes to `expected` under constant-time comparison
/// of the rendered hex strings.
#[must_use]
pub fn verify_hash(bytes: &[u8], expected: &HashDigest) -> bool {
    let actual = hash_bytes(expected.algorithm, bytes);
    subtle::ConstantTimeEq::ct_eq(actual.value.as_bytes(), expected.value.as_bytes()).into()
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        b: u32,
        a: u32,
    }

    #[test]
    fn canonical_bytes_sort_keys() {
        let bytes = canonicalize(&Sample {
            b: 2,
            a: 1,
        })
        .expect("serialize");
        assert_eq!(String::from_utf8(bytes).expect("utf8"), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn empty_bytes_hash_to_empty_string() {
        let digest = hash_bytes(HashAlgorithm::Sha256, b"");
        assert_eq!(digest.value, "");
    }

    #[test]
    fn verify_hash_round_trips() {
        let digest = hash_bytes(HashAlgorithm::Sha256, b"hello");
        assert!(verify_hash(b"hello", &digest));
        assert!(!verify_hash(b"goodbye", &digest));
    }
}
