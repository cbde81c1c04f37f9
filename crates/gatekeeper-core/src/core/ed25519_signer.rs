// crates/gatekeeper-core/src/core/ed25519_signer.rs
// ============================================================================
// Module: Gatekeeper Ed25519 Signer
// Description: Asymmetric manifest signing for sealed Proof Packs.
// Purpose: Sign and verify RUN_MANIFEST.json with a rotatable Ed25519 key.
// Dependencies: base64, ed25519-dalek, crate::core::hashing
// ============================================================================

//! ## Overview
//! The Ed25519 signer loads (or, in dev mode, generates) a 32-byte private
//! key and derives a stable `keyId` from the public key fingerprint. Manifest
//! signing always excludes the `manifestSignature` field itself from the
//! canonical form being signed; callers are responsible for constructing the
//! unsigned canonical bytes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use ed25519_dalek::Signature;
use ed25519_dalek::Signer as _;
use ed25519_dalek::SigningKey;
use ed25519_dalek::Verifier as _;
use ed25519_dalek::VerifyingKey;
use rand::rngs::OsRng;
use thiserror::Error;

use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::hash_bytes;

/// Protocol constant: the stable prefix every `keyId` carries.
pub const KEY_ID_PREFIX: &str = "keon.marketops.proofpack.ed25519.v1";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised constructing or using an [`Ed25519Signer`].
#[derive(Debug, Error)]
pub enum Ed25519SignerError {
    /// The private key bytes were not exactly 32 bytes long.
    #[error("ed25519 private key must be exactly 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    /// The public key bytes were malformed.
    #[error("invalid ed25519 public key bytes")]
    InvalidPublicKey,
    /// The signature bytes were malformed (not valid base64 or wrong length).
    #[error("invalid ed25519 signature encoding")]
    InvalidSignature,
    /// Reading or writing the key file failed.
    #[error("ed25519 key file io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Ed25519 Signer
// ============================================================================

/// Ed25519 signer bound to one private key.
pub struct Ed25519Signer {
    signing_key: SigningKey,
    key_id: String,
}

impl Ed25519Signer {
    /// Builds a signer from raw 32-byte private key material.
    ///
    /// # Errors
    ///
    /// Returns [`Ed25519SignerError::InvalidKeyLength`] when `bytes.len() != 32`.
    pub fn from_private_key_bytes(bytes: &[u8]) -> Result<Self, Ed25519SignerError> {
        let array: [u8; 32] =
            bytes.try_into().map_err(|_| Ed25519SignerError::InvalidKeyLength(bytes.len()))?;
        let signing_key = SigningKey::from_bytes(&array);
        let key_id = derive_key_id(signing_key.verifying_key().as_bytes());
        Ok(Self {
            signing_key,
            key_id,
        })
    }

    /// Loads a private key from a file, or — in dev mode — generates and
    /// persists a fresh ephemeral key when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Ed25519SignerError::Io`] on read/write failure and
    /// [`Ed25519SignerError::InvalidKeyLength`] on malformed key files.
    pub fn load_or_generate(
        path: &std::path::Path,
        allow_generate: bool,
    ) -> Result<Self, Ed25519SignerError> {
        match std::fs::read(path) {
            Ok(bytes) => Self::from_private_key_bytes(&bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && allow_generate => {
                let signer = Self::generate();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|err| Ed25519SignerError::Io(err.to_string()))?;
                }
                std::fs::write(path, signer.signing_key.to_bytes())
                    .map_err(|err| Ed25519SignerError::Io(err.to_string()))?;
                Ok(signer)
            }
            Err(err) => Err(Ed25519SignerError::Io(err.to_string())),
        }
    }

    /// Generates a fresh, random signer (dev/test use only).
    #[must_use]
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let key_id = derive_key_id(signing_key.verifying_key().as_bytes());
        Self {
            signing_key,
            key_id,
        }
    }

    /// Returns `"keon.marketops.proofpack.ed25519.v1:" + fingerprint`.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Returns the raw public key bytes.
    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Signs raw bytes, returning a base64-encoded signature.
    #[must_use]
    pub fn sign(&self, data: &[u8]) -> String {
        let signature = self.signing_key.sign(data);
        BASE64_STANDARD.encode(signature.to_bytes())
    }

    /// Signs canonical JSON bytes (an alias for [`Ed25519Signer::sign`] kept
    /// for call-site clarity at manifest-signing call sites).
    #[must_use]
    pub fn sign_canonical(&self, canonical_json: &[u8]) -> String {
        self.sign(canonical_json)
    }

    /// Verifies a base64-encoded Ed25519 signature against raw public key
    /// bytes. Pure function: does not depend on any signer instance.
    ///
    /// # Errors
    ///
    /// Returns [`Ed25519SignerError::InvalidPublicKey`] or
    /// [`Ed25519SignerError::InvalidSignature`] on malformed inputs; returns
    /// `Ok(false)` (never an error) when the signature simply does not
    /// verify.
    pub fn verify(
        public_key_bytes: &[u8],
        data: &[u8],
        signature_b64: &str,
    ) -> Result<bool, Ed25519SignerError> {
        let key_array: [u8; 32] =
            public_key_bytes.try_into().map_err(|_| Ed25519SignerError::InvalidPublicKey)?;
        let verifying_key =
            VerifyingKey::from_bytes(&key_array).map_err(|_| Ed25519SignerError::InvalidPublicKey)?;
        let sig_bytes = BASE64_STANDARD
            .decode(signature_b64)
            .map_err(|_| Ed25519SignerError::InvalidSignature)?;
        let sig_array: [u8; 64] =
            sig_bytes.as_slice().try_into().map_err(|_| Ed25519SignerError::InvalidSignature)?;
        let signature = Signature::from_bytes(&sig_array);
        Ok(verifying_key.verify(data, &signature).is_ok())
    }
}

/// Derives `keyId` as the protocol prefix plus the first 16 hex chars of
/// `sha256(publicKeyBytes)`.
fn derive_key_id(public_key_bytes: &[u8]) -> String {
    let digest = hash_bytes(HashAlgorithm::Sha256, public_key_bytes);
    let fingerprint: String = digest.value.chars().take(16).collect();
    format!("{KEY_ID_PREFIX}:{fingerprint}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trip() {
        let signer = Ed25519Signer::generate();
        let data = b"manifest-bytes";
        let signature = signer.sign(data);
        let ok = Ed25519Signer::verify(&signer.public_key_bytes(), data, &signature).expect("verify");
        assert!(ok);
    }

    #[test]
    fn verify_rejects_tampered_data() {
        let signer = Ed25519Signer::generate();
        let signature = signer.sign(b"manifest-bytes");
        let ok =
            Ed25519Signer::verify(&signer.public_key_bytes(), b"tampered-bytes", &signature).expect("verify");
        assert!(!ok);
    }

    #[test]
    fn key_id_has_protocol_prefix() {
        let signer = Ed25519Signer::generate();
        assert!(signer.key_id().starts_with(KEY_ID_PREFIX));
    }

    #[test]
    fn invalid_key_length_rejected() {
        let err = Ed25519Signer::from_private_key_bytes(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, Ed25519SignerError::InvalidKeyLength(10)));
    }
}
