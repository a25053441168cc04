//! # Ed25519 Signatures
//!
//! Producer keys sign 32-byte header digests.
//!
//! ## Security Properties
//!
//! - No RNG dependency (deterministic nonce from message)
//! - Signing key bytes are wiped when a key pair is dropped

use crate::hashing::Hash;
use crate::CryptoError;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use zeroize::Zeroize;

/// Ed25519 public key (32 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ed25519PublicKey([u8; 32]);

impl Ed25519PublicKey {
    /// Create from bytes, rejecting non-points.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        VerifyingKey::from_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Verify a signature over an arbitrary message.
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> Result<(), CryptoError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }

    /// Verify a signature over a digest.
    pub fn verify_digest(
        &self,
        digest: &Hash,
        signature: &Ed25519Signature,
    ) -> Result<(), CryptoError> {
        self.verify(digest, signature)
    }
}

/// Ed25519 signature (64 bytes).
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ed25519Signature(#[serde_as(as = "Bytes")] [u8; 64]);

impl Ed25519Signature {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

/// Ed25519 keypair.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
}

impl Ed25519KeyPair {
    /// Create from secret seed (32 bytes).
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Get public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a digest (deterministic).
    pub fn sign_digest(&self, digest: &Hash) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(digest).to_bytes())
    }
}

impl Drop for Ed25519KeyPair {
    fn drop(&mut self) {
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sha256;

    #[test]
    fn test_sign_verify_digest() {
        let keypair = Ed25519KeyPair::from_seed([7u8; 32]);
        let digest = sha256(b"header");

        let signature = keypair.sign_digest(&digest);
        assert!(keypair.public_key().verify_digest(&digest, &signature).is_ok());
    }

    #[test]
    fn test_wrong_digest_fails() {
        let keypair = Ed25519KeyPair::from_seed([7u8; 32]);
        let signature = keypair.sign_digest(&sha256(b"one"));
        assert_eq!(
            keypair.public_key().verify_digest(&sha256(b"two"), &signature),
            Err(CryptoError::SignatureVerificationFailed)
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let signer = Ed25519KeyPair::from_seed([1u8; 32]);
        let other = Ed25519KeyPair::from_seed([2u8; 32]);
        let digest = sha256(b"test");

        let signature = signer.sign_digest(&digest);
        assert!(other.public_key().verify_digest(&digest, &signature).is_err());
    }

    #[test]
    fn test_deterministic_signatures() {
        let keypair = Ed25519KeyPair::from_seed([0xAB; 32]);
        let digest = sha256(b"deterministic");
        assert_eq!(keypair.sign_digest(&digest), keypair.sign_digest(&digest));
    }

    #[test]
    fn test_public_key_roundtrips_through_bytes() {
        let public = Ed25519KeyPair::from_seed([3u8; 32]).public_key();
        assert_eq!(Ed25519PublicKey::from_bytes(*public.as_bytes()), Ok(public));
    }
}
