//! # Ed25519 Header Verifier
//!
//! Checks producer signatures with `shared-crypto`.

use shared_crypto::{Ed25519PublicKey, Ed25519Signature};
use shared_types::{Hash, PublicKey, Signature};

use crate::ports::HeaderSignatureVerifier;

/// Verifies producer signatures as Ed25519 over the 32-byte digest.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519HeaderVerifier;

impl HeaderSignatureVerifier for Ed25519HeaderVerifier {
    fn verify(&self, key: &PublicKey, digest: &Hash, signature: &Signature) -> bool {
        let Ok(public) = Ed25519PublicKey::from_bytes(*key) else {
            tracing::debug!("[icp-01] signing key is not a valid curve point");
            return false;
        };
        public
            .verify_digest(digest, &Ed25519Signature::from_bytes(*signature))
            .is_ok()
    }
}
