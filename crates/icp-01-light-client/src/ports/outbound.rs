//! # Outbound Ports
//!
//! Dependencies the fork store needs from its host.

use shared_types::{Hash, PublicKey, Signature};

/// Producer signature check - outbound port.
///
/// Production: `Ed25519HeaderVerifier` (adapters)
/// Testing: `MockSignatureVerifier` (below)
pub trait HeaderSignatureVerifier: Send + Sync {
    /// Does `signature` by `key` cover `digest`?
    fn verify(&self, key: &PublicKey, digest: &Hash, signature: &Signature) -> bool;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock verifier returning a fixed answer.
#[derive(Clone, Copy, Debug)]
pub struct MockSignatureVerifier {
    /// Answer for every call.
    pub accept: bool,
}

impl Default for MockSignatureVerifier {
    fn default() -> Self {
        Self { accept: true }
    }
}

impl HeaderSignatureVerifier for MockSignatureVerifier {
    fn verify(&self, _key: &PublicKey, _digest: &Hash, _signature: &Signature) -> bool {
        self.accept
    }
}
