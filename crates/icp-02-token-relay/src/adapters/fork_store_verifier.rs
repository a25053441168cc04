//! Inclusion checks against a shared fork store.

use std::sync::Arc;

use icp_01_light_client::{ForkStore, HeaderSignatureVerifier, InclusionProof, LightClientApi};
use parking_lot::RwLock;

use crate::domain::RelayError;
use crate::ports::InclusionVerifier;

/// `InclusionVerifier` reading the light client tracking the peer chain.
///
/// The store stays shared with whatever feeds it headers; each check takes
/// a read lock for its duration.
pub struct ForkStoreVerifier<V: HeaderSignatureVerifier> {
    store: Arc<RwLock<ForkStore<V>>>,
}

impl<V: HeaderSignatureVerifier> ForkStoreVerifier<V> {
    /// Wrap a shared store.
    pub fn new(store: Arc<RwLock<ForkStore<V>>>) -> Self {
        Self { store }
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<RwLock<ForkStore<V>>> {
        &self.store
    }
}

impl<V: HeaderSignatureVerifier> Clone for ForkStoreVerifier<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<V: HeaderSignatureVerifier> InclusionVerifier for ForkStoreVerifier<V> {
    fn verify(&self, proof: &InclusionProof) -> Result<(), RelayError> {
        self.store.read().verify_inclusion(proof)?;
        Ok(())
    }
}
