//! # Proven Action Binding
//!
//! Ties a proven action's bytes to the leaf its inclusion proof covers.
//! The Merkle part is the light client's job; this checks the links around
//! it.

use shared_crypto::sha256;
use shared_types::Name;

use crate::domain::{ProvenAction, RelayError};

/// Check that `proven.action` is what the proof's leaf commits to.
///
/// `sha256(action)` must equal the receipt's action digest, the receipt must
/// hash to the proven leaf, and the action must have run on `peer_channel`.
pub fn check_action_binding(proven: &ProvenAction, peer_channel: &Name) -> Result<(), RelayError> {
    if &proven.receipt.receiver != peer_channel {
        return Err(RelayError::UnexpectedReceiver {
            expected: peer_channel.clone(),
            got: proven.receipt.receiver.clone(),
        });
    }
    if sha256(&proven.action) != proven.receipt.act_digest {
        return Err(RelayError::ActionDigestMismatch);
    }
    if proven.receipt.digest() != proven.proof.action_digest {
        return Err(RelayError::ReceiptDigestMismatch);
    }
    Ok(())
}
