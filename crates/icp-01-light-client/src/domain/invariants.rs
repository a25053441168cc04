//! # Domain Invariants
//!
//! Rules every accepted header and state must satisfy.

use shared_types::Hash;

use super::entities::{BlockHeaderState, ProducerSchedule};
use super::errors::LightClientError;
use super::value_objects::{num_from_id, MAX_TRACKED_CONFIRMATIONS};

/// Invariant: a proposed schedule is the direct successor of the active one.
pub fn invariant_schedule_successor(
    active: &ProducerSchedule,
    proposed: &ProducerSchedule,
) -> Result<(), LightClientError> {
    proposed.validate()?;
    if Some(proposed.version) != active.version.checked_add(1) {
        return Err(LightClientError::InvalidSchedule(format!(
            "proposed version {} does not follow active version {}",
            proposed.version, active.version
        )));
    }
    Ok(())
}

/// Invariant: LIB never moves backwards along a branch.
pub fn invariant_lib_monotonic(parent: &BlockHeaderState, child: &BlockHeaderState) -> bool {
    child.last_irreversible_blocknum() >= parent.last_irreversible_blocknum()
}

/// Invariant: ids follow each other by block number, starting at `first_num`.
pub fn invariant_consecutive_ids(ids: &[Hash], first_num: u32) -> bool {
    ids.iter()
        .enumerate()
        .all(|(offset, id)| Some(num_from_id(id)) == first_num.checked_add(offset as u32))
}

/// Invariant: a state's self-description is internally consistent.
///
/// Checked for states submitted from outside (seed and catch-up), where the
/// derived fields were not computed locally.
pub fn invariant_state_well_formed(state: &BlockHeaderState) -> Result<(), LightClientError> {
    let invalid = |reason: &str| Err(LightClientError::InvalidHeader(reason.to_string()));

    if state.id != state.header.id() {
        return invalid("state id does not match header");
    }
    if state.block_num == 0 || state.block_num != num_from_id(&state.id) {
        return invalid("state block number does not match id");
    }
    if !state.blockroot_merkle.is_well_formed()
        || state.blockroot_merkle.leaf_count() != u64::from(state.block_num) - 1
    {
        return invalid("blockroot merkle does not cover exactly the ancestors");
    }
    if state.last_irreversible_blocknum() > state.block_num
        || state.proposed_irreversible_blocknum > state.block_num
    {
        return invalid("irreversible block above the block itself");
    }
    if state.confirm_count.len() > MAX_TRACKED_CONFIRMATIONS {
        return invalid("confirmation window too large");
    }
    state.active_schedule.validate()?;
    if state.header.header.schedule_version != state.active_schedule.version {
        return Err(LightClientError::ScheduleVersionMismatch {
            active: state.active_schedule.version,
            header: state.header.header.schedule_version,
        });
    }
    if state.active_schedule.key_of(&state.header.header.producer)
        != Some(&state.block_signing_key)
    {
        return invalid("signing key is not the producer's scheduled key");
    }
    if let Some(pending) = &state.pending_schedule {
        if pending.hash != pending.schedule.digest() {
            return invalid("pending schedule hash mismatch");
        }
    }
    Ok(())
}
