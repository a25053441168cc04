//! # Schedule & Finality Tracking
//!
//! Derives a block's state from its parent's: producer slot check, schedule
//! promotion, confirmation counting and both irreversibility counters.
//!
//! ## Irreversibility
//!
//! Each new block enters the confirmation window needing ⌊2n/3⌋ + 1
//! confirmations. A producer confirms its own block plus the `confirmed`
//! blocks before it; the newest entry reaching zero becomes the branch's
//! proposed irreversible block. A producer's *implied* irreversible block is
//! the proposal it built on, and the consensus LIB is the height at or below
//! which ⌊2n/3⌋ + 1 active producers' implied values sit.

use std::collections::BTreeMap;

use shared_types::Name;

use crate::domain::{
    invariant_schedule_successor, required_confirmations, BlockHeaderState, LightClientError,
    PendingSchedule, ProducerSchedule, SignedBlockHeader, MAX_TRACKED_CONFIRMATIONS,
};

/// Derive the state of `header` on top of `prev`.
///
/// Signature checking is left to the caller: the digest depends on the
/// derived state, which this function produces.
pub fn next_state(
    prev: &BlockHeaderState,
    header: SignedBlockHeader,
) -> Result<BlockHeaderState, LightClientError> {
    let h = &header.header;
    if h.previous != prev.id {
        return Err(LightClientError::InvalidHeader(
            "header does not link to the given parent".into(),
        ));
    }
    if h.timestamp <= prev.header.header.timestamp {
        return Err(LightClientError::InvalidHeader(
            "timestamp must increase along a branch".into(),
        ));
    }
    let block_num = prev
        .block_num
        .checked_add(1)
        .ok_or_else(|| LightClientError::InvalidHeader("block number overflow".into()))?;

    // Promote the pending schedule once its proposing block is irreversible.
    let prev_lib = prev.last_irreversible_blocknum();
    let mut active = prev.active_schedule.clone();
    let mut pending = prev.pending_schedule.clone();
    let mut last_produced = prev.producer_to_last_produced.clone();
    let mut implied_irb = prev.producer_to_last_implied_irb.clone();
    if let Some(promoted) = pending.take_if(|p| prev_lib >= p.lib_num) {
        active = promoted.schedule;
        last_produced = rebuild_for_schedule(&active, &prev.producer_to_last_produced, prev_lib);
        implied_irb = rebuild_for_schedule(&active, &prev.producer_to_last_implied_irb, prev_lib);
    }

    let scheduled = active
        .scheduled_producer(h.timestamp)
        .ok_or_else(|| LightClientError::InvalidSchedule("active schedule is empty".into()))?;
    if scheduled.producer_name != h.producer {
        return Err(LightClientError::WrongProducer {
            expected: scheduled.producer_name.clone(),
            got: h.producer.clone(),
        });
    }
    if h.schedule_version != active.version {
        return Err(LightClientError::ScheduleVersionMismatch {
            active: active.version,
            header: h.schedule_version,
        });
    }
    let block_signing_key = scheduled.block_signing_key;

    if let Some(&last) = last_produced.get(&h.producer) {
        if last >= block_num.saturating_sub(u32::from(h.confirmed)) {
            return Err(LightClientError::InvalidHeader(format!(
                "{} double-confirming known range",
                h.producer
            )));
        }
    }
    implied_irb.insert(h.producer.clone(), prev.proposed_irreversible_blocknum);
    last_produced.insert(h.producer.clone(), block_num);

    let required = required_confirmations(active.producers.len());
    let mut confirm_count = prev.confirm_count.clone();
    confirm_count.push(u8::try_from(required).unwrap_or(u8::MAX));
    if confirm_count.len() > MAX_TRACKED_CONFIRMATIONS {
        let overflow = confirm_count.len() - MAX_TRACKED_CONFIRMATIONS;
        confirm_count.drain(..overflow);
    }
    let proposed = apply_confirmations(
        &mut confirm_count,
        block_num,
        h.confirmed,
        prev.proposed_irreversible_blocknum,
    );

    let computed = if active.producers.len() == 1 {
        block_num
    } else {
        calc_consensus_irreversible(&active, &implied_irb)
    };
    let consensus_irreversible = prev.consensus_irreversible_blocknum.max(computed.min(block_num));

    if let Some(proposal) = &h.new_producers {
        if let Some(existing) = &pending {
            return Err(LightClientError::PendingScheduleExists(existing.schedule.version));
        }
        invariant_schedule_successor(&active, proposal)?;
        pending = Some(PendingSchedule {
            lib_num: block_num,
            hash: proposal.digest(),
            schedule: proposal.clone(),
        });
    }

    let mut blockroot_merkle = prev.blockroot_merkle.clone();
    blockroot_merkle.append(prev.id);

    Ok(BlockHeaderState {
        id: header.id(),
        block_num,
        header,
        proposed_irreversible_blocknum: proposed,
        consensus_irreversible_blocknum: consensus_irreversible,
        fallback_irreversible_blocknum: prev.fallback_irreversible_blocknum,
        pending_schedule: pending,
        active_schedule: active,
        blockroot_merkle,
        producer_to_last_produced: last_produced,
        producer_to_last_implied_irb: implied_irb,
        block_signing_key,
        confirm_count,
    })
}

/// Highest block that ⌊2n/3⌋ + 1 active producers imply irreversible.
///
/// Producers that have not produced on this branch count as 0.
pub fn calc_consensus_irreversible(
    active: &ProducerSchedule,
    implied_irb: &BTreeMap<Name, u32>,
) -> u32 {
    let mut implied: Vec<u32> = active
        .producers
        .iter()
        .map(|p| implied_irb.get(&p.producer_name).copied().unwrap_or(0))
        .collect();
    if implied.is_empty() {
        return 0;
    }
    implied.sort_unstable_by(|a, b| b.cmp(a));
    let threshold = required_confirmations(implied.len());
    implied.get(threshold - 1).copied().unwrap_or(0)
}

/// Spend `confirmed + 1` confirmations on the newest window entries.
///
/// Returns the new proposed irreversible block; entries up to and including
/// the one that completed are dropped from the window.
pub fn apply_confirmations(
    confirm_count: &mut Vec<u8>,
    block_num: u32,
    confirmed: u16,
    proposed: u32,
) -> u32 {
    let len = confirm_count.len();
    let mut remaining = u32::from(confirmed) + 1;
    for i in (0..len).rev() {
        if remaining == 0 {
            break;
        }
        confirm_count[i] = confirm_count[i].saturating_sub(1);
        if confirm_count[i] == 0 {
            let completed = block_num - (len - 1 - i) as u32;
            confirm_count.drain(..=i);
            return completed;
        }
        remaining -= 1;
    }
    proposed
}

/// Per-producer map keyed by `schedule`, carrying known values over and
/// starting newcomers at `default`.
pub(crate) fn rebuild_for_schedule(
    schedule: &ProducerSchedule,
    previous: &BTreeMap<Name, u32>,
    default: u32,
) -> BTreeMap<Name, u32> {
    schedule
        .producers
        .iter()
        .map(|p| {
            let value = previous.get(&p.producer_name).copied().unwrap_or(default);
            (p.producer_name.clone(), value)
        })
        .collect()
}
