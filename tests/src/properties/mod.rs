//! # Protocol Properties
//!
//! proptest properties over randomly shaped chains and channel traffic:
//!
//! - irreversibility never moves backwards
//! - outbound packet sequences have no gaps
//! - each receipt resolves its packet at most once
//! - single-bit changes to an inclusion proof are rejected

#[cfg(test)]
mod tests {
    use icp_01_light_client::test_utils::ChainSimulator;
    use icp_01_light_client::{
        Ed25519HeaderVerifier, ForkStore, InclusionProof, LightClientApi, LightClientConfig,
    };
    use icp_02_token_relay::{IcpReceipt, PacketChannel, ReceiptStatus, RelayError};
    use proptest::prelude::*;
    use shared_types::{Hash, Name};

    const PRODUCERS: [&str; 3] = ["alpha", "beta", "gamma"];

    fn owner() -> Name {
        Name::new("icp").unwrap()
    }

    fn seeded(chain: &ChainSimulator) -> ForkStore<Ed25519HeaderVerifier> {
        let config = LightClientConfig::default();
        let mut store = ForkStore::new(owner(), Ed25519HeaderVerifier, config);
        store.init_seed(&owner(), chain.genesis().clone()).unwrap();
        store
    }

    fn hashes_mut(proof: &mut InclusionProof) -> Vec<&mut Hash> {
        let mut hashes =
            vec![&mut proof.action_digest, &mut proof.block_id, &mut proof.anchor_root];
        hashes.extend(proof.action_path.iter_mut());
        hashes.extend(proof.block_path.iter_mut());
        hashes
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn lib_never_decreases(
            producers in 1usize..=3,
            rounds in prop::collection::vec((1usize..=8, 0u32..=3), 1..8),
        ) {
            let mut chain = ChainSimulator::new(&PRODUCERS[..producers]);
            let mut store = seeded(&chain);
            let mut lib = store.last_irreversible_blocknum();

            for (blocks, skipped) in rounds {
                chain.skip_slots(skipped);
                for header in chain.produce_blocks(blocks) {
                    store.add_header(header).unwrap();
                    let next = store.last_irreversible_blocknum();
                    prop_assert!(next >= lib, "LIB went from {} to {}", lib, next);
                    prop_assert!(next <= store.head().unwrap().block_num);
                    lib = next;
                }
            }
        }

        #[test]
        fn sent_sequences_have_no_gaps(
            batches in prop::collection::vec(1usize..6, 1..6),
        ) {
            let mut channel = PacketChannel::new(owner());
            let mut expected = 1;
            for batch in batches {
                for _ in 0..batch {
                    let seq = channel.send(vec![1], 100, vec![2]);
                    prop_assert_eq!(seq, expected);
                    expected += 1;
                }
                // Pruning resolved rows never frees a sequence number.
                let all: Vec<u64> = (1..expected).collect();
                channel.cleanup(&all);
                prop_assert_eq!(channel.next_packet_seq(), expected);
            }
        }

        #[test]
        fn receipts_resolve_at_most_once(
            packets in 1u64..8,
            deliveries in prop::collection::vec((1u64..10, any::<bool>()), 1..40),
        ) {
            let mut channel = PacketChannel::new(owner());
            for _ in 0..packets {
                channel.send(vec![1], 100, vec![2]);
            }

            let mut resolved = std::collections::BTreeMap::new();
            for (seq, (pseq, success)) in deliveries.into_iter().enumerate() {
                let status = if success { ReceiptStatus::Success } else { ReceiptStatus::Expired };
                let receipt = IcpReceipt {
                    seq: seq as u64 + 1,
                    pseq,
                    status,
                    data: vec![],
                    shadow: false,
                };
                let outcome = channel
                    .on_receipt(&receipt, |packet| Ok::<_, RelayError>(packet.seq))
                    .unwrap();
                if let Some(resolved_seq) = outcome {
                    prop_assert_eq!(resolved_seq, pseq);
                    let first = resolved.insert(pseq, status).is_none();
                    prop_assert!(first, "packet {} resolved twice", pseq);
                }
            }

            for seq in 1..=packets {
                let packet = channel.packet(seq).unwrap();
                let expected = resolved.get(&seq).copied().unwrap_or(ReceiptStatus::Unknown);
                prop_assert_eq!(packet.status, expected);
            }
            prop_assert!(resolved.keys().all(|pseq| *pseq <= packets));
        }

        #[test]
        fn perturbed_proofs_are_rejected(
            actions in 1usize..6,
            pick in any::<prop::sample::Index>(),
            which in any::<prop::sample::Index>(),
            bit in 0u8..8,
            byte in 0usize..32,
        ) {
            let mut chain = ChainSimulator::new(&["alpha"]);
            let mut store = seeded(&chain);
            let receiver = Name::new("icp").unwrap();
            let receipts: Vec<_> = (0..actions)
                .map(|i| chain.push_action(&receiver, &[i as u8; 8]))
                .collect();
            chain.produce_block();
            chain.produce_blocks(2);
            for num in 2..=chain.head().block_num {
                store.add_header(chain.header(num).unwrap().clone()).unwrap();
            }

            let anchor = store.last_irreversible_blocknum();
            let receipt = pick.get(&receipts);
            let proof = chain.prove_action(receipt, anchor).unwrap();
            prop_assert!(store.verify_inclusion(&proof).is_ok());

            let mut forged = proof.clone();
            {
                let mut hashes = hashes_mut(&mut forged);
                let target = which.index(hashes.len());
                hashes[target][byte] ^= 1 << bit;
            }
            prop_assert!(store.verify_inclusion(&forged).is_err());
        }
    }
}
