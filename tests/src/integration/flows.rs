//! End-to-end token flows: every event crosses as a proven action checked
//! against the receiving side's fork store.

use icp_01_light_client::LightClientApi;
use icp_02_token_relay::{LockResolution, ReceiptStatus, RelayError, TokenRelayApi};

use super::harness::*;

const ALICE_START: i64 = 1_000_000;

fn single(results: Vec<Result<Delivery, RelayError>>) -> Delivery {
    assert_eq!(results.len(), 1, "expected one delivery, got {results:?}");
    results.into_iter().next().unwrap().unwrap()
}

fn receipt_status(delivery: Delivery) -> ReceiptStatus {
    match delivery {
        Delivery::Packet(Some(receipt)) => receipt.status,
        other => panic!("expected a fresh receipt, got {other:?}"),
    }
}

/// A sends 100 to bob and both sides settle.
fn settled_transfer(t: &mut TwoChains) {
    t.send_from_a(100, "bob", 1_000);
    assert_eq!(receipt_status(single(t.relay(Side::A, 10))), ReceiptStatus::Success);
    assert_eq!(
        single(t.relay(Side::B, 10)),
        Delivery::Receipt(Some(LockResolution::Settled))
    );
}

#[test]
fn test_transfer_settles_across_chains() {
    let mut t = TwoChains::new();
    let seq = t.send_from_a(100, "bob", 1_000);
    assert_eq!(seq, 1);
    assert_eq!(t.native(Side::A, "alice"), ALICE_START - 100);
    assert_eq!(t.native(Side::A, "icp.token"), 100);
    assert!(t.a.service.relay().locked().get(seq).is_some());

    let delivery = single(t.relay(Side::A, 10));
    match &delivery {
        Delivery::Packet(Some(receipt)) => {
            assert_eq!(receipt.pseq, seq);
            assert_eq!(receipt.status, ReceiptStatus::Success);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(t.wrapped(Side::B, "bob"), 100);
    assert_eq!(t.b.service.channel().last_incoming_packet_seq(), 1);
    assert!(t.b.service.channel().inbound_packet(seq).unwrap().shadow);

    assert_eq!(
        single(t.relay(Side::B, 10)),
        Delivery::Receipt(Some(LockResolution::Settled))
    );
    assert!(t.a.service.relay().locked().is_empty());
    assert_eq!(t.a.service.channel().packet(seq).unwrap().status, ReceiptStatus::Success);
    // The relay keeps the settled asset backing bob's wrapped balance.
    assert_eq!(t.native(Side::A, "icp.token"), 100);
}

#[test]
fn test_expired_transfer_is_released() {
    let mut t = TwoChains::new();
    let seq = t.send_from_a(100, "bob", 5);

    assert_eq!(receipt_status(single(t.relay(Side::A, 10))), ReceiptStatus::Expired);
    assert_eq!(t.wrapped(Side::B, "bob"), 0);

    assert_eq!(
        single(t.relay(Side::B, 10)),
        Delivery::Receipt(Some(LockResolution::Released))
    );
    assert_eq!(t.native(Side::A, "alice"), ALICE_START);
    assert_eq!(t.native(Side::A, "icp.token"), 0);
    assert_eq!(t.a.service.channel().packet(seq).unwrap().status, ReceiptStatus::Expired);
}

#[test]
fn test_expiration_is_inclusive() {
    let mut t = TwoChains::new();
    t.send_from_a(100, "bob", 10);
    assert_eq!(receipt_status(single(t.relay(Side::A, 10))), ReceiptStatus::Success);
}

#[test]
fn test_refund_releases_native_tokens() {
    let mut t = TwoChains::new();
    settled_transfer(&mut t);

    let seq = t
        .b
        .service
        .refund(&name("bob"), &token(), &name("bob"), &name("alice"), &eos(40), "", 1_000)
        .unwrap();
    assert_eq!(seq, 1);
    assert_eq!(t.wrapped(Side::B, "bob"), 60);
    assert!(t.b.service.relay().locked().get(seq).unwrap().refund);

    assert_eq!(receipt_status(single(t.relay(Side::B, 10))), ReceiptStatus::Success);
    assert_eq!(t.native(Side::A, "alice"), ALICE_START - 60);
    assert_eq!(t.native(Side::A, "icp.token"), 60);

    assert_eq!(
        single(t.relay(Side::A, 10)),
        Delivery::Receipt(Some(LockResolution::Settled))
    );
    assert!(t.b.service.relay().locked().is_empty());
}

#[test]
fn test_expired_refund_is_reminted() {
    let mut t = TwoChains::new();
    settled_transfer(&mut t);

    t.b.service
        .refund(&name("bob"), &token(), &name("bob"), &name("alice"), &eos(40), "", 5)
        .unwrap();
    assert_eq!(t.wrapped(Side::B, "bob"), 60);

    assert_eq!(receipt_status(single(t.relay(Side::B, 10))), ReceiptStatus::Expired);
    assert_eq!(t.native(Side::A, "alice"), ALICE_START - 100);

    assert_eq!(
        single(t.relay(Side::A, 10)),
        Delivery::Receipt(Some(LockResolution::ReMinted))
    );
    assert_eq!(t.wrapped(Side::B, "bob"), 100);
}

#[test]
fn test_refund_more_than_held_fails_cleanly() {
    let mut t = TwoChains::new();
    settled_transfer(&mut t);

    let err = t
        .b
        .service
        .refund(&name("bob"), &token(), &name("bob"), &name("alice"), &eos(101), "", 1_000)
        .unwrap_err();
    assert!(matches!(err, RelayError::Ledger(_)), "{err:?}");
    assert_eq!(t.wrapped(Side::B, "bob"), 100);
    assert_eq!(t.b.service.channel().next_packet_seq(), 1);
    assert!(t.b.service.relay().locked().is_empty());
}

#[test]
fn test_staged_deposits_are_relayed() {
    let mut t = TwoChains::new();
    let alice = name("alice");
    for amount in [50, 30] {
        let sent = t
            .a
            .service
            .transfer(&alice, &token(), &alice, &relay_account(), &eos(amount), "stash")
            .unwrap();
        assert_eq!(sent, None);
    }
    let staged = t.a.service.relay().deposits().get(&token(), &alice, &eos_symbol()).unwrap();
    assert_eq!(staged.balance, eos(80));
    assert_eq!(t.a.service.channel().outbox_len(), 0);

    let err = t
        .a
        .service
        .relay_deposit(&alice, &token(), &alice, &name("bob"), &eos(81), "", 1_000)
        .unwrap_err();
    assert!(matches!(err, RelayError::OverdrawnDeposit { .. }), "{err:?}");

    t.a.service
        .relay_deposit(&alice, &token(), &alice, &name("bob"), &eos(50), "", 1_000)
        .unwrap();
    let staged = t.a.service.relay().deposits().get(&token(), &alice, &eos_symbol()).unwrap();
    assert_eq!(staged.balance, eos(30));

    assert_eq!(receipt_status(single(t.relay(Side::A, 10))), ReceiptStatus::Success);
    assert_eq!(t.wrapped(Side::B, "bob"), 50);
}

#[test]
fn test_duplicate_packet_is_applied_once() {
    let mut t = TwoChains::new();
    t.send_from_a(100, "bob", 1_000);
    let proven = t.publish(Side::A);

    assert!(matches!(t.deliver(Side::B, &proven[0], 10), Ok(Delivery::Packet(Some(_)))));
    assert_eq!(t.deliver(Side::B, &proven[0], 10).unwrap(), Delivery::Packet(None));
    assert_eq!(t.wrapped(Side::B, "bob"), 100);
    assert_eq!(t.b.service.channel().outbox_len(), 1);
}

#[test]
fn test_duplicate_receipt_is_applied_once() {
    let mut t = TwoChains::new();
    t.send_from_a(100, "bob", 5);
    t.relay(Side::A, 10);
    let proven = t.publish(Side::B);

    assert_eq!(
        t.deliver(Side::A, &proven[0], 10).unwrap(),
        Delivery::Receipt(Some(LockResolution::Released))
    );
    assert_eq!(t.deliver(Side::A, &proven[0], 10).unwrap(), Delivery::Receipt(None));
    assert_eq!(t.native(Side::A, "alice"), ALICE_START);
}

#[test]
fn test_packets_are_strictly_ordered() {
    let mut t = TwoChains::new();
    t.send_from_a(100, "bob", 1_000);
    t.send_from_a(200, "bob", 1_000);
    let proven = t.publish(Side::A);
    assert_eq!(proven.len(), 2);

    let err = t.deliver(Side::B, &proven[1], 10).unwrap_err();
    assert!(matches!(err, RelayError::OutOfOrderPacket { .. }), "{err:?}");
    assert_eq!(t.wrapped(Side::B, "bob"), 0);

    for p in &proven {
        assert!(matches!(t.deliver(Side::B, p, 10), Ok(Delivery::Packet(Some(_)))));
    }
    assert_eq!(t.wrapped(Side::B, "bob"), 300);
}

#[test]
fn test_receipts_resolve_in_any_order() {
    let mut t = TwoChains::new();
    t.send_from_a(100, "bob", 1_000);
    t.send_from_a(200, "bob", 5);
    t.relay(Side::A, 10);
    let proven = t.publish(Side::B);
    assert_eq!(proven.len(), 2);

    assert_eq!(
        t.deliver(Side::A, &proven[1], 10).unwrap(),
        Delivery::Receipt(Some(LockResolution::Released))
    );
    assert_eq!(
        t.deliver(Side::A, &proven[0], 10).unwrap(),
        Delivery::Receipt(Some(LockResolution::Settled))
    );
    assert_eq!(t.native(Side::A, "alice"), ALICE_START - 100);
    assert!(t.a.service.relay().locked().is_empty());
}

#[test]
fn test_cleanup_after_resolution() {
    let mut t = TwoChains::new();
    settled_transfer(&mut t);

    assert_eq!(t.a.service.cleanup(&[1]), 1);
    assert!(t.a.service.channel().packet(1).is_none());
    // B drops both its receipt and the inbound mirror.
    assert_eq!(t.b.service.cleanup(&[1]), 2);
    assert!(t.b.service.channel().inbound_packet(1).is_none());
    assert!(t.b.service.channel().receipt(1).is_none());
}

#[test]
fn test_tampered_events_are_rejected() {
    let mut t = TwoChains::new();
    t.send_from_a(100, "bob", 1_000);
    let proven = t.publish(Side::A);

    let mut forged = proven[0].clone();
    forged.proof.anchor_root[0] ^= 1;
    assert!(t.deliver(Side::B, &forged, 10).is_err());

    let mut forged = proven[0].clone();
    let last = forged.action.len() - 1;
    forged.action[last] ^= 1;
    assert!(t.deliver(Side::B, &forged, 10).is_err());

    // A's own packet means nothing to A, whose store follows B.
    assert!(t.deliver(Side::A, &proven[0], 10).is_err());

    assert_eq!(t.wrapped(Side::B, "bob"), 0);
    assert_eq!(t.b.service.channel().last_incoming_packet_seq(), 0);
    assert!(matches!(t.deliver(Side::B, &proven[0], 10), Ok(Delivery::Packet(Some(_)))));
}

#[test]
fn test_multi_producer_chains() {
    let mut t = TwoChains::with_producers(&["alpha", "beta", "gamma"], &["delta", "epsilon"]);
    settled_transfer(&mut t);
    assert_eq!(t.wrapped(Side::B, "bob"), 100);

    let store = t.b.peer_store.read();
    let head = store.head().unwrap();
    assert!(head.last_irreversible_blocknum() < head.block_num);
    assert!(store.most_recent_irreversible().is_ok());
}
