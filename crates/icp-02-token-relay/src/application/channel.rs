//! # Packet Channel
//!
//! Sequenced packet and receipt log of one relay channel, plus the outbox
//! the relayer drains.
//!
//! Outbound packets are numbered by `send` alone. Inbound packets must
//! arrive in sequence order; receipts are matched by `pseq` in any order.

use std::collections::{BTreeMap, VecDeque};

use shared_types::Name;
use tracing::{debug, info, warn};

use crate::domain::{
    invariant_resolving_status, ChannelEvent, IcpPacket, IcpReceipt, ReceiptStatus, RelayError,
};

/// One channel endpoint.
#[derive(Debug, Clone)]
pub struct PacketChannel {
    /// Channel account on this chain.
    account: Name,
    /// Packets sent to the peer.
    packets: BTreeMap<u64, IcpPacket>,
    /// Mirrors of packets received from the peer.
    inbound: BTreeMap<u64, IcpPacket>,
    /// Receipts issued for inbound packets.
    receipts: BTreeMap<u64, IcpReceipt>,
    next_packet_seq: u64,
    next_receipt_seq: u64,
    last_incoming_packet_seq: u64,
    /// Events not yet handed to the transport.
    outbox: VecDeque<ChannelEvent>,
}

impl PacketChannel {
    /// Create an empty channel; the first packet gets sequence 1.
    pub fn new(account: Name) -> Self {
        Self {
            account,
            packets: BTreeMap::new(),
            inbound: BTreeMap::new(),
            receipts: BTreeMap::new(),
            next_packet_seq: 1,
            next_receipt_seq: 1,
            last_incoming_packet_seq: 0,
            outbox: VecDeque::new(),
        }
    }

    /// Channel account.
    pub fn account(&self) -> &Name {
        &self.account
    }

    /// Sequence the next `send` will use.
    pub fn next_packet_seq(&self) -> u64 {
        self.next_packet_seq
    }

    /// Highest inbound packet sequence applied.
    pub fn last_incoming_packet_seq(&self) -> u64 {
        self.last_incoming_packet_seq
    }

    /// Outbound packet by sequence.
    pub fn packet(&self, seq: u64) -> Option<&IcpPacket> {
        self.packets.get(&seq)
    }

    /// Issued receipt by receipt sequence.
    pub fn receipt(&self, seq: u64) -> Option<&IcpReceipt> {
        self.receipts.get(&seq)
    }

    /// Inbound packet mirror by sequence.
    pub fn inbound_packet(&self, seq: u64) -> Option<&IcpPacket> {
        self.inbound.get(&seq)
    }

    /// Outbound packets still waiting for a receipt.
    pub fn pending_packets(&self) -> impl Iterator<Item = &IcpPacket> {
        self.packets
            .values()
            .filter(|p| p.status == ReceiptStatus::Unknown)
    }

    /// Events waiting for the transport.
    pub fn outbox_len(&self) -> usize {
        self.outbox.len()
    }

    /// Append an outbound packet and queue it for the relayer.
    ///
    /// The only sequence allocator of the channel.
    pub fn send(&mut self, send_action: Vec<u8>, expiration: u32, receipt_action: Vec<u8>) -> u64 {
        let seq = self.next_packet_seq;
        self.next_packet_seq += 1;

        let packet = IcpPacket {
            seq,
            expiration,
            send_action,
            receipt_action,
            status: ReceiptStatus::Unknown,
            shadow: false,
        };
        self.outbox.push_back(ChannelEvent::Packet(packet.clone()));
        self.packets.insert(seq, packet);

        debug!("[icp-02] {} sent packet {} (expires {})", self.account, seq, expiration);
        seq
    }

    /// Apply a packet proven from the peer at peer-observed time `now`.
    ///
    /// `dispatch` runs the packet's send action and returns receipt data.
    /// An expired packet or a failed dispatch yields an `Expired` receipt.
    /// Returns `None` for a packet already applied.
    pub fn on_packet<F>(
        &mut self,
        packet: IcpPacket,
        now: u32,
        dispatch: F,
    ) -> Result<Option<IcpReceipt>, RelayError>
    where
        F: FnOnce(&[u8]) -> Result<Vec<u8>, RelayError>,
    {
        if packet.seq <= self.last_incoming_packet_seq {
            warn!("[icp-02] ignoring duplicate packet {}", packet.seq);
            return Ok(None);
        }
        let expected = self.last_incoming_packet_seq + 1;
        if packet.seq != expected {
            return Err(RelayError::OutOfOrderPacket {
                expected,
                got: packet.seq,
            });
        }

        let (status, data) = if packet.expiration < now {
            debug!("[icp-02] packet {} expired at {} (now {})", packet.seq, packet.expiration, now);
            (ReceiptStatus::Expired, Vec::new())
        } else {
            match dispatch(&packet.send_action) {
                Ok(data) => (ReceiptStatus::Success, data),
                Err(e) => {
                    warn!("[icp-02] packet {} failed to dispatch: {}", packet.seq, e);
                    (ReceiptStatus::Expired, Vec::new())
                }
            }
        };

        let receipt = IcpReceipt {
            seq: self.next_receipt_seq,
            pseq: packet.seq,
            status,
            data,
            shadow: false,
        };
        self.next_receipt_seq += 1;
        self.last_incoming_packet_seq = packet.seq;
        self.inbound.insert(
            packet.seq,
            IcpPacket {
                status,
                shadow: true,
                ..packet
            },
        );
        self.receipts.insert(receipt.seq, receipt.clone());
        self.outbox.push_back(ChannelEvent::Receipt(receipt.clone()));

        info!("[icp-02] packet {} resolved as {:?}", receipt.pseq, status);
        Ok(Some(receipt))
    }

    /// Resolve an outbound packet from a peer receipt.
    ///
    /// `callback` runs the packet's receipt action; the packet's status is
    /// recorded only if it succeeds. Unknown or already resolved packets
    /// are ignored.
    pub fn on_receipt<T, F>(
        &mut self,
        receipt: &IcpReceipt,
        callback: F,
    ) -> Result<Option<T>, RelayError>
    where
        F: FnOnce(&IcpPacket) -> Result<T, RelayError>,
    {
        invariant_resolving_status(receipt.status)?;

        let Some(packet) = self.packets.get(&receipt.pseq) else {
            warn!("[icp-02] receipt {} for unknown packet {}", receipt.seq, receipt.pseq);
            return Ok(None);
        };
        if packet.status != ReceiptStatus::Unknown {
            debug!("[icp-02] packet {} already resolved", receipt.pseq);
            return Ok(None);
        }

        let out = callback(packet)?;
        if let Some(packet) = self.packets.get_mut(&receipt.pseq) {
            packet.status = receipt.status;
        }
        Ok(Some(out))
    }

    /// Prune resolved packets, issued receipts and inbound mirrors.
    ///
    /// Unresolved outbound packets are kept. Returns the rows removed.
    pub fn cleanup(&mut self, seqs: &[u64]) -> usize {
        let mut removed = 0;
        for seq in seqs {
            if self
                .packets
                .get(seq)
                .is_some_and(|p| p.status != ReceiptStatus::Unknown)
            {
                self.packets.remove(seq);
                removed += 1;
            }
            if self.receipts.remove(seq).is_some() {
                removed += 1;
            }
            if self.inbound.remove(seq).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("[icp-02] cleanup removed {} rows", removed);
        }
        removed
    }

    /// Take every queued event.
    pub fn drain_outbox(&mut self) -> Vec<ChannelEvent> {
        self.outbox.drain(..).collect()
    }

    /// Put undelivered events back at the front, keeping their order.
    pub fn requeue(&mut self, events: Vec<ChannelEvent>) {
        for event in events.into_iter().rev() {
            self.outbox.push_front(event);
        }
    }
}
