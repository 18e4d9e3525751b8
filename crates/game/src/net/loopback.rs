use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::inbound::{InboundQueue, InboundSender};
use super::protocol::{NetworkMessage, Packet, PacketHeader};
use super::stats::{LinkConditions, NetworkStats};
use super::transport::{Transport, TransportError};
use crate::rules::PlayerId;

#[derive(Debug)]
struct DelayedPacket {
    release_tick: u32,
    order: u64,
    bytes: Vec<u8>,
}

impl PartialEq for DelayedPacket {
    fn eq(&self, other: &Self) -> bool {
        self.release_tick == other.release_tick && self.order == other.order
    }
}

impl Eq for DelayedPacket {}

impl PartialOrd for DelayedPacket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedPacket {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .release_tick
            .cmp(&self.release_tick)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// One direction of an in-memory link. Packets are encoded with the wire
/// codec, held for the simulated latency and then handed to the peer's
/// inbound queue.
pub struct LoopbackTransport {
    local: PlayerId,
    players: [PlayerId; 2],
    peer: InboundSender,
    link: LinkConditions,
    rng: StdRng,
    now: u32,
    next_order: u64,
    sequence: u32,
    in_flight: BinaryHeap<DelayedPacket>,
    stats: NetworkStats,
    connected: bool,
}

/// A transport plus the queue its peer delivers into.
pub type LoopbackEnd = (LoopbackTransport, InboundQueue);

impl LoopbackTransport {
    /// Connects `host` and `guest`. Both directions share the link
    /// conditions but draw from independent generators.
    pub fn pair(host: PlayerId, guest: PlayerId, link: LinkConditions, seed: u64) -> (LoopbackEnd, LoopbackEnd) {
        let host_queue = InboundQueue::new();
        let guest_queue = InboundQueue::new();
        let players = [host, guest];

        let host_end = Self {
            local: host,
            players,
            peer: guest_queue.sender(),
            link: link.clone(),
            rng: StdRng::seed_from_u64(seed),
            now: 0,
            next_order: 0,
            sequence: 0,
            in_flight: BinaryHeap::new(),
            stats: NetworkStats::default(),
            connected: true,
        };
        let guest_end = Self {
            local: guest,
            players,
            peer: host_queue.sender(),
            link,
            rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
            now: 0,
            next_order: 0,
            sequence: 0,
            in_flight: BinaryHeap::new(),
            stats: NetworkStats::default(),
            connected: true,
        };

        ((host_end, host_queue), (guest_end, guest_queue))
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
        self.in_flight.clear();
    }

    fn release_due(&mut self) {
        while let Some(delayed) = self.in_flight.peek() {
            if delayed.release_tick > self.now {
                break;
            }
            let Some(delayed) = self.in_flight.pop() else {
                break;
            };
            if !self.peer.deliver(delayed.bytes) {
                log::debug!("loopback peer of player {} is gone", self.local);
                self.connected = false;
                self.in_flight.clear();
                break;
            }
        }
    }
}

impl Transport for LoopbackTransport {
    fn send(&mut self, message: NetworkMessage) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }

        self.sequence = self.sequence.wrapping_add(1);
        let bytes = Packet::new(PacketHeader::new(self.sequence, self.local), message).serialize()?;

        self.stats.packets_sent += 1;
        self.stats.bytes_sent += bytes.len() as u64;

        if self.link.should_drop(&mut self.rng) {
            self.stats.packets_dropped += 1;
            return Ok(());
        }

        let delay = self.link.delay_ticks(&mut self.rng);
        self.in_flight.push(DelayedPacket {
            release_tick: self.now + delay,
            order: self.next_order,
            bytes,
        });
        self.next_order += 1;

        if delay == 0 {
            self.release_due();
        }
        Ok(())
    }

    fn pump(&mut self) {
        self.now = self.now.wrapping_add(1);
        self.release_due();
    }

    fn is_host(&self) -> bool {
        self.local == self.players[0]
    }

    fn local_player(&self) -> PlayerId {
        self.local
    }

    fn players(&self) -> [PlayerId; 2] {
        self.players
    }

    fn stats(&self) -> Option<&NetworkStats> {
        Some(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve_turn(player_id: PlayerId) -> NetworkMessage {
        NetworkMessage::ServeTurn { player_id }
    }

    #[test]
    fn perfect_link_delivers_immediately() {
        let ((mut host, _host_queue), (_guest, mut guest_queue)) =
            LoopbackTransport::pair(1, 2, LinkConditions::perfect(), 7);

        assert!(host.is_host());
        host.send(serve_turn(1)).unwrap();

        let received = guest_queue.drain();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].sender, 1);
        assert_eq!(received[0].message, serve_turn(1));
    }

    #[test]
    fn latency_holds_packets_for_whole_ticks() {
        let link = LinkConditions {
            latency_ticks: 3,
            ..Default::default()
        };
        let ((_host, mut host_queue), (mut guest, _)) = LoopbackTransport::pair(1, 2, link, 7);

        assert!(!guest.is_host());
        guest.send(serve_turn(2)).unwrap();
        guest.send(serve_turn(1)).unwrap();
        assert_eq!(guest.in_flight(), 2);

        guest.pump();
        guest.pump();
        assert!(host_queue.drain().is_empty());

        guest.pump();
        let received = host_queue.drain();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].message, serve_turn(2));
        assert_eq!(received[1].sequence, 2);
    }

    #[test]
    fn lossy_link_counts_drops() {
        let link = LinkConditions {
            loss_percent: 100.0,
            ..Default::default()
        };
        let ((mut host, _), (_guest, mut guest_queue)) = LoopbackTransport::pair(1, 2, link, 7);
        for _ in 0..10 {
            host.send(serve_turn(1)).unwrap();
        }
        host.pump();

        assert!(guest_queue.drain().is_empty());
        assert_eq!(host.stats().packets_dropped, 10);
        assert_eq!(host.stats().loss_percent(), 100.0);
    }

    #[test]
    fn disconnected_send_fails() {
        let ((mut host, _), _) = LoopbackTransport::pair(1, 2, LinkConditions::perfect(), 7);
        host.disconnect();
        assert!(matches!(
            host.send(serve_turn(1)),
            Err(TransportError::Disconnected)
        ));
    }
}
