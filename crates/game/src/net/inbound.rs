use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};

use super::protocol::{NetworkMessage, Packet, sequence_greater_than};
use super::stats::NetworkStats;
use crate::rules::PlayerId;

#[derive(Debug, Clone, PartialEq)]
pub struct Received {
    pub sender: PlayerId,
    pub sequence: u32,
    pub message: NetworkMessage,
}

/// Cloneable handle transports use to deliver raw packets from any thread.
#[derive(Debug, Clone)]
pub struct InboundSender {
    tx: Sender<Vec<u8>>,
}

impl InboundSender {
    /// Returns false once the queue has been dropped.
    pub fn deliver(&self, bytes: Vec<u8>) -> bool {
        self.tx.send(bytes).is_ok()
    }
}

/// Messages waiting for the next tick. Drained at the start of a fixed step
/// so the simulation only ever sees inbound traffic from one place.
pub struct InboundQueue {
    rx: Receiver<Vec<u8>>,
    tx: Sender<Vec<u8>>,
    last_paddle_sequence: HashMap<PlayerId, u32>,
    stats: NetworkStats,
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InboundQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            rx,
            tx,
            last_paddle_sequence: HashMap::new(),
            stats: NetworkStats::default(),
        }
    }

    pub fn sender(&self) -> InboundSender {
        InboundSender {
            tx: self.tx.clone(),
        }
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    /// Decodes everything delivered so far. Undecodable, malformed and
    /// out-of-order paddle packets are logged and dropped.
    pub fn drain(&mut self) -> Vec<Received> {
        let mut received = Vec::new();
        while let Ok(bytes) = self.rx.try_recv() {
            self.stats.packets_received += 1;
            self.stats.bytes_received += bytes.len() as u64;

            let packet = match Packet::deserialize(&bytes) {
                Ok(packet) => packet,
                Err(err) => {
                    log::warn!("dropping undecodable packet ({} bytes): {err}", bytes.len());
                    self.stats.packets_rejected += 1;
                    continue;
                }
            };

            if !packet.message.is_well_formed() {
                log::warn!(
                    "dropping malformed {} from player {}",
                    packet.message.kind(),
                    packet.header.sender
                );
                self.stats.packets_rejected += 1;
                continue;
            }

            if matches!(packet.message, NetworkMessage::PaddleState { .. })
                && !self.accept_paddle_sequence(packet.header.sender, packet.header.sequence)
            {
                log::trace!(
                    "dropping out-of-order paddle state {} from player {}",
                    packet.header.sequence,
                    packet.header.sender
                );
                continue;
            }

            received.push(Received {
                sender: packet.header.sender,
                sequence: packet.header.sequence,
                message: packet.message,
            });
        }
        received
    }

    fn accept_paddle_sequence(&mut self, sender: PlayerId, sequence: u32) -> bool {
        match self.last_paddle_sequence.get(&sender) {
            Some(&last) if !sequence_greater_than(sequence, last) => false,
            _ => {
                self.last_paddle_sequence.insert(sender, sequence);
                true
            }
        }
    }

    pub fn clear(&mut self) {
        while self.rx.try_recv().is_ok() {}
        self.last_paddle_sequence.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::PacketHeader;

    fn paddle(sequence: u32, x: f32) -> Vec<u8> {
        let message = NetworkMessage::PaddleState {
            position: [x, 2.3, 2.8],
            rotation: 0.0,
            velocity: [0.0; 3],
        };
        Packet::new(PacketHeader::new(sequence, 2), message)
            .serialize()
            .unwrap()
    }

    #[test]
    fn drains_in_delivery_order() {
        let mut queue = InboundQueue::new();
        let sender = queue.sender();
        assert!(sender.deliver(paddle(1, 0.1)));
        assert!(sender.deliver(paddle(2, 0.2)));

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].sequence, 1);
        assert_eq!(drained[1].sender, 2);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn drops_garbage_and_stale_paddle_states() {
        let mut queue = InboundQueue::new();
        let sender = queue.sender();
        sender.deliver(vec![1, 2, 3, 4, 5]);
        sender.deliver(paddle(5, 0.5));
        sender.deliver(paddle(4, 0.4));

        let drained = queue.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].sequence, 5);
        assert_eq!(queue.stats().packets_rejected, 1);
        assert_eq!(queue.stats().packets_received, 3);
    }

    #[test]
    fn delivery_from_another_thread() {
        let mut queue = InboundQueue::new();
        let sender = queue.sender();
        std::thread::spawn(move || {
            sender.deliver(paddle(1, 0.0));
        })
        .join()
        .unwrap();

        assert_eq!(queue.drain().len(), 1);
    }
}
