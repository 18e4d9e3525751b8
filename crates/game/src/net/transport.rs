use super::protocol::{NetworkMessage, PacketError};
use super::stats::NetworkStats;
use crate::rules::PlayerId;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("peer is disconnected")]
    Disconnected,
    #[error(transparent)]
    Packet(#[from] PacketError),
}

/// The message bus between the two peers. Inbound traffic does not go
/// through this trait; transports push it into an
/// [`InboundQueue`](super::InboundQueue) handle instead.
pub trait Transport {
    fn send(&mut self, message: NetworkMessage) -> Result<(), TransportError>;

    /// Called once per tick after the outbound flush.
    fn pump(&mut self) {}

    fn is_host(&self) -> bool;

    fn local_player(&self) -> PlayerId;

    /// Both players, host first.
    fn players(&self) -> [PlayerId; 2];

    fn stats(&self) -> Option<&NetworkStats> {
        None
    }
}

/// Sink for messages produced during a tick. Flushed to the transport once
/// the tick is done.
pub trait OutboundMessages {
    fn push(&mut self, message: NetworkMessage);
}

impl OutboundMessages for Vec<NetworkMessage> {
    fn push(&mut self, message: NetworkMessage) {
        Vec::push(self, message);
    }
}

/// Sends every queued message, logging failures. Nothing is retried.
pub fn flush<T: Transport + ?Sized>(transport: &mut T, outbound: &mut Vec<NetworkMessage>) {
    for message in outbound.drain(..) {
        let kind = message.kind();
        if let Err(err) = transport.send(message) {
            log::warn!("dropping outbound {kind}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Closed;

    impl Transport for Closed {
        fn send(&mut self, _message: NetworkMessage) -> Result<(), TransportError> {
            Err(TransportError::Disconnected)
        }

        fn is_host(&self) -> bool {
            true
        }

        fn local_player(&self) -> PlayerId {
            1
        }

        fn players(&self) -> [PlayerId; 2] {
            [1, 2]
        }
    }

    #[test]
    fn flush_drains_even_when_sends_fail() {
        let mut outbound = vec![NetworkMessage::ServeTurn { player_id: 1 }];
        flush(&mut Closed, &mut outbound);
        assert!(outbound.is_empty());
    }
}
