mod inbound;
mod interpolation;
mod loopback;
mod protocol;
mod stats;
mod sync;
mod transport;

pub use inbound::{InboundQueue, InboundSender, Received};
pub use interpolation::{PaddleSample, RemotePaddleInterpolator};
pub use loopback::{LoopbackEnd, LoopbackTransport};
pub use protocol::{
    ArchivedPacket, MAX_PACKET_SIZE, NetworkMessage, PROTOCOL_MAGIC, PROTOCOL_VERSION, Packet,
    PacketError, PacketHeader, from_wire, sequence_greater_than, to_wire,
};
pub use stats::{LinkConditions, NetworkStats};
pub use sync::{NetworkSync, PeriodicTimer, SyncDue, ball_message, paddle_message};
pub use transport::{OutboundMessages, Transport, TransportError, flush};
