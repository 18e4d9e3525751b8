use glam::Vec3;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::rules::{PlayerId, PointEndReason, Side};

pub const MAX_PACKET_SIZE: usize = 1200;
pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x5350_494E;

const SEQUENCE_WRAP_THRESHOLD: u32 = u32::MAX / 2;

#[inline]
pub fn sequence_greater_than(s1: u32, s2: u32) -> bool {
    ((s1 > s2) && (s1 - s2 <= SEQUENCE_WRAP_THRESHOLD))
        || ((s1 < s2) && (s2 - s1 > SEQUENCE_WRAP_THRESHOLD))
}

#[inline]
pub fn to_wire(v: Vec3) -> [f32; 3] {
    v.to_array()
}

#[inline]
pub fn from_wire(v: [f32; 3]) -> Vec3 {
    Vec3::from_array(v)
}

fn finite(values: &[[f32; 3]]) -> bool {
    values.iter().flatten().all(|c| c.is_finite())
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum NetworkMessage {
    PaddleState {
        position: [f32; 3],
        /// Roll about the depth axis, in radians.
        rotation: f32,
        velocity: [f32; 3],
    },
    BallHit {
        position: [f32; 3],
        velocity: [f32; 3],
        ang_velocity: [f32; 3],
        spin: [f32; 3],
        tick: u32,
        player_id: PlayerId,
    },
    BallToss {
        position: [f32; 3],
        velocity: [f32; 3],
        player_id: PlayerId,
        tick: u32,
    },
    BallReset {
        position: [f32; 3],
        velocity: [f32; 3],
        /// Host tick the reset happened on.
        tick: u32,
    },
    BallOut {
        last_bounce_side: Option<Side>,
        server_side_has_bounced: bool,
        bounced_since_hit: bool,
        reason: PointEndReason,
    },
    ServeTurn {
        player_id: PlayerId,
    },
    ScoreUpdate {
        scores: [u16; 2],
    },
    /// Periodic authoritative ball state from the host.
    BallSync {
        position: [f32; 3],
        velocity: [f32; 3],
        ang_velocity: [f32; 3],
        spin: [f32; 3],
        tick: u32,
        effects: u8,
    },
}

impl NetworkMessage {
    /// Simulation tick the message speaks for, if it carries one.
    pub fn tick(&self) -> Option<u32> {
        match self {
            Self::BallHit { tick, .. } | Self::BallToss { tick, .. } | Self::BallSync { tick, .. } => {
                Some(*tick)
            }
            _ => None,
        }
    }

    /// Rejects messages carrying non-finite vectors.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::PaddleState {
                position,
                rotation,
                velocity,
            } => rotation.is_finite() && finite(&[*position, *velocity]),
            Self::BallHit {
                position,
                velocity,
                ang_velocity,
                spin,
                ..
            }
            | Self::BallSync {
                position,
                velocity,
                ang_velocity,
                spin,
                ..
            } => finite(&[*position, *velocity, *ang_velocity, *spin]),
            Self::BallToss {
                position, velocity, ..
            }
            | Self::BallReset {
                position, velocity, ..
            } => finite(&[*position, *velocity]),
            Self::BallOut { .. } | Self::ServeTurn { .. } | Self::ScoreUpdate { .. } => true,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::PaddleState { .. } => "PaddleState",
            Self::BallHit { .. } => "BallHit",
            Self::BallToss { .. } => "BallToss",
            Self::BallReset { .. } => "BallReset",
            Self::BallOut { .. } => "BallOut",
            Self::ServeTurn { .. } => "ServeTurn",
            Self::ScoreUpdate { .. } => "ScoreUpdate",
            Self::BallSync { .. } => "BallSync",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
    pub sequence: u32,
    pub sender: PlayerId,
}

impl PacketHeader {
    pub fn new(sequence: u32, sender: PlayerId) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
            sequence,
            sender,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Packet {
    pub header: PacketHeader,
    pub message: NetworkMessage,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("packet of {0} bytes exceeds the size limit")]
    TooLarge(usize),
    #[error("bad header (magic {magic:#x}, version {version})")]
    BadHeader { magic: u32, version: u32 },
}

impl Packet {
    pub fn new(header: PacketHeader, message: NetworkMessage) -> Self {
        Self { header, message }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        let bytes = rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)?;
        if bytes.len() > MAX_PACKET_SIZE {
            return Err(PacketError::TooLarge(bytes.len()));
        }
        Ok(bytes)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() > MAX_PACKET_SIZE {
            return Err(PacketError::TooLarge(data.len()));
        }
        // Archived data must be aligned; copy into an aligned buffer since
        // transports hand out arbitrary byte slices.
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(data.len());
        aligned.extend_from_slice(data);
        let packet = rkyv::from_bytes::<Self, rancor::Error>(&aligned)
            .map_err(PacketError::Deserialize)?;
        if !packet.header.is_valid() {
            return Err(PacketError::BadHeader {
                magic: packet.header.magic,
                version: packet.header.version,
            });
        }
        Ok(packet)
    }
}
