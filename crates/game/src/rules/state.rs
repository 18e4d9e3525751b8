use bitflags::bitflags;
use rkyv::{Archive, Deserialize, Serialize};

pub type PlayerId = u32;

/// Half of the table. The host always plays `Left` (negative Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Sign of Z on this half.
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// The half containing depth `z`. The net plane itself counts as `Right`.
    pub fn of_z(z: f32) -> Self {
        if z < 0.0 { Self::Left } else { Self::Right }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WaitingForServe,
    InPlay,
}

/// Why a point ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum PointEndReason {
    /// The ball touched the table before the serve.
    PreServeTableContact,
    /// The serve's first bounce was not on the server's half.
    ServeMissedOwnSide,
    DoubleBounce { side: Side },
    /// The ball bounced back on the side of the player who last hit it.
    BounceOnHitterSide,
    Floor,
    Net,
}

/// Facts captured when a point ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointEnd {
    pub reason: PointEndReason,
    pub server: Side,
    pub last_hitter: Option<Side>,
    pub last_bounce_side: Option<Side>,
    pub server_side_has_bounced: bool,
    /// The ball touched the table after the last hit.
    pub bounced_since_hit: bool,
}

impl PointEnd {
    /// Side that loses the point.
    pub fn loser(&self) -> Side {
        match self.reason {
            PointEndReason::PreServeTableContact | PointEndReason::ServeMissedOwnSide => {
                self.server
            }
            PointEndReason::DoubleBounce { side } => side,
            PointEndReason::BounceOnHitterSide => self.last_hitter.unwrap_or(self.server),
            PointEndReason::Floor | PointEndReason::Net => match self.last_hitter {
                None => self.server,
                // A good shot already bounced on the receiver's half.
                Some(hitter)
                    if self.bounced_since_hit
                        && self.last_bounce_side == Some(hitter.opposite()) =>
                {
                    hitter.opposite()
                }
                Some(hitter) => hitter,
            },
        }
    }

    pub fn winner(&self) -> Side {
        self.loser().opposite()
    }
}

bitflags! {
    /// Visual effects attached to the ball broadcast.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EffectFlags: u8 {
        const SERVE = 1 << 0;
        const SPIN = 1 << 1;
        const SMASH = 1 << 2;
    }
}

#[derive(Debug, Clone)]
pub struct RallyState {
    pub phase: Phase,
    pub server: Side,
    pub is_local_serving: bool,
    pub toss_in_progress: bool,
    pub last_collision_tick: Option<u32>,
    pub last_bounce_side: Option<Side>,
    pub last_hitter: Option<Side>,
    pub server_side_has_bounced: bool,
    pub bounced_since_hit: bool,
    pub point_ended: bool,
    pub effects: EffectFlags,
}

impl RallyState {
    pub fn new(server: Side, is_local_serving: bool) -> Self {
        Self {
            phase: Phase::WaitingForServe,
            server,
            is_local_serving,
            toss_in_progress: false,
            last_collision_tick: None,
            last_bounce_side: None,
            last_hitter: None,
            server_side_has_bounced: false,
            bounced_since_hit: false,
            point_ended: false,
            effects: EffectFlags::empty(),
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.phase == Phase::WaitingForServe
    }

    pub fn point_end(&self, reason: PointEndReason) -> PointEnd {
        PointEnd {
            reason,
            server: self.server,
            last_hitter: self.last_hitter,
            last_bounce_side: self.last_bounce_side,
            server_side_has_bounced: self.server_side_has_bounced,
            bounced_since_hit: self.bounced_since_hit,
        }
    }
}

/// Who plays where, and which paddles this peer drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roster {
    pub host: PlayerId,
    pub guest: PlayerId,
    pub local: PlayerId,
    /// Player driven by the local AI, if any.
    pub ai: Option<PlayerId>,
}

impl Roster {
    pub fn new(host: PlayerId, guest: PlayerId, local: PlayerId) -> Self {
        Self {
            host,
            guest,
            local,
            ai: None,
        }
    }

    pub fn with_ai(mut self, ai: PlayerId) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn is_host(&self) -> bool {
        self.local == self.host
    }

    /// True when this peer judges the paddle of `player`.
    pub fn controls(&self, player: PlayerId) -> bool {
        player == self.local || self.ai == Some(player)
    }

    pub fn side_of(&self, player: PlayerId) -> Option<Side> {
        if player == self.host {
            Some(Side::Left)
        } else if player == self.guest {
            Some(Side::Right)
        } else {
            None
        }
    }

    pub fn player_on(&self, side: Side) -> PlayerId {
        match side {
            Side::Left => self.host,
            Side::Right => self.guest,
        }
    }

    pub fn local_side(&self) -> Side {
        self.side_of(self.local).unwrap_or(Side::Left)
    }

    /// The remote player, or `None` when both paddles are driven here.
    pub fn remote(&self) -> Option<PlayerId> {
        let other = if self.is_host() { self.guest } else { self.host };
        (!self.controls(other)).then_some(other)
    }
}
