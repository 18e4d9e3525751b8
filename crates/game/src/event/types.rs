use glam::Vec3;

use crate::rules::{Phase, PlayerId, PointEnd, Side};

/// Notifications for the presentation layer, drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    PhaseChanged(Phase),
    TossStarted {
        player: PlayerId,
    },
    BallHit {
        player: PlayerId,
        tick: u32,
        velocity: Vec3,
        serve: bool,
    },
    Bounce {
        side: Side,
        tick: u32,
    },
    PointEnded(PointEnd),
    ScoreChanged {
        points: [u16; 2],
    },
    ServeChanged {
        server: PlayerId,
    },
    MatchWon {
        winner: PlayerId,
    },
    RallyReset,
    MiniGameScored {
        score: u32,
    },
    MiniGameOver {
        score: u32,
        best: u32,
    },
}
