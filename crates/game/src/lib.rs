pub mod ai;
pub mod arena;
pub mod config;
pub mod event;
pub mod minigame;
pub mod net;
pub mod paddle;
pub mod physics;
pub mod rollback;
pub mod rules;
pub mod simulation;
pub mod table_match;
pub mod trajectory;

pub use ai::AiOpponent;
pub use arena::{ArenaContact, ArenaEntity, TableArena};
pub use config::{
    AiConfig, DEFAULT_TICK_RATE, GameConfig, MiniGameConfig, PaddleConfig, RollbackConfig,
    RulesConfig, SimulationConfig, SyncConfig, TableConfig, TrajectoryConfig,
};
pub use event::{EventQueue, MatchEvent};
pub use minigame::MiniGame;
pub use net::{
    InboundQueue, LinkConditions, LoopbackTransport, NetworkMessage, NetworkStats, NetworkSync,
    Packet, PacketError, PacketHeader, Transport, TransportError,
};
pub use paddle::PaddleBody;
pub use physics::{BallSimulation, BallState, BodyId, BodyPose, RigidBodyAdapter};
pub use rollback::{BallHistory, BallHistoryEntry, Classification, ReconcileOutcome, RollbackReconciler};
pub use rules::{
    Phase, PlayerId, PointEnd, PointEndReason, RuleStateMachine, Roster, Scoreboard, Side,
};
pub use simulation::{FixedTimestep, SimulationLoop, SimulationMode};
pub use table_match::TableMatch;
pub use trajectory::{Shot, ShotInput, ShotPlanner, TrajectorySynthesizer};
