//! Table-tennis rules: who serves, which bounces are legal, who wins the
//! point and the match.

mod machine;
mod score;
mod state;

pub use machine::{Contact, PaddleKinematics, RuleContext, RuleStateMachine};
pub use score::Scoreboard;
pub use state::{
    EffectFlags, Phase, PlayerId, PointEnd, PointEndReason, RallyState, Roster, Side,
};
