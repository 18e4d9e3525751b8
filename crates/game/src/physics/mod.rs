mod ball;
mod body;
mod world;

pub use ball::{BallSimulation, BallState, curve_velocity, decay_spin};
pub use body::{BodyId, BodyPose, RigidBodyAdapter};
pub use world::{Material, PhysicsWorld};
