use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Complete dynamic state of the ball.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BallState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Decaying per-axis bias that curves the flight.
    pub spin: Vec3,
    pub frozen: bool,
}

impl BallState {
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            position,
            frozen: true,
            ..Default::default()
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.angular_velocity.is_finite()
            && self.spin.is_finite()
    }
}

/// Everything the rules and the reconciler need from the simulated ball.
pub trait BallSimulation {
    fn ball_state(&self) -> BallState;

    /// Overwrites the ball, including its frozen flag.
    fn set_ball_state(&mut self, state: &BallState);

    /// Advances the ball one fixed step with paddles held where they are.
    /// Contacts raised by this step are not reported.
    fn step_ball(&mut self);

    fn freeze_ball(&mut self, position: Vec3) {
        self.set_ball_state(&BallState::at_rest(position));
    }
}

/// Velocity after one step of Magnus-like curve from `spin`.
pub fn curve_velocity(velocity: Vec3, spin: Vec3, coefficient: f32, dt: f32) -> Vec3 {
    velocity + spin.cross(velocity) * coefficient * dt
}

/// Spin after one step of decay. Components that fall below a small
/// threshold are zeroed so the bias eventually vanishes.
pub fn decay_spin(spin: Vec3, decay: f32) -> Vec3 {
    let decayed = spin * decay;
    if decayed.length_squared() < 1e-6 {
        Vec3::ZERO
    } else {
        decayed
    }
}
