use glam::{Quat, Vec3};

use crate::config::{PaddleBounds, PaddleConfig, TableConfig};
use crate::rules::Side;

/// Kinematic paddle state. The body chases a target that input, the AI or
/// the remote interpolator sets once per tick.
#[derive(Debug, Clone)]
pub struct PaddleBody {
    side: Side,
    bounds: PaddleBounds,
    height: f32,
    config: PaddleConfig,
    position: Vec3,
    velocity: Vec3,
    roll: f32,
    target: Vec3,
}

impl PaddleBody {
    pub fn new(side: Side, table: &TableConfig, config: PaddleConfig) -> Self {
        let home = table.paddle_home(side);
        Self {
            side,
            bounds: table.paddle_bounds(side),
            height: table.paddle_height,
            config,
            position: home,
            velocity: Vec3::ZERO,
            roll: 0.0,
            target: home,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn bounds(&self) -> PaddleBounds {
        self.bounds
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Roll about the depth axis, in radians.
    pub fn roll(&self) -> f32 {
        self.roll
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_z(self.roll)
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Sets the pursued point, clamped to this side's bounds. The height is
    /// fixed; non-finite targets are ignored.
    pub fn set_target(&mut self, target: Vec3) {
        if !target.is_finite() {
            return;
        }
        let mut clamped = self.bounds.clamp(target);
        clamped.y = self.height;
        self.target = clamped;
    }

    /// Moves towards the target for one step and returns the new position.
    pub fn advance(&mut self, dt: f32) -> Vec3 {
        if !(dt > 0.0) {
            return self.position;
        }
        let follow = 1.0 - (-self.config.follow_rate * dt).exp();
        let next = self.position.lerp(self.target, follow.clamp(0.0, 1.0));

        self.velocity = (next - self.position) / dt;
        self.position = next;
        self.roll = self.tilt_for(self.velocity.x);
        self.position
    }

    fn tilt_for(&self, lateral_speed: f32) -> f32 {
        // Leaning into the swing.
        (-lateral_speed * self.config.tilt_per_speed).clamp(-self.config.max_tilt, self.config.max_tilt)
    }

    /// Places the paddle at an externally known pose, e.g. from the remote
    /// peer's broadcast.
    pub fn set_pose(&mut self, position: Vec3, roll: f32, velocity: Vec3) {
        if !position.is_finite() || !velocity.is_finite() || !roll.is_finite() {
            return;
        }
        self.position = self.bounds.clamp(position);
        self.target = self.position;
        self.velocity = velocity;
        self.roll = roll;
    }

    /// Used by tests and scripted scenarios to hit with a chosen velocity.
    pub fn set_velocity(&mut self, velocity: Vec3) {
        if velocity.is_finite() {
            self.velocity = velocity;
        }
    }

    pub fn reset(&mut self, table: &TableConfig) {
        let home = table.paddle_home(self.side);
        self.position = home;
        self.target = home;
        self.velocity = Vec3::ZERO;
        self.roll = 0.0;
    }
}

/// Intersects a pointer ray with the horizontal plane at `height`.
pub fn project_pointer(origin: Vec3, direction: Vec3, height: f32) -> Option<Vec3> {
    if !origin.is_finite() || !direction.is_finite() || direction.y.abs() < 1e-6 {
        return None;
    }
    let t = (height - origin.y) / direction.y;
    if t < 0.0 {
        return None;
    }
    Some(origin + direction * t)
}
