//! Outgoing ball velocity from a paddle hit.
//!
//! Both entry points pick a landing target on the table, pick an apex high
//! enough to clear the net (harder hits arc higher), back-solve the vertical
//! takeoff speed from the apex and derive the horizontal components from the
//! resulting flight time.

mod ballistics;
mod spin;

use glam::Vec3;

use crate::config::{TableConfig, TrajectoryConfig};
use crate::rules::Side;

pub use ballistics::{predict_landing, rebound_landing};
pub use spin::spin_from_lateral_speed;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotInput {
    pub ball: Vec3,
    pub paddle_position: Vec3,
    pub paddle_velocity: Vec3,
    pub hitter_side: Side,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    /// Ball position at the moment of the hit.
    pub origin: Vec3,
    pub velocity: Vec3,
    /// Intended landing point on the table surface.
    pub target: Vec3,
    pub flight_time: f32,
    /// Spin about the vertical axis; zero for serves and flat shots.
    pub spin: f32,
}

impl Shot {
    pub fn spin_vector(&self) -> Vec3 {
        Vec3::new(0.0, self.spin, 0.0)
    }

    /// Where the ball lands after its first bounce, ignoring spin.
    pub fn rebound_landing(&self, contact_height: f32, gravity: f32, restitution: f32) -> Option<Vec3> {
        rebound_landing(self.origin, self.velocity, contact_height, gravity, restitution)
    }
}

/// Computes outgoing shots. Injected into the rules so tests and alternate
/// modes can substitute their own.
pub trait ShotPlanner {
    fn serve(&self, input: &ShotInput) -> Shot;
    fn rally(&self, input: &ShotInput) -> Shot;
}

#[derive(Debug, Clone)]
pub struct TrajectorySynthesizer {
    config: TrajectoryConfig,
    table: TableConfig,
}

impl TrajectorySynthesizer {
    pub fn new(config: TrajectoryConfig, table: TableConfig) -> Self {
        Self { config, table }
    }

    pub fn config(&self) -> &TrajectoryConfig {
        &self.config
    }

    /// Depth speed towards the opponent, mapped to `0..=1`.
    fn depth_drive(&self, input: &ShotInput) -> f32 {
        let forward = input.hitter_side.opposite().sign();
        let speed = finite_or_zero(input.paddle_velocity.z) * forward;
        speed.clamp(0.0, self.config.max_paddle_speed) / self.config.max_paddle_speed.max(f32::EPSILON)
    }

    fn paddle_speed(&self, input: &ShotInput) -> f32 {
        let speed = sanitize(input.paddle_velocity).length();
        speed.min(self.config.max_paddle_speed)
    }

    fn lateral_target(&self, x: f32) -> f32 {
        let limit = (self.table.half_width - self.config.safety_margin).max(0.0);
        x.clamp(-limit, limit)
    }

    fn depth_limit(&self) -> f32 {
        (self.table.half_length - self.config.safety_margin).max(0.0)
    }

    fn rally_target_z(&self, input: &ShotInput) -> f32 {
        let forward = input.hitter_side.opposite().sign();
        let far = self.depth_limit();
        let near = self.config.net_margin.min(far);
        let depth = near + (far - near) * self.depth_drive(input);
        forward * depth
    }

    fn serve_target_z(&self, input: &ShotInput) -> f32 {
        let own = input.hitter_side.sign();
        let (near, far) = self.config.serve_zone;
        // The far edge, as seen by the server, is the one closest to the net.
        let fraction = far - (far - near) * self.depth_drive(input);
        let depth = (fraction * self.table.half_length).min(self.depth_limit());
        own * depth
    }

    /// Builds the shot that reaches `apex` and then falls onto `target`.
    fn solve(&self, ball: Vec3, target: Vec3, apex: f32, spin: f32) -> Shot {
        let gravity = self.config.gravity.max(f32::EPSILON);
        let contact = self.table.contact_height();
        let apex = apex.max(contact + self.config.ball_apex_margin);

        let rise = (apex - ball.y).max(0.0);
        let vertical = (2.0 * gravity * rise).sqrt();
        let time_up = vertical / gravity;
        let fall = (apex - contact).max(0.0);
        let time_down = (2.0 * fall / gravity).sqrt();

        let travel = Vec3::new(target.x - ball.x, 0.0, target.z - ball.z);
        let min_time = travel.length() / self.config.max_horizontal_speed.max(f32::EPSILON);
        let flight_time = (time_up + time_down).max(min_time).max(f32::EPSILON);

        Shot {
            origin: ball,
            velocity: Vec3::new(travel.x / flight_time, vertical, travel.z / flight_time),
            target,
            flight_time,
            spin,
        }
    }
}

impl ShotPlanner for TrajectorySynthesizer {
    fn serve(&self, input: &ShotInput) -> Shot {
        let ball = sanitize(input.ball);
        let paddle = sanitize(input.paddle_position);

        let target = Vec3::new(
            self.lateral_target(paddle.x),
            self.table.contact_height(),
            self.serve_target_z(input),
        );
        let apex = ball.y
            + self.config.serve_apex_margin
            + self.config.serve_apex_per_speed * self.paddle_speed(input);

        self.solve(ball, target, apex, 0.0)
    }

    fn rally(&self, input: &ShotInput) -> Shot {
        let ball = sanitize(input.ball);
        let paddle = sanitize(input.paddle_position);
        let lateral = finite_or_zero(input.paddle_velocity.x);

        let spin = spin_from_lateral_speed(lateral, &self.config);
        // Spin and steering are exclusive: a spinning shot stays on the
        // paddle's line and lets the curve do the work.
        let aim_x = if spin == 0.0 {
            paddle.x + lateral * self.config.lateral_steer
        } else {
            paddle.x
        };

        let target = Vec3::new(
            self.lateral_target(aim_x),
            self.table.contact_height(),
            self.rally_target_z(input),
        );

        let clearance =
            self.config.base_net_clearance + self.config.clearance_per_speed * self.paddle_speed(input);
        let apex = (self.table.net_top() + clearance).max(ball.y + self.config.ball_apex_margin);

        self.solve(ball, target, apex, spin)
    }
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

fn sanitize(v: Vec3) -> Vec3 {
    Vec3::new(finite_or_zero(v.x), finite_or_zero(v.y), finite_or_zero(v.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthesizer() -> TrajectorySynthesizer {
        TrajectorySynthesizer::new(TrajectoryConfig::default(), TableConfig::default())
    }

    fn input(ball: Vec3, paddle: Vec3, velocity: Vec3, side: Side) -> ShotInput {
        ShotInput {
            ball,
            paddle_position: paddle,
            paddle_velocity: velocity,
            hitter_side: side,
        }
    }

    #[test]
    fn rally_shot_heads_to_opponent_half() {
        let synth = synthesizer();
        let shot = synth.rally(&input(
            Vec3::new(0.2, 2.2, -2.5),
            Vec3::new(0.2, 2.2, -2.6),
            Vec3::new(0.0, 0.0, 5.0),
            Side::Left,
        ));

        assert!(shot.velocity.z > 0.0);
        assert!(shot.target.z >= synth.config.net_margin);
        assert!(shot.velocity.y > 0.0);
        assert_eq!(shot.spin, 0.0);
    }

    #[test]
    fn harder_hits_land_deeper_and_arc_higher() {
        let synth = synthesizer();
        let ball = Vec3::new(0.0, 2.2, 2.5);
        let soft = synth.rally(&input(ball, ball, Vec3::new(0.0, 0.0, -1.0), Side::Right));
        let hard = synth.rally(&input(ball, ball, Vec3::new(0.0, 0.0, -9.0), Side::Right));

        assert!(hard.target.z < soft.target.z);
        assert!(hard.velocity.y > soft.velocity.y);
    }

    #[test]
    fn rally_arc_clears_the_net() {
        let synth = synthesizer();
        let table = TableConfig::default();
        let ball = Vec3::new(0.0, 2.1, -2.6);
        let shot = synth.rally(&input(ball, ball, Vec3::new(0.0, 0.0, 3.0), Side::Left));

        // Height when the ball crosses z = 0.
        let t = -ball.z / shot.velocity.z;
        let height = ball.y + shot.velocity.y * t - 0.5 * synth.config.gravity * t * t;
        assert!(height > table.net_top());
    }

    #[test]
    fn spin_suppresses_lateral_steering() {
        let synth = synthesizer();
        let ball = Vec3::new(0.3, 2.2, -2.5);

        let steered = synth.rally(&input(ball, ball, Vec3::new(0.8, 0.0, 4.0), Side::Left));
        assert_eq!(steered.spin, 0.0);
        assert!(steered.target.x > ball.x);

        let spun = synth.rally(&input(ball, ball, Vec3::new(6.0, 0.0, 4.0), Side::Left));
        assert!(spun.spin > 0.0);
        assert!((spun.target.x - ball.x).abs() < 1e-5);
    }

    #[test]
    fn near_net_contact_has_bounded_speed() {
        let synth = synthesizer();
        let ball = Vec3::new(0.0, 2.3, -0.05);
        let shot = synth.rally(&input(ball, ball, Vec3::new(0.0, 0.0, 10.0), Side::Left));
        let horizontal = Vec3::new(shot.velocity.x, 0.0, shot.velocity.z).length();

        assert!(shot.flight_time.is_finite() && shot.flight_time > 0.0);
        assert!(horizontal <= synth.config.max_horizontal_speed + 1e-3);
    }

    #[test]
    fn serve_targets_own_half() {
        let synth = synthesizer();
        let ball = Vec3::new(0.0, 2.3, 2.0);
        let shot = synth.serve(&input(ball, Vec3::new(0.0, 2.3, 2.8), Vec3::new(0.0, 0.0, -4.0), Side::Right));

        assert!(shot.target.z > 0.0);
        assert!(shot.velocity.z < 0.0);
        assert_eq!(shot.spin, 0.0);
    }

    #[test]
    fn serve_bounces_twice_over_the_net() {
        let synth = synthesizer();
        let table = TableConfig::default();
        let shot = synth.serve(&input(
            Vec3::new(0.0, 2.3, -2.0),
            Vec3::new(0.0, 2.3, -2.8),
            Vec3::new(0.0, 0.0, 6.0),
            Side::Left,
        ));

        assert!((shot.target.z - -0.63).abs() < 0.02);
        assert!((shot.velocity.y - 1.657).abs() < 0.01);
        assert!((shot.flight_time - 0.4545).abs() < 0.01);

        let second = shot
            .rebound_landing(table.contact_height(), synth.config.gravity, 1.0)
            .unwrap();
        assert!(second.z > synth.config.net_margin);
        assert!(second.z < table.half_length);
    }

    #[test]
    fn non_finite_input_yields_finite_shot() {
        let synth = synthesizer();
        let shot = synth.rally(&input(
            Vec3::new(f32::NAN, 2.2, -2.0),
            Vec3::new(0.0, f32::INFINITY, -2.0),
            Vec3::new(f32::NAN, 0.0, f32::NEG_INFINITY),
            Side::Left,
        ));
        assert!(shot.velocity.is_finite());
        assert!(shot.flight_time.is_finite());
    }
}
