use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{AiConfig, TableConfig};
use crate::physics::BallState;
use crate::rules::Side;

/// Computer opponent. Predicts where the ball crosses its paddle plane and
/// aims there, with noise that shrinks as difficulty rises.
#[derive(Debug)]
pub struct AiOpponent {
    config: AiConfig,
    side: Side,
    plane_z: f32,
    home: Vec3,
    rng: StdRng,
    waiting_ticks: u32,
}

impl AiOpponent {
    pub fn new(config: AiConfig, side: Side, table: &TableConfig) -> Self {
        let home = table.paddle_home(side);
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            side,
            plane_z: home.z,
            home,
            waiting_ticks: 0,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn difficulty(&self) -> f32 {
        self.config.difficulty.clamp(0.0, 1.0)
    }

    fn toward_net(&self) -> f32 {
        -self.side.sign()
    }

    /// Paddle target for this tick. Holds `paddle` when the ball will not
    /// reach the paddle plane.
    pub fn target(&mut self, ball: &BallState, paddle: Vec3) -> Vec3 {
        if ball.frozen || !ball.is_finite() {
            return paddle;
        }

        let vz = ball.velocity.z;
        let time = (self.plane_z - ball.position.z) / vz;
        if !time.is_finite() || time <= 0.0 {
            return paddle;
        }

        let lateral = ball.position.x + ball.velocity.x * time + self.noise();

        let difficulty = self.difficulty();
        let speed = ball.velocity.length();
        let depth_offset = if speed < self.config.slow_ball_speed {
            self.toward_net() * self.config.forward_offset * difficulty
        } else if speed > self.config.fast_ball_speed {
            -self.toward_net() * self.config.backward_offset
        } else {
            0.0
        };

        Vec3::new(lateral, paddle.y, self.plane_z + depth_offset)
    }

    /// Target while serving: drive through the tossed ball towards the net.
    pub fn serve_target(&self, ball: Vec3, paddle: Vec3) -> Vec3 {
        if !ball.is_finite() {
            return paddle;
        }
        Vec3::new(
            ball.x,
            paddle.y,
            ball.z + self.toward_net() * self.config.forward_offset,
        )
    }

    pub fn home(&self) -> Vec3 {
        self.home
    }

    /// Counts ticks spent waiting to serve. Returns true once the serve
    /// delay has elapsed, then starts over.
    pub fn should_toss(&mut self, waiting_to_serve: bool) -> bool {
        if !waiting_to_serve {
            self.waiting_ticks = 0;
            return false;
        }
        self.waiting_ticks += 1;
        if self.waiting_ticks >= self.config.serve_delay_ticks {
            self.waiting_ticks = 0;
            true
        } else {
            false
        }
    }

    fn noise(&mut self) -> f32 {
        let sigma = self.config.max_noise * (1.0 - self.difficulty());
        if sigma <= 0.0 {
            return 0.0;
        }
        // Box-Muller
        let u1: f32 = self.rng.gen_range(f32::EPSILON..1.0);
        let u2: f32 = self.rng.gen_range(0.0..1.0);
        let gaussian = (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos();
        gaussian * sigma
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ai(difficulty: f32) -> AiOpponent {
        let config = AiConfig {
            difficulty,
            ..Default::default()
        };
        AiOpponent::new(config, Side::Right, &TableConfig::default())
    }

    fn incoming(velocity: Vec3) -> BallState {
        BallState {
            position: Vec3::new(0.0, 2.3, 0.0),
            velocity,
            ..Default::default()
        }
    }

    #[test]
    fn perfect_ai_aims_at_crossing_point() {
        let mut ai = ai(1.0);
        let paddle = TableConfig::default().paddle_home(Side::Right);
        let ball = incoming(Vec3::new(1.0, 0.0, 5.6));

        let target = ai.target(&ball, paddle);
        let time = paddle.z / 5.6;
        assert!((target.x - time).abs() < 1e-4);
        assert_eq!(target.z, paddle.z);
    }

    #[test]
    fn ball_moving_away_holds_position() {
        let mut ai = ai(0.5);
        let paddle = Vec3::new(0.3, 2.3, 2.8);
        assert_eq!(ai.target(&incoming(Vec3::new(0.0, 0.0, -4.0)), paddle), paddle);
        assert_eq!(ai.target(&incoming(Vec3::ZERO), paddle), paddle);
    }

    #[test]
    fn depth_adapts_to_ball_speed() {
        let mut ai = ai(1.0);
        let paddle = TableConfig::default().paddle_home(Side::Right);

        let slow = ai.target(&incoming(Vec3::new(0.0, 0.0, 2.0)), paddle);
        assert!(slow.z < paddle.z);

        let fast = ai.target(&incoming(Vec3::new(0.0, 0.0, 12.0)), paddle);
        assert!(fast.z > paddle.z);
    }

    #[test]
    fn weaker_ai_scatters_more() {
        let paddle = TableConfig::default().paddle_home(Side::Right);
        let ball = incoming(Vec3::new(0.0, 0.0, 5.0));
        let spread = |difficulty: f32| {
            let mut ai = ai(difficulty);
            (0..200)
                .map(|_| ai.target(&ball, paddle).x.abs())
                .sum::<f32>()
        };
        assert_eq!(spread(1.0), 0.0);
        assert!(spread(0.0) > spread(0.8));
    }

    #[test]
    fn tosses_after_delay() {
        let mut ai = ai(0.5);
        let delay = AiConfig::default().serve_delay_ticks;
        for _ in 1..delay {
            assert!(!ai.should_toss(true));
        }
        assert!(ai.should_toss(true));
        assert!(!ai.should_toss(false));
    }
}
