use glam::{Quat, Vec3};

use crate::config::{GameConfig, MiniGameConfig, PaddleConfig, TableConfig};
use crate::event::{EventQueue, MatchEvent};
use crate::paddle::project_pointer;
use crate::physics::{BodyId, BodyPose, Material, RigidBodyAdapter};
use crate::simulation::SimulationMode;

const PADDLE_HALF_EXTENTS: Vec3 = Vec3::new(0.3, 0.03, 0.3);

/// Keep-it-up juggling with one flat paddle, one ball and the floor.
pub struct MiniGame {
    config: MiniGameConfig,
    paddle_config: PaddleConfig,
    adapter: RigidBodyAdapter,
    ball: BodyId,
    paddle: BodyId,
    floor: BodyId,
    paddle_position: Vec3,
    paddle_target: Vec3,
    /// Set on paddle contact until the ball is seen moving up again.
    awaiting_rebound: bool,
    score: u32,
    best: u32,
    over: bool,
    alpha: f32,
    events: EventQueue,
}

impl MiniGame {
    pub fn new(config: &GameConfig) -> Self {
        let mini = config.minigame.clone();
        let table: &TableConfig = &config.table;
        let mut adapter =
            RigidBodyAdapter::new(config.simulation.fixed_dt(), config.simulation.gravity);

        let floor = adapter.spawn_static_box(
            Vec3::new(0.0, table.floor_y - 0.1, 0.0),
            Vec3::new(table.floor_half_size, 0.1, table.floor_half_size),
            Material {
                density: 1.0,
                restitution: table.floor_restitution,
                friction: 0.5,
            },
        );
        let paddle = adapter.spawn_kinematic_box(
            mini.paddle_start,
            PADDLE_HALF_EXTENTS,
            Material {
                density: 1.0,
                restitution: mini.paddle_restitution,
                friction: 0.3,
            },
            false,
        );
        let ball = adapter.spawn_dynamic_sphere(
            mini.ball_start,
            table.ball_radius,
            Material {
                density: table.ball_density,
                restitution: table.ball_restitution,
                friction: table.ball_friction,
            },
        );

        Self {
            paddle_position: mini.paddle_start,
            paddle_target: mini.paddle_start,
            config: mini,
            paddle_config: config.paddle.clone(),
            adapter,
            ball,
            paddle,
            floor,
            awaiting_rebound: false,
            score: 0,
            best: 0,
            over: false,
            alpha: 0.0,
            events: EventQueue::new(),
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn ball_position(&self) -> Vec3 {
        self.adapter.translation(self.ball)
    }

    pub fn ball_velocity(&self) -> Vec3 {
        self.adapter.linear_velocity(self.ball)
    }

    pub fn paddle_position(&self) -> Vec3 {
        self.paddle_position
    }

    pub fn ball_pose(&self) -> BodyPose {
        self.adapter.interpolated_pose(self.ball, self.alpha)
    }

    pub fn paddle_pose(&self) -> BodyPose {
        self.adapter.interpolated_pose(self.paddle, self.alpha)
    }

    /// Aims the paddle at a point; only its horizontal part is used.
    pub fn set_pointer(&mut self, target: Vec3) {
        if !target.is_finite() {
            return;
        }
        let mut flat = Vec3::new(target.x, 0.0, target.z);
        let reach = self.config.max_distance.max(0.0);
        if flat.length() > reach {
            flat = flat.normalize_or_zero() * reach;
        }
        self.paddle_target = Vec3::new(flat.x, self.config.paddle_start.y, flat.z);
    }

    pub fn set_pointer_ray(&mut self, origin: Vec3, direction: Vec3) -> bool {
        match project_pointer(origin, direction, self.config.paddle_start.y) {
            Some(point) => {
                self.set_pointer(point);
                true
            }
            None => false,
        }
    }

    /// Puts ball and paddle back at their start. The best score survives.
    pub fn restart(&mut self) {
        let start = self.config.paddle_start;
        self.adapter.teleport(self.paddle, start, Quat::IDENTITY);
        self.paddle_position = start;
        self.paddle_target = start;

        self.adapter
            .teleport(self.ball, self.config.ball_start, Quat::IDENTITY);
        self.adapter.unfreeze(self.ball);
        self.adapter.set_linear_velocity(self.ball, Vec3::ZERO);
        self.adapter.set_angular_velocity(self.ball, Vec3::ZERO);

        self.awaiting_rebound = false;
        self.score = 0;
        self.over = false;
        log::debug!("mini-game restarted (best {})", self.best);
    }

    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        self.events.drain()
    }

    fn move_paddle(&mut self) {
        let dt = self.adapter.dt();
        let follow = 1.0 - (-self.paddle_config.follow_rate * dt).exp();
        self.paddle_position = self
            .paddle_position
            .lerp(self.paddle_target, follow.clamp(0.0, 1.0));
        self.adapter
            .set_kinematic_target(self.paddle, self.paddle_position, Quat::IDENTITY);
    }

    fn game_over(&mut self) {
        self.over = true;
        self.best = self.best.max(self.score);
        self.adapter.freeze(self.ball);
        log::info!("mini-game over: score {} best {}", self.score, self.best);
        self.events.push(MatchEvent::MiniGameOver {
            score: self.score,
            best: self.best,
        });
    }
}

impl SimulationMode for MiniGame {
    fn fixed_update(&mut self, _tick: u32) {
        if self.over {
            return;
        }
        self.move_paddle();

        let pairs = self.adapter.step();
        for (a, b) in pairs {
            let other = if a == self.ball {
                b
            } else if b == self.ball {
                a
            } else {
                continue;
            };

            if other == self.floor {
                self.game_over();
                return;
            }
            if other == self.paddle {
                self.awaiting_rebound = true;
            }
        }

        let velocity = self.adapter.linear_velocity(self.ball);
        if self.awaiting_rebound && velocity.y > 0.0 {
            self.awaiting_rebound = false;
            if velocity.length() >= self.config.min_rebound_speed {
                self.score += 1;
                log::trace!("mini-game hit, score {}", self.score);
                self.events
                    .push(MatchEvent::MiniGameScored { score: self.score });
            }
        }

        if self.ball_position().length() > self.config.max_distance {
            self.game_over();
        }
    }

    fn interpolate(&mut self, alpha: f32) {
        self.alpha = alpha;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_ball_scores_on_the_paddle() {
        let mut game = MiniGame::new(&GameConfig::default());
        let mut scored = false;
        for tick in 1..=60 {
            game.fixed_update(tick);
            scored |= game.score() > 0;
        }
        assert!(scored);
        assert!(!game.is_over());
    }

    #[test]
    fn moving_away_lets_ball_hit_floor() {
        let mut game = MiniGame::new(&GameConfig::default());
        game.set_pointer(Vec3::new(2.0, 0.0, 0.0));
        for tick in 1..=180 {
            game.fixed_update(tick);
        }
        assert!(game.is_over());
        assert_eq!(game.score(), 0);

        let events = game.drain_events();
        assert_eq!(events, vec![MatchEvent::MiniGameOver { score: 0, best: 0 }]);
    }

    #[test]
    fn best_score_survives_restart() {
        let mut game = MiniGame::new(&GameConfig::default());
        let mut tick = 0;
        while game.score() == 0 && tick < 120 {
            tick += 1;
            game.fixed_update(tick);
        }
        let scored = game.score();
        assert!(scored > 0);

        game.set_pointer(Vec3::new(3.0, 0.0, 0.0));
        while !game.is_over() && tick < 600 {
            tick += 1;
            game.fixed_update(tick);
        }
        assert!(game.is_over());
        assert!(game.best() >= scored);

        game.restart();
        assert_eq!(game.score(), 0);
        assert!(!game.is_over());
        assert!(game.best() >= scored);
        assert_eq!(game.ball_position(), MiniGameConfig::default().ball_start);
    }

    #[test]
    fn pointer_is_limited_to_the_play_radius() {
        let mut game = MiniGame::new(&GameConfig::default());
        game.set_pointer(Vec3::new(100.0, 7.0, 0.0));
        for tick in 1..=120 {
            game.fixed_update(tick);
        }
        let reach = MiniGameConfig::default().max_distance;
        assert!(game.paddle_position().x <= reach + 1e-3);
        assert_eq!(game.paddle_position().y, MiniGameConfig::default().paddle_start.y);
    }
}
