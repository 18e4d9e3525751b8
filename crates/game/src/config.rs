use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::rules::Side;

pub const DEFAULT_TICK_RATE: u32 = 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    pub simulation: SimulationConfig,
    pub table: TableConfig,
    pub paddle: PaddleConfig,
    pub trajectory: TrajectoryConfig,
    pub rules: RulesConfig,
    pub sync: SyncConfig,
    pub rollback: RollbackConfig,
    pub ai: AiConfig,
    pub minigame: MiniGameConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub tick_rate: u32,
    /// Longest frame delta fed to the accumulator, in seconds.
    pub max_frame_delta: f64,
    pub gravity: f32,
    /// Lateral acceleration per unit of spin per unit of speed.
    pub magnus_coefficient: f32,
    /// Multiplier applied to the ball's spin every tick.
    pub spin_decay: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            max_frame_delta: 0.25,
            gravity: 9.81,
            magnus_coefficient: 0.005,
            spin_decay: 0.98,
        }
    }
}

impl SimulationConfig {
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }
}

/// Table geometry. Depth runs along Z with the net at `z = 0`; the host
/// plays from negative Z.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub half_length: f32,
    pub half_width: f32,
    pub top_y: f32,
    pub thickness: f32,
    pub net_height: f32,
    pub net_thickness: f32,
    pub floor_y: f32,
    pub floor_half_size: f32,

    pub ball_radius: f32,
    pub ball_density: f32,
    pub ball_restitution: f32,
    pub ball_friction: f32,
    pub table_restitution: f32,
    pub table_friction: f32,
    pub floor_restitution: f32,
    pub net_restitution: f32,

    pub paddle_half_extents: Vec3,
    pub paddle_height: f32,
    /// Distance of a paddle's home position behind its baseline.
    pub paddle_home_offset: f32,
    /// How far past the sidelines a paddle may travel.
    pub paddle_lateral_reach: f32,
    /// Closest a paddle may get to the net.
    pub paddle_net_gap: f32,
    /// Furthest a paddle may retreat behind its baseline.
    pub paddle_back_reach: f32,

    pub serve_height: f32,
    pub serve_depth: f32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            half_length: 2.74,
            half_width: 1.525,
            top_y: 2.0,
            thickness: 0.1,
            net_height: 0.25,
            net_thickness: 0.02,
            floor_y: 0.0,
            floor_half_size: 20.0,

            ball_radius: 0.04,
            ball_density: 0.1,
            ball_restitution: 0.9,
            ball_friction: 0.2,
            table_restitution: 0.9,
            table_friction: 0.2,
            floor_restitution: 0.5,
            net_restitution: 0.1,

            paddle_half_extents: Vec3::new(0.35, 0.35, 0.08),
            paddle_height: 2.3,
            paddle_home_offset: 0.06,
            paddle_lateral_reach: 0.8,
            paddle_net_gap: 0.3,
            paddle_back_reach: 1.5,

            serve_height: 2.3,
            serve_depth: 2.0,
        }
    }
}

impl TableConfig {
    pub fn net_top(&self) -> f32 {
        self.top_y + self.net_height
    }

    /// Height of the ball's centre at the moment it touches the table.
    pub fn contact_height(&self) -> f32 {
        self.top_y + self.ball_radius
    }

    pub fn serve_origin(&self, side: Side) -> Vec3 {
        Vec3::new(0.0, self.serve_height, side.sign() * self.serve_depth)
    }

    pub fn paddle_home(&self, side: Side) -> Vec3 {
        Vec3::new(
            0.0,
            self.paddle_height,
            side.sign() * (self.half_length + self.paddle_home_offset),
        )
    }

    pub fn paddle_bounds(&self, side: Side) -> PaddleBounds {
        let reach_x = self.half_width + self.paddle_lateral_reach;
        let near = self.paddle_net_gap;
        let far = self.half_length + self.paddle_back_reach;
        let (min_z, max_z) = match side {
            Side::Left => (-far, -near),
            Side::Right => (near, far),
        };
        PaddleBounds {
            min_x: -reach_x,
            max_x: reach_x,
            min_z,
            max_z,
        }
    }

    pub fn is_over_table(&self, position: Vec3) -> bool {
        position.x.abs() <= self.half_width && position.z.abs() <= self.half_length
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaddleBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl PaddleBounds {
    pub fn clamp(&self, position: Vec3) -> Vec3 {
        Vec3::new(
            position.x.clamp(self.min_x, self.max_x),
            position.y,
            position.z.clamp(self.min_z, self.max_z),
        )
    }

    pub fn contains(&self, position: Vec3) -> bool {
        (self.min_x..=self.max_x).contains(&position.x)
            && (self.min_z..=self.max_z).contains(&position.z)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaddleConfig {
    /// Fraction of the remaining distance to the target covered per second.
    pub follow_rate: f32,
    /// Roll per unit of lateral speed, in radians.
    pub tilt_per_speed: f32,
    pub max_tilt: f32,
}

impl Default for PaddleConfig {
    fn default() -> Self {
        Self {
            follow_rate: 25.0,
            tilt_per_speed: 0.06,
            max_tilt: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryConfig {
    pub gravity: f32,
    /// Distance kept from every table edge when choosing a landing target.
    pub safety_margin: f32,
    /// Minimum distance past the net for rally targets.
    pub net_margin: f32,
    /// Paddle depth speed mapped onto the far edge of the landing zone.
    pub max_paddle_speed: f32,

    pub base_net_clearance: f32,
    pub clearance_per_speed: f32,
    pub ball_apex_margin: f32,

    /// Serve first-bounce band, as fractions of the server's half measured
    /// from the net (near edge, far edge).
    pub serve_zone: (f32, f32),
    pub serve_apex_margin: f32,
    pub serve_apex_per_speed: f32,

    /// Caps horizontal speed by flooring flight time at `distance / speed`.
    pub max_horizontal_speed: f32,
    /// Seconds of paddle lateral velocity added to the X target.
    pub lateral_steer: f32,

    pub spin_threshold_low: f32,
    pub spin_threshold_high: f32,
    pub max_lateral_speed: f32,
    pub max_spin: f32,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            safety_margin: 0.2,
            net_margin: 0.3,
            max_paddle_speed: 10.0,

            base_net_clearance: 0.15,
            clearance_per_speed: 0.04,
            ball_apex_margin: 0.05,

            serve_zone: (0.15, 0.35),
            serve_apex_margin: 0.08,
            serve_apex_per_speed: 0.01,

            max_horizontal_speed: 14.0,
            lateral_steer: 0.15,

            spin_threshold_low: 1.0,
            spin_threshold_high: 4.0,
            max_lateral_speed: 8.0,
            max_spin: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Ticks between a point ending and the host resetting the rally.
    pub reset_delay_ticks: u32,
    pub toss_speed: f32,
    pub points_to_win: u16,
    pub serves_per_turn: u16,
    /// Paddle speed above which a hit is flagged as a smash.
    pub smash_speed: f32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            reset_delay_ticks: 90,
            toss_speed: 2.5,
            points_to_win: 11,
            serves_per_turn: 2,
            smash_speed: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub paddle_send_rate: u32,
    pub ball_send_rate: u32,
    pub buffer_size: usize,
    /// Seconds the remote paddle is rendered behind real time.
    pub interpolation_delay: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            paddle_send_rate: 30,
            ball_send_rate: 30,
            buffer_size: 6,
            interpolation_delay: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackConfig {
    pub history_len: usize,
    /// Largest tick delta that is simply overwritten.
    pub apply_threshold: u32,
    /// Largest tick delta that is rewound and resimulated.
    pub rollback_threshold: u32,
    /// Fraction of the visual gap closed per correction.
    pub visual_blend: f32,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            history_len: 60,
            apply_threshold: 2,
            rollback_threshold: 8,
            visual_blend: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// 0.0 is the weakest opponent, 1.0 the strongest.
    pub difficulty: f32,
    /// Lateral noise standard deviation at difficulty 0.
    pub max_noise: f32,
    pub slow_ball_speed: f32,
    pub fast_ball_speed: f32,
    pub forward_offset: f32,
    pub backward_offset: f32,
    pub serve_delay_ticks: u32,
    pub seed: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            difficulty: 0.5,
            max_noise: 0.4,
            slow_ball_speed: 4.0,
            fast_ball_speed: 8.0,
            forward_offset: 0.4,
            backward_offset: 0.5,
            serve_delay_ticks: 45,
            seed: 0x5eed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiniGameConfig {
    pub min_rebound_speed: f32,
    pub max_distance: f32,
    pub ball_start: Vec3,
    pub paddle_start: Vec3,
    pub paddle_restitution: f32,
}

impl Default for MiniGameConfig {
    fn default() -> Self {
        Self {
            min_rebound_speed: 1.5,
            max_distance: 6.0,
            ball_start: Vec3::new(0.0, 2.5, 0.0),
            paddle_start: Vec3::new(0.0, 1.2, 0.0),
            paddle_restitution: 0.9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paddle_bounds_stay_on_own_side() {
        let table = TableConfig::default();

        let left = table.paddle_bounds(Side::Left);
        assert!(left.max_z < 0.0);
        assert!(left.contains(table.paddle_home(Side::Left)));

        let right = table.paddle_bounds(Side::Right);
        assert!(right.min_z > 0.0);
        assert!(right.contains(table.paddle_home(Side::Right)));

        let clamped = left.clamp(Vec3::new(10.0, 2.3, 3.0));
        assert_eq!(clamped.x, left.max_x);
        assert_eq!(clamped.z, left.max_z);
    }

    #[test]
    fn serve_origin_is_on_server_half() {
        let table = TableConfig::default();
        assert!(table.serve_origin(Side::Left).z < 0.0);
        assert!(table.serve_origin(Side::Right).z > 0.0);
        assert!(table.is_over_table(table.serve_origin(Side::Left)));
    }
}
