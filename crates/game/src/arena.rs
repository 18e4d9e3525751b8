use glam::{Quat, Vec3};

use crate::config::{SimulationConfig, TableConfig};
use crate::physics::{
    BallSimulation, BallState, BodyId, BodyPose, Material, RigidBodyAdapter, curve_velocity,
    decay_spin,
};
use crate::rules::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaEntity {
    Ball,
    Paddle(Side),
    Table,
    Net,
    Floor,
}

/// A ball contact raised by the engine this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaContact {
    Paddle(Side),
    /// `side` is the half the ball was over when it touched.
    Table { side: Side },
    Net,
    Floor,
}

/// Table, net, floor, ball and two sensor paddles in one physics world.
pub struct TableArena {
    adapter: RigidBodyAdapter,
    simulation: SimulationConfig,
    table: TableConfig,
    ball: BodyId,
    paddles: [BodyId; 2],
    table_body: BodyId,
    net: BodyId,
    floor: BodyId,
    spin: Vec3,
    /// Contacts that happened during resimulated steps and were never judged.
    skipped_contacts: u64,
}

impl TableArena {
    pub fn new(simulation: &SimulationConfig, table: &TableConfig) -> Self {
        let mut adapter = RigidBodyAdapter::new(simulation.fixed_dt(), simulation.gravity);

        let table_body = adapter.spawn_static_box(
            Vec3::new(0.0, table.top_y - table.thickness * 0.5, 0.0),
            Vec3::new(table.half_width, table.thickness * 0.5, table.half_length),
            Material {
                density: 1.0,
                restitution: table.table_restitution,
                friction: table.table_friction,
            },
        );
        let net = adapter.spawn_static_box(
            Vec3::new(0.0, table.top_y + table.net_height * 0.5, 0.0),
            Vec3::new(
                table.half_width,
                table.net_height * 0.5,
                table.net_thickness * 0.5,
            ),
            Material {
                density: 1.0,
                restitution: table.net_restitution,
                friction: 0.5,
            },
        );
        let floor = adapter.spawn_static_box(
            Vec3::new(0.0, table.floor_y - 0.1, 0.0),
            Vec3::new(table.floor_half_size, 0.1, table.floor_half_size),
            Material {
                density: 1.0,
                restitution: table.floor_restitution,
                friction: 0.5,
            },
        );

        let ball = adapter.spawn_dynamic_sphere(
            table.serve_origin(Side::Left),
            table.ball_radius,
            Material {
                density: table.ball_density,
                restitution: table.ball_restitution,
                friction: table.ball_friction,
            },
        );
        adapter.freeze(ball);

        let paddle_material = Material {
            density: 1.0,
            restitution: 0.0,
            friction: 0.5,
        };
        let paddles = [Side::Left, Side::Right].map(|side| {
            adapter.spawn_kinematic_box(
                table.paddle_home(side),
                table.paddle_half_extents,
                paddle_material,
                true,
            )
        });

        Self {
            adapter,
            simulation: simulation.clone(),
            table: table.clone(),
            ball,
            paddles,
            table_body,
            net,
            floor,
            spin: Vec3::ZERO,
            skipped_contacts: 0,
        }
    }

    pub fn table(&self) -> &TableConfig {
        &self.table
    }

    pub fn dt(&self) -> f32 {
        self.adapter.dt()
    }

    pub fn body(&self, entity: ArenaEntity) -> BodyId {
        match entity {
            ArenaEntity::Ball => self.ball,
            ArenaEntity::Paddle(side) => self.paddles[side.index()],
            ArenaEntity::Table => self.table_body,
            ArenaEntity::Net => self.net,
            ArenaEntity::Floor => self.floor,
        }
    }

    fn entity_of(&self, id: BodyId) -> Option<ArenaEntity> {
        if id == self.ball {
            Some(ArenaEntity::Ball)
        } else if id == self.paddles[0] {
            Some(ArenaEntity::Paddle(Side::Left))
        } else if id == self.paddles[1] {
            Some(ArenaEntity::Paddle(Side::Right))
        } else if id == self.table_body {
            Some(ArenaEntity::Table)
        } else if id == self.net {
            Some(ArenaEntity::Net)
        } else if id == self.floor {
            Some(ArenaEntity::Floor)
        } else {
            None
        }
    }

    /// Queues a paddle pose for the next step.
    pub fn move_paddle(&mut self, side: Side, position: Vec3, rotation: Quat) {
        self.adapter
            .set_kinematic_target(self.paddles[side.index()], position, rotation);
    }

    pub fn place_paddle(&mut self, side: Side, position: Vec3, rotation: Quat) {
        self.adapter
            .teleport(self.paddles[side.index()], position, rotation);
    }

    pub fn paddle_position(&self, side: Side) -> Vec3 {
        self.adapter.translation(self.paddles[side.index()])
    }

    /// Applies spin curve and decay, then steps the engine.
    fn advance(&mut self) -> Vec<(BodyId, BodyId)> {
        if !self.adapter.is_frozen(self.ball) {
            let velocity = self.adapter.linear_velocity(self.ball);
            let curved = curve_velocity(
                velocity,
                self.spin,
                self.simulation.magnus_coefficient,
                self.adapter.dt(),
            );
            self.adapter.set_linear_velocity(self.ball, curved);
            self.spin = decay_spin(self.spin, self.simulation.spin_decay);
        }
        self.adapter.step()
    }

    pub fn skipped_contacts(&self) -> u64 {
        self.skipped_contacts
    }

    /// One fixed step. Returns the ball contacts that started this step.
    pub fn step(&mut self) -> Vec<ArenaContact> {
        let pairs = self.advance();
        let ball_z = self.adapter.translation(self.ball).z;

        pairs
            .into_iter()
            .filter_map(|(a, b)| {
                let other = if a == self.ball {
                    b
                } else if b == self.ball {
                    a
                } else {
                    return None;
                };
                let contact = match self.entity_of(other)? {
                    ArenaEntity::Paddle(side) => ArenaContact::Paddle(side),
                    ArenaEntity::Table => ArenaContact::Table {
                        side: Side::of_z(ball_z),
                    },
                    ArenaEntity::Net => ArenaContact::Net,
                    ArenaEntity::Floor => ArenaContact::Floor,
                    ArenaEntity::Ball => return None,
                };
                log::trace!("ball contact: {contact:?}");
                Some(contact)
            })
            .collect()
    }

    pub fn interpolated_pose(&self, entity: ArenaEntity, alpha: f32) -> BodyPose {
        self.adapter.interpolated_pose(self.body(entity), alpha)
    }

    pub fn reset_paddles(&mut self) {
        for side in [Side::Left, Side::Right] {
            let home = self.table.paddle_home(side);
            self.place_paddle(side, home, Quat::IDENTITY);
        }
    }
}

impl BallSimulation for TableArena {
    fn ball_state(&self) -> BallState {
        BallState {
            position: self.adapter.translation(self.ball),
            velocity: self.adapter.linear_velocity(self.ball),
            angular_velocity: self.adapter.angular_velocity(self.ball),
            spin: self.spin,
            frozen: self.adapter.is_frozen(self.ball),
        }
    }

    fn set_ball_state(&mut self, state: &BallState) {
        if state.frozen {
            self.adapter.teleport(self.ball, state.position, Quat::IDENTITY);
            self.adapter.freeze(self.ball);
            self.spin = Vec3::ZERO;
            return;
        }
        self.adapter.unfreeze(self.ball);
        self.adapter.set_translation(self.ball, state.position);
        self.adapter.set_linear_velocity(self.ball, state.velocity);
        self.adapter
            .set_angular_velocity(self.ball, state.angular_velocity);
        self.spin = state.spin;
    }

    fn step_ball(&mut self) {
        let contacts = self.step();
        if !contacts.is_empty() {
            log::debug!("resimulated step dropped contacts {contacts:?}");
            self.skipped_contacts += contacts.len() as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> TableArena {
        TableArena::new(&SimulationConfig::default(), &TableConfig::default())
    }

    #[test]
    fn ball_starts_frozen_at_serve_origin() {
        let mut arena = arena();
        let origin = TableConfig::default().serve_origin(Side::Left);
        assert!(arena.ball_state().frozen);

        for _ in 0..30 {
            arena.step();
        }
        let state = arena.ball_state();
        assert!(state.frozen);
        assert!((state.position - origin).length() < 1e-4);
    }

    #[test]
    fn dropped_ball_reports_table_side() {
        let mut arena = arena();
        arena.set_ball_state(&BallState {
            position: Vec3::new(0.3, 2.3, 1.2),
            ..Default::default()
        });

        let mut contacts = Vec::new();
        for _ in 0..60 {
            contacts.extend(arena.step());
        }
        assert_eq!(
            contacts.first(),
            Some(&ArenaContact::Table { side: Side::Right })
        );
        assert!(arena.ball_state().velocity.y.is_finite());
    }

    #[test]
    fn replayed_steps_count_the_contacts_they_drop() {
        let mut arena = arena();
        arena.set_ball_state(&BallState {
            position: Vec3::new(0.3, 2.3, 1.2),
            ..Default::default()
        });
        for _ in 0..60 {
            arena.step_ball();
        }
        assert!(arena.skipped_contacts() >= 1);
    }

    #[test]
    fn ball_off_the_table_hits_floor() {
        let mut arena = arena();
        arena.set_ball_state(&BallState {
            position: Vec3::new(3.0, 1.0, 4.0),
            ..Default::default()
        });

        let mut contacts = Vec::new();
        for _ in 0..60 {
            contacts.extend(arena.step());
        }
        assert!(contacts.contains(&ArenaContact::Floor));
    }

    #[test]
    fn paddle_sweep_through_ball_is_reported() {
        let mut arena = arena();
        let ball = Vec3::new(0.0, 2.3, -2.0);
        arena.set_ball_state(&BallState::at_rest(ball));
        arena.place_paddle(Side::Left, ball - Vec3::new(0.0, 0.0, 0.2), Quat::IDENTITY);
        arena.move_paddle(Side::Left, ball, Quat::IDENTITY);

        let contacts = arena.step();
        assert_eq!(contacts, vec![ArenaContact::Paddle(Side::Left)]);
    }

    #[test]
    fn spin_curves_the_ball() {
        let mut arena = arena();
        arena.set_ball_state(&BallState {
            position: Vec3::new(0.0, 3.0, -2.0),
            velocity: Vec3::new(0.0, 0.0, 5.0),
            spin: Vec3::new(0.0, 30.0, 0.0),
            ..Default::default()
        });
        for _ in 0..10 {
            arena.step();
        }
        let state = arena.ball_state();
        assert!(state.velocity.x > 0.0);
        assert!(state.spin.y < 30.0);
    }
}
