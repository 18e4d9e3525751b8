use std::collections::HashMap;

use glam::{Quat, Vec3};
use rapier3d::prelude::*;

use super::world::{Material, PhysicsWorld};

/// Typed index of a body owned by [`RigidBodyAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(u32);

impl BodyId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for BodyPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl BodyPose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn lerp(&self, other: &BodyPose, alpha: f32) -> BodyPose {
        let to = if self.rotation.dot(other.rotation) < 0.0 {
            -other.rotation
        } else {
            other.rotation
        };
        BodyPose {
            position: self.position.lerp(other.position, alpha),
            rotation: self.rotation.slerp(to, alpha),
        }
    }
}

struct BodyEntry {
    body: Option<RigidBodyHandle>,
    collider: ColliderHandle,
    previous: BodyPose,
    current: BodyPose,
    frozen: bool,
}

/// Thin wrapper over the physics world: one body and collider per entity,
/// addressed by [`BodyId`], with the previous/current pose pair used for
/// render interpolation. Unknown ids read as zero and ignore writes.
pub struct RigidBodyAdapter {
    world: PhysicsWorld,
    entries: Vec<BodyEntry>,
    by_collider: HashMap<ColliderHandle, BodyId>,
}

impl RigidBodyAdapter {
    pub fn new(dt: f32, gravity: f32) -> Self {
        Self {
            world: PhysicsWorld::new(dt, gravity),
            entries: Vec::new(),
            by_collider: HashMap::new(),
        }
    }

    pub fn dt(&self) -> f32 {
        self.world.dt()
    }

    fn insert(
        &mut self,
        body: Option<RigidBodyHandle>,
        collider: ColliderHandle,
        pose: BodyPose,
    ) -> BodyId {
        let id = BodyId(self.entries.len() as u32);
        self.entries.push(BodyEntry {
            body,
            collider,
            previous: pose,
            current: pose,
            frozen: false,
        });
        self.by_collider.insert(collider, id);
        id
    }

    pub fn spawn_dynamic_sphere(&mut self, position: Vec3, radius: f32, material: Material) -> BodyId {
        let (body, collider) = self.world.add_dynamic_sphere(position, radius, material);
        self.insert(Some(body), collider, BodyPose::new(position, Quat::IDENTITY))
    }

    pub fn spawn_kinematic_box(
        &mut self,
        position: Vec3,
        half_extents: Vec3,
        material: Material,
        sensor: bool,
    ) -> BodyId {
        let (body, collider) = self
            .world
            .add_kinematic_box(position, half_extents, material, sensor);
        self.insert(Some(body), collider, BodyPose::new(position, Quat::IDENTITY))
    }

    pub fn spawn_static_box(&mut self, position: Vec3, half_extents: Vec3, material: Material) -> BodyId {
        let collider = self.world.add_static_box(position, half_extents, material);
        self.insert(None, collider, BodyPose::new(position, Quat::IDENTITY))
    }

    pub fn body_for_collider(&self, collider: ColliderHandle) -> Option<BodyId> {
        self.by_collider.get(&collider).copied()
    }

    fn rigid_body(&self, id: BodyId) -> Option<&RigidBody> {
        let handle = self.entries.get(id.index())?.body?;
        self.world.body(handle)
    }

    fn rigid_body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        let handle = self.entries.get(id.index())?.body?;
        self.world.body_mut(handle)
    }

    pub fn translation(&self, id: BodyId) -> Vec3 {
        match self.rigid_body(id) {
            Some(body) => {
                let t = body.translation();
                Vec3::new(t.x, t.y, t.z)
            }
            None => self
                .entries
                .get(id.index())
                .map_or(Vec3::ZERO, |entry| entry.current.position),
        }
    }

    pub fn set_translation(&mut self, id: BodyId, position: Vec3) {
        let Some(body) = self.rigid_body_mut(id) else {
            return;
        };
        body.set_translation(Vector::new(position.x, position.y, position.z), true);
        if let Some(entry) = self.entries.get_mut(id.index()) {
            entry.current.position = position;
        }
    }

    pub fn rotation(&self, id: BodyId) -> Quat {
        self.rigid_body(id).map_or(Quat::IDENTITY, |body| {
            let r = body.rotation();
            Quat::from_xyzw(r.x, r.y, r.z, r.w)
        })
    }

    pub fn linear_velocity(&self, id: BodyId) -> Vec3 {
        self.rigid_body(id).map_or(Vec3::ZERO, |body| {
            let v = body.linvel();
            Vec3::new(v.x, v.y, v.z)
        })
    }

    pub fn set_linear_velocity(&mut self, id: BodyId, velocity: Vec3) {
        if let Some(body) = self.rigid_body_mut(id) {
            body.set_linvel(Vector::new(velocity.x, velocity.y, velocity.z), true);
        }
    }

    pub fn angular_velocity(&self, id: BodyId) -> Vec3 {
        self.rigid_body(id).map_or(Vec3::ZERO, |body| {
            let w = body.angvel();
            Vec3::new(w.x, w.y, w.z)
        })
    }

    pub fn set_angular_velocity(&mut self, id: BodyId, velocity: Vec3) {
        if let Some(body) = self.rigid_body_mut(id) {
            body.set_angvel(Vector::new(velocity.x, velocity.y, velocity.z), true);
        }
    }

    pub fn mass(&self, id: BodyId) -> f32 {
        self.rigid_body(id).map_or(0.0, |body| body.mass())
    }

    pub fn apply_impulse(&mut self, id: BodyId, impulse: Vec3) {
        if let Some(body) = self.rigid_body_mut(id) {
            body.apply_impulse(Vector::new(impulse.x, impulse.y, impulse.z), true);
        }
    }

    pub fn apply_torque_impulse(&mut self, id: BodyId, impulse: Vec3) {
        if let Some(body) = self.rigid_body_mut(id) {
            body.apply_torque_impulse(Vector::new(impulse.x, impulse.y, impulse.z), true);
        }
    }

    /// Locks translation and rotation, zeroes velocities and gravity.
    pub fn freeze(&mut self, id: BodyId) {
        let Some(body) = self.rigid_body_mut(id) else {
            return;
        };
        body.set_linvel(Vector::new(0.0, 0.0, 0.0), false);
        body.set_angvel(Vector::new(0.0, 0.0, 0.0), false);
        body.lock_translations(true, false);
        body.lock_rotations(true, false);
        body.set_gravity_scale(0.0, true);
        if let Some(entry) = self.entries.get_mut(id.index()) {
            entry.frozen = true;
        }
    }

    pub fn unfreeze(&mut self, id: BodyId) {
        let Some(body) = self.rigid_body_mut(id) else {
            return;
        };
        body.lock_translations(false, false);
        body.lock_rotations(false, false);
        body.set_gravity_scale(1.0, true);
        if let Some(entry) = self.entries.get_mut(id.index()) {
            entry.frozen = false;
        }
    }

    pub fn is_frozen(&self, id: BodyId) -> bool {
        self.entries.get(id.index()).is_some_and(|entry| entry.frozen)
    }

    pub fn set_kinematic_target(&mut self, id: BodyId, position: Vec3, rotation: Quat) {
        if let Some(handle) = self.entries.get(id.index()).and_then(|entry| entry.body) {
            self.world.set_next_kinematic_pose(handle, position, rotation);
        }
    }

    /// Places a body without leaving an interpolation trail behind it.
    pub fn teleport(&mut self, id: BodyId, position: Vec3, rotation: Quat) {
        let Some(handle) = self.entries.get(id.index()).and_then(|entry| entry.body) else {
            return;
        };
        self.world.set_body_pose(handle, position, rotation);
        if let Some(entry) = self.entries.get_mut(id.index()) {
            entry.previous = BodyPose::new(position, rotation);
            entry.current = entry.previous;
        }
    }

    /// Steps the engine once, rolls the pose pairs forward and returns the
    /// body pairs that started touching.
    pub fn step(&mut self) -> Vec<(BodyId, BodyId)> {
        for entry in &mut self.entries {
            entry.previous = entry.current;
        }

        let started = self.world.step();

        for index in 0..self.entries.len() {
            let Some(handle) = self.entries[index].body else {
                continue;
            };
            if let Some(body) = self.world.body(handle) {
                let t = body.translation();
                let r = body.rotation();
                self.entries[index].current = BodyPose::new(
                    Vec3::new(t.x, t.y, t.z),
                    Quat::from_xyzw(r.x, r.y, r.z, r.w),
                );
            }
        }

        started
            .into_iter()
            .filter_map(|(a, b)| {
                let a = self.body_for_collider(a)?;
                let b = self.body_for_collider(b)?;
                Some((a, b))
            })
            .collect()
    }

    pub fn interpolated_pose(&self, id: BodyId, alpha: f32) -> BodyPose {
        self.entries
            .get(id.index())
            .map_or(BodyPose::default(), |entry| {
                entry.previous.lerp(&entry.current, alpha.clamp(0.0, 1.0))
            })
    }

    pub fn body_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> RigidBodyAdapter {
        RigidBodyAdapter::new(1.0 / 60.0, 9.81)
    }

    #[test]
    fn missing_body_reads_as_zero() {
        let mut adapter = adapter();
        let ghost = BodyId(42);

        assert_eq!(adapter.translation(ghost), Vec3::ZERO);
        assert_eq!(adapter.linear_velocity(ghost), Vec3::ZERO);
        adapter.set_linear_velocity(ghost, Vec3::ONE);
        adapter.freeze(ghost);
        assert!(!adapter.is_frozen(ghost));
    }

    #[test]
    fn dynamic_body_falls_and_frozen_body_stays() {
        let mut adapter = adapter();
        let falling = adapter.spawn_dynamic_sphere(Vec3::new(0.0, 5.0, 0.0), 0.1, Material::default());
        let frozen = adapter.spawn_dynamic_sphere(Vec3::new(3.0, 5.0, 0.0), 0.1, Material::default());
        adapter.freeze(frozen);

        for _ in 0..30 {
            adapter.step();
        }

        assert!(adapter.translation(falling).y < 5.0);
        assert!((adapter.translation(frozen).y - 5.0).abs() < 1e-4);
        assert!(adapter.is_frozen(frozen));

        adapter.unfreeze(frozen);
        for _ in 0..10 {
            adapter.step();
        }
        assert!(adapter.translation(frozen).y < 5.0);
    }

    #[test]
    fn interpolated_pose_blends_previous_and_current() {
        let mut adapter = adapter();
        let ball = adapter.spawn_dynamic_sphere(Vec3::new(0.0, 5.0, 0.0), 0.1, Material::default());
        adapter.set_linear_velocity(ball, Vec3::new(6.0, 0.0, 0.0));
        adapter.step();

        let start = adapter.interpolated_pose(ball, 0.0).position;
        let end = adapter.interpolated_pose(ball, 1.0).position;
        let mid = adapter.interpolated_pose(ball, 0.5).position;

        assert!(end.x > start.x);
        assert!((mid.x - (start.x + end.x) * 0.5).abs() < 1e-4);
    }

    #[test]
    fn collision_pairs_are_reported_by_body_id() {
        let mut adapter = adapter();
        let ball = adapter.spawn_dynamic_sphere(Vec3::new(0.0, 0.5, 0.0), 0.1, Material::default());
        let ground = adapter.spawn_static_box(Vec3::ZERO, Vec3::new(5.0, 0.1, 5.0), Material::default());

        let mut seen = false;
        for _ in 0..120 {
            for (a, b) in adapter.step() {
                if (a == ball && b == ground) || (a == ground && b == ball) {
                    seen = true;
                }
            }
        }
        assert!(seen);
    }
}
