use std::sync::Mutex;

use glam::{Quat, Vec3};
use rapier3d::prelude::*;

/// Collects collision-start pairs raised during a pipeline step.
#[derive(Default)]
struct CollisionRecorder {
    started: Mutex<Vec<(ColliderHandle, ColliderHandle)>>,
}

impl CollisionRecorder {
    fn drain(&self) -> Vec<(ColliderHandle, ColliderHandle)> {
        match self.started.lock() {
            Ok(mut started) => std::mem::take(&mut *started),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventHandler for CollisionRecorder {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let CollisionEvent::Started(h1, h2, _) = event {
            if let Ok(mut started) = self.started.lock() {
                started.push((h1, h2));
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Material parameters for a collider.
#[derive(Debug, Clone, Copy)]
pub struct Material {
    pub density: Real,
    pub restitution: Real,
    pub friction: Real,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 1.0,
            restitution: 0.0,
            friction: 0.5,
        }
    }
}

pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    gravity: Vector,
    recorder: CollisionRecorder,
}

impl PhysicsWorld {
    pub fn new(dt: Real, gravity: Real) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = dt;
        integration_parameters.min_ccd_dt = dt / 100.0;

        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: Vector::new(0.0, -gravity, 0.0),
            recorder: CollisionRecorder::default(),
        }
    }

    pub fn dt(&self) -> Real {
        self.integration_parameters.dt
    }

    /// Advances the engine one step and returns the collider pairs that
    /// started touching during it.
    pub fn step(&mut self) -> Vec<(ColliderHandle, ColliderHandle)> {
        self.pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &self.recorder,
        );

        self.recorder.drain()
    }

    pub fn add_dynamic_sphere(
        &mut self,
        position: Vec3,
        radius: Real,
        material: Material,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body = RigidBodyBuilder::dynamic()
            .translation(Vector::new(position.x, position.y, position.z))
            .ccd_enabled(true)
            .build();
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::ball(radius)
            .density(material.density)
            .restitution(material.restitution)
            .friction(material.friction)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        (handle, collider)
    }

    pub fn add_kinematic_box(
        &mut self,
        position: Vec3,
        half_extents: Vec3,
        material: Material,
        sensor: bool,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(Vector::new(position.x, position.y, position.z))
            .build();
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .restitution(material.restitution)
            .friction(material.friction)
            .sensor(sensor)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        (handle, collider)
    }

    pub fn add_static_box(
        &mut self,
        position: Vec3,
        half_extents: Vec3,
        material: Material,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(Vector::new(position.x, position.y, position.z))
            .restitution(material.restitution)
            .friction(material.friction)
            .build();
        self.colliders.insert(collider)
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn set_next_kinematic_pose(&mut self, handle: RigidBodyHandle, position: Vec3, rotation: Quat) {
        if let Some(body) = self.bodies.get_mut(handle) {
            let rot =
                Rotation::from_xyzw(rotation.x, rotation.y, rotation.z, rotation.w).normalize();
            let new_pose = Pose::from_parts(Vector::new(position.x, position.y, position.z), rot);
            body.set_next_kinematic_position(new_pose);
        }
    }

    pub fn set_body_pose(&mut self, handle: RigidBodyHandle, position: Vec3, rotation: Quat) {
        if let Some(body) = self.bodies.get_mut(handle) {
            let rot =
                Rotation::from_xyzw(rotation.x, rotation.y, rotation.z, rotation.w).normalize();
            let new_pose = Pose::from_parts(Vector::new(position.x, position.y, position.z), rot);
            body.set_position(new_pose, true);
        }
    }
}
