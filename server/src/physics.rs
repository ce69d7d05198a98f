use crate::scene::{BodyConfig, PlatformConfig, SceneConfig, WallsConfig};
use bevy::math::Vec2;
use bevy::prelude::Resource;
use bevy_log::debug;
use pond::water::{BodySample, BoundingBox};
use pond::ForceSink;
use rapier2d::prelude::*;
use std::num::NonZeroUsize;

/// Rigid-body dt used until the first `step` call sets one.
pub const DEFAULT_BODY_STEP: f32 = 1.0 / 180.0;

/// A dynamic box from the scene together with its rapier handle.
#[derive(Debug, Clone)]
pub struct TrackedBody {
    pub name: String,
    pub handle: RigidBodyHandle,
}

/// The rapier side of the simulation: every set the pipeline needs, owned
/// as one resource.
#[derive(Resource)]
pub struct RigidWorld {
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    tracked: Vec<TrackedBody>,
}

impl RigidWorld {
    pub fn new(gravity: f32) -> Self {
        // One solver pass per step keeps position in step with velocity under
        // the buoyancy forces.
        let integration_parameters = IntegrationParameters {
            dt: DEFAULT_BODY_STEP,
            num_solver_iterations: NonZeroUsize::MIN,
            ..Default::default()
        };

        Self {
            gravity: vector![0.0, gravity],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            tracked: Vec::new(),
        }
    }

    pub fn from_scene(scene: &SceneConfig) -> Self {
        let mut world = Self::new(scene.gravity);

        if let Some(walls) = &scene.walls {
            world.add_walls(walls);
        }
        for platform in &scene.platforms {
            world.add_platform(platform);
        }
        for body in &scene.bodies {
            world.add_body(body);
        }

        debug!(
            "Rigid world ready: {} colliders, {} dynamic bodies",
            world.colliders.len(),
            world.tracked.len()
        );
        world
    }

    /// Four static slabs around `[0, width] x [0, height]`, inner faces on
    /// the boundary.
    pub fn add_walls(&mut self, walls: &WallsConfig) {
        let t = walls.thickness.max(0.01);
        let (w, h) = (walls.width, walls.height);
        let slabs = [
            // floor, ceiling
            (w * 0.5, -t * 0.5, w * 0.5 + t, t * 0.5),
            (w * 0.5, h + t * 0.5, w * 0.5 + t, t * 0.5),
            // left, right
            (-t * 0.5, h * 0.5, t * 0.5, h * 0.5 + t),
            (w + t * 0.5, h * 0.5, t * 0.5, h * 0.5 + t),
        ];
        for (x, y, hx, hy) in slabs {
            self.colliders.insert(
                ColliderBuilder::cuboid(hx, hy)
                    .translation(vector![x, y])
                    .restitution(walls.restitution)
                    .build(),
            );
        }
    }

    pub fn add_platform(&mut self, platform: &PlatformConfig) -> ColliderHandle {
        let (hx, hy) = (platform.width * 0.5, platform.height * 0.5);
        self.colliders.insert(
            ColliderBuilder::cuboid(hx, hy)
                .translation(vector![platform.x + hx, platform.y + hy])
                .friction(platform.friction)
                .restitution(platform.restitution)
                .build(),
        )
    }

    /// Adds a dynamic box that cannot rotate. Its density is chosen so the
    /// collider carries exactly `mass`.
    pub fn add_body(&mut self, body: &BodyConfig) -> RigidBodyHandle {
        let (hx, hy) = (body.width * 0.5, body.height * 0.5);
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(vector![body.x + hx, body.y + hy])
            .lock_rotations()
            .build();
        let handle = self.bodies.insert(rigid_body);

        let collider = ColliderBuilder::cuboid(hx, hy)
            .density(body.mass / (body.width * body.height))
            .friction(body.friction)
            .restitution(body.restitution)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        self.tracked.push(TrackedBody {
            name: body.name.clone(),
            handle,
        });
        handle
    }

    pub fn tracked(&self) -> &[TrackedBody] {
        &self.tracked
    }

    /// Bounds, velocity and centre of mass of every tracked body.
    pub fn samples(&self) -> Vec<BodySample<RigidBodyHandle>> {
        let mut samples = Vec::with_capacity(self.tracked.len());
        for tracked in &self.tracked {
            let Some(body) = self.bodies.get(tracked.handle) else {
                continue;
            };
            let Some(bounds) = self.body_bounds(body) else {
                continue;
            };
            let linvel = body.linvel();
            let com = body.center_of_mass();
            samples.push(
                BodySample::new(tracked.handle, bounds, Vec2::new(linvel.x, linvel.y))
                    .with_center_of_mass(Vec2::new(com.x, com.y)),
            );
        }
        samples
    }

    /// Union of the AABBs of the body's colliders.
    fn body_bounds(&self, body: &RigidBody) -> Option<BoundingBox> {
        let mut bounds: Option<BoundingBox> = None;
        for collider in body.colliders().iter().filter_map(|h| self.colliders.get(*h)) {
            let aabb = collider.compute_aabb();
            let next = BoundingBox::new(aabb.mins.x, aabb.mins.y, aabb.maxs.x, aabb.maxs.y);
            bounds = Some(match bounds {
                Some(b) => BoundingBox::new(
                    b.left.min(next.left),
                    b.bottom.min(next.bottom),
                    b.right.max(next.right),
                    b.top.max(next.top),
                ),
                None => next,
            });
        }
        bounds
    }

    pub fn body_position(&self, handle: RigidBodyHandle) -> Option<Vec2> {
        self.bodies.get(handle).map(|body| {
            let t = body.translation();
            Vec2::new(t.x, t.y)
        })
    }

    pub fn body_velocity(&self, handle: RigidBodyHandle) -> Option<Vec2> {
        self.bodies.get(handle).map(|body| {
            let v = body.linvel();
            Vec2::new(v.x, v.y)
        })
    }

    /// Clear user forces; rapier keeps them across steps otherwise.
    pub fn reset_forces(&mut self) {
        for tracked in &self.tracked {
            if let Some(body) = self.bodies.get_mut(tracked.handle) {
                body.reset_forces(false);
            }
        }
    }

    pub fn step(&mut self, dt: f32) {
        if dt > 0.0 && dt.is_finite() {
            self.integration_parameters.dt = dt;
        }

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }
}

impl ForceSink<RigidBodyHandle> for RigidWorld {
    fn apply_force_at_point(&mut self, body: RigidBodyHandle, force: Vec2, point: Vec2) {
        if let Some(rigid_body) = self.bodies.get_mut(body) {
            log::trace!("Force {:?} on {:?} at {:?}", force, body, point);
            rigid_body.add_force_at_point(vector![force.x, force.y], point![point.x, point.y], true);
        }
    }
}
