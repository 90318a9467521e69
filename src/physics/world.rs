//! Static collision world using rapier3d
//!
//! Level geometry is made of fixed bodies with box colliders tagged by
//! [`LayerMask`]. Nothing here simulates dynamics; the pipeline is only stepped
//! to keep the query structures in sync with the colliders.

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::parry::shape::Ball;
use rapier3d::prelude::*;

use super::query::{LayerMask, SpatialQuery};

/// Handle to a rigid body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RigidBodyHandle(pub rapier3d::dynamics::RigidBodyHandle);

/// Handle to a collider in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub rapier3d::geometry::ColliderHandle);

/// Convert glam Quat to rapier3d UnitQuaternion
fn quat_to_rapier(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn layer_groups(layer: LayerMask) -> InteractionGroups {
    InteractionGroups::new(Group::from_bits_truncate(layer.0), Group::ALL)
}

fn query_filter(mask: LayerMask) -> QueryFilter<'static> {
    QueryFilter::default().groups(InteractionGroups::new(
        Group::ALL,
        Group::from_bits_truncate(mask.0),
    ))
}

/// Physics world holding the level's static colliders
pub struct Physics {
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// Query pipeline for raycasting
    query_pipeline: QueryPipeline,
    integration_parameters: IntegrationParameters,
    /// Set when colliders changed since the last sync
    dirty: bool,
}

impl Physics {
    /// Create an empty physics world
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            dirty: false,
        }
    }

    /// Step the pipeline so queries see every collider added so far.
    ///
    /// All bodies are fixed, so this never moves anything.
    pub fn sync(&mut self) {
        self.pipeline.step(
            &vector![0.0, 0.0, 0.0],
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
        self.dirty = false;
    }

    /// Whether colliders were added since the last [`sync`](Self::sync)
    #[must_use]
    pub fn needs_sync(&self) -> bool {
        self.dirty
    }

    /// Create a static rigid body (doesn't move)
    pub fn create_static_body(&mut self, position: Vec3, rotation: Quat) -> RigidBodyHandle {
        let isometry = Isometry::from_parts(
            Translation3::new(position.x, position.y, position.z),
            quat_to_rapier(rotation),
        );
        let body = RigidBodyBuilder::fixed().position(isometry).build();

        RigidBodyHandle(self.rigid_body_set.insert(body))
    }

    /// Add a box collider on `layer` to a rigid body
    pub fn add_box_collider(
        &mut self,
        body: RigidBodyHandle,
        half_extents: Vec3,
        layer: LayerMask,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .collision_groups(layer_groups(layer))
            .build();

        self.dirty = true;
        ColliderHandle(self.collider_set.insert_with_parent(
            collider,
            body.0,
            &mut self.rigid_body_set,
        ))
    }

    /// Add an axis-aligned obstacle box centred at `center`
    pub fn add_obstacle(&mut self, center: Vec3, half_extents: Vec3) -> ColliderHandle {
        let body = self.create_static_body(center, Quat::IDENTITY);
        self.add_box_collider(body, half_extents, LayerMask::OBSTACLE)
    }

    /// Add a flat ground slab whose top surface sits at `height`
    pub fn add_ground(&mut self, height: f32, half_size: f32) -> ColliderHandle {
        let body = self.create_static_body(Vec3::new(0.0, height - 0.1, 0.0), Quat::IDENTITY);
        self.add_box_collider(body, Vec3::new(half_size, 0.1, half_size), LayerMask::GROUND)
    }

    /// Number of colliders in the world
    #[must_use]
    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    /// Cast a ray against colliders on `mask` and return the first hit
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RaycastHit> {
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                query_filter(mask),
            )
            .map(|(handle, distance)| {
                let point = ray.point_at(distance);
                RaycastHit {
                    collider: ColliderHandle(handle),
                    point: Vec3::new(point.x, point.y, point.z),
                    distance,
                }
            })
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Physics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Physics")
            .field("colliders", &self.collider_set.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl SpatialQuery for Physics {
    fn is_blocked(&self, from: Vec3, to: Vec3, mask: LayerMask) -> bool {
        let delta = to - from;
        let distance = delta.length();
        if distance <= f32::EPSILON {
            return false;
        }
        self.raycast(from, delta / distance, distance, mask).is_some()
    }

    fn ground_below(&self, origin: Vec3, max_distance: f32) -> Option<Vec3> {
        self.raycast(origin, Vec3::NEG_Y, max_distance, LayerMask::ALL)
            .map(|hit| hit.point)
    }

    fn sphere_blocked(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool {
        let shape = Ball::new(radius);
        let position = Isometry::translation(center.x, center.y, center.z);
        self.query_pipeline
            .intersection_with_shape(
                &self.rigid_body_set,
                &self.collider_set,
                &position,
                &shape,
                query_filter(mask),
            )
            .is_some()
    }
}

/// Result of a raycast
#[derive(Debug, Clone)]
pub struct RaycastHit {
    /// The collider that was hit
    pub collider: ColliderHandle,
    /// The point of intersection
    pub point: Vec3,
    /// Distance from ray origin
    pub distance: f32,
}
