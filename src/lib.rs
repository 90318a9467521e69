//! Enemy AI core for a first-person horror game
//!
//! This crate provides:
//! - A patrol graph built from line-of-sight probes against rapier3d colliders
//! - A* pathfinding with per-agent search state
//! - Vision and hearing perception
//! - A table-driven state machine driving Idle, Roam, Chase and Scream behaviour
//! - Entity Component System (ECS) integration with hecs

pub mod ai;
pub mod core;
pub mod ecs;
pub mod physics;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rapier3d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        CostMetric, Enemy, EnemyStateId, EnemyStats, Navigator, NodeId, PatrolGraph,
        PatrolGraphBuilder, PathPlanner, SoundStrength, SteeringAgent,
    };
    pub use crate::core::{AiConfig, ConfigError, EventQueue, GameEvent, Simulation};
    pub use crate::ecs::{Name, Transform, World};
    pub use crate::physics::{LayerMask, Physics, SpatialQuery};
    pub use glam::{Quat, Vec3};
}
