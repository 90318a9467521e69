//! AI and navigation module
//!
//! Patrol graph construction, A* pathfinding, perception and the enemy state
//! machine.

mod builder;
mod enemy;
mod fsm;
mod graph;
mod look_at;
mod navigation;
mod pathfinding;
mod perception;
mod priority_queue;
mod states;

pub use builder::{BuildReport, GraphBuilderConfig, PatrolGraphBuilder, SpawnerConfig, spawn_grid};
pub use enemy::{
    Blackboard, Enemy, EnemyContext, EnemyStateId, EnemyStats, PlayerTarget, RoamConfig,
};
pub use fsm::{Condition, FsmError, State, StateMachine, Transition};
pub use graph::{NodeId, PatrolGraph, PatrolNode, SearchState};
pub use look_at::{LookAtConfig, LookAtDriver};
pub use navigation::{Navigator, SteeringAgent};
pub use pathfinding::{CostMetric, PathError, PathPlanner, PathResult};
pub use perception::{
    FieldOfView, Hearing, HearingConfig, SightTarget, SoundStrength, VisionConfig,
};
pub use priority_queue::{EmptyQueueError, PriorityQueue};
pub use states::{
    ChasePlayerState, ChaseSoundState, IdleState, LastKnownPositionState, RoamState, ScreamState,
};
