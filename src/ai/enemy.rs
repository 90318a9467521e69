//! Enemy agent: shared record, tunables and the wired state machine
//!
//! Each [`Enemy`] tick runs in a fixed order:
//!
//! 1. Vision refreshes the player target
//! 2. Hearing consumes last frame's sounds
//! 3. The scream cooldown advances
//! 4. The state machine evaluates transitions and ticks
//! 5. Events produced by the states are flushed to the [`EventQueue`]

use std::fmt;
use std::sync::Arc;

use glam::Vec3;
use hecs::Entity;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::fsm::StateMachine;
use super::graph::PatrolGraph;
use super::look_at::LookAtDriver;
use super::navigation::Navigator;
use super::pathfinding::PathPlanner;
use super::perception::{FieldOfView, Hearing, SightTarget};
use super::states::{
    ChasePlayerState, ChaseSoundState, IdleState, LastKnownPositionState, RoamState, ScreamState,
};
use crate::core::{AiConfig, ConfigError, EventQueue, GameEvent};
use crate::physics::SpatialQuery;

// ============================================================================
// Blackboard
// ============================================================================

/// Player currently in sight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerTarget {
    pub entity: Entity,
    pub position: Vec3,
}

/// Per-agent facts written by perception and the states, read by guards
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blackboard {
    /// Player in sight, refreshed every tick
    pub player_target: Option<PlayerTarget>,
    /// Position of the last sound heard
    pub sound_target: Option<Vec3>,
    /// Where the player was when sight was lost
    pub last_known_player_position: Option<Vec3>,
    /// Sight of the player was lost and not yet investigated
    pub lost_player: bool,
    /// Display name of the active state
    pub current_state: &'static str,
    /// Time since the last scream finished
    pub scream_cooldown_elapsed: f32,
}

impl Blackboard {
    /// No player, sound or memory to act on
    #[must_use]
    pub fn has_no_target(&self) -> bool {
        self.player_target.is_none()
            && self.sound_target.is_none()
            && self.last_known_player_position.is_none()
    }

    #[must_use]
    pub fn scream_ready(&self, stats: &EnemyStats) -> bool {
        stats.scream_enabled && self.scream_cooldown_elapsed >= stats.scream_cooldown
    }
}

// ============================================================================
// Tunables
// ============================================================================

/// Movement and timing stats of one enemy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyStats {
    pub walk_speed: f32,
    pub chase_speed: f32,
    /// Pause at the end of a roam route
    pub roam_wait_time: f32,
    /// Time spent investigating a sound or last known position
    pub after_chase_wait_time: f32,
    pub scream_cooldown: f32,
    pub scream_duration: f32,
    pub scream_enabled: bool,
    /// Radius of the alert wave sent out by a scream
    pub scream_radius: f32,
    /// Distance under which an investigated point counts as reached
    pub arrival_radius: f32,
    /// Turn rate while screaming
    pub turn_speed: f32,
}

impl EnemyStats {
    /// Reject stats an agent cannot act on
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] for non-positive speeds or radii, or a
    /// non-positive scream cooldown while screaming is enabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut positive = vec![
            ("walk_speed", self.walk_speed),
            ("chase_speed", self.chase_speed),
            ("arrival_radius", self.arrival_radius),
        ];
        // A scream only ends once the cooldown is no longer ready
        if self.scream_enabled {
            positive.push(("scream_cooldown", self.scream_cooldown));
        }
        for (field, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for EnemyStats {
    fn default() -> Self {
        Self {
            walk_speed: 2.0,
            chase_speed: 5.0,
            roam_wait_time: 2.0,
            after_chase_wait_time: 2.0,
            scream_cooldown: 20.0,
            scream_duration: 2.0,
            scream_enabled: true,
            scream_radius: 12.0,
            arrival_radius: 1.0,
            turn_speed: 5.0,
        }
    }
}

/// How roam goals are chosen and walked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoamConfig {
    /// Goals are drawn from nodes this close to the player
    pub player_bias_radius: f32,
    /// Nearest nodes to the player used when none are in the bias radius
    pub fallback_nearest: usize,
    /// Distance under which a route waypoint counts as reached
    pub arrive_threshold: f32,
    /// Wait before planning again after a failed search
    pub path_retry_interval: f32,
}

impl Default for RoamConfig {
    fn default() -> Self {
        Self {
            player_bias_radius: 20.0,
            fallback_nearest: 5,
            arrive_threshold: 1.0,
            path_retry_interval: 1.0,
        }
    }
}

// ============================================================================
// State keys
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyStateId {
    Idle,
    Roam,
    ChasePlayer,
    ChaseSound,
    LastKnownPosition,
    Scream,
}

impl EnemyStateId {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => IdleState::NAME,
            Self::Roam => RoamState::NAME,
            Self::ChasePlayer => ChasePlayerState::NAME,
            Self::ChaseSound => ChaseSoundState::NAME,
            Self::LastKnownPosition => LastKnownPositionState::NAME,
            Self::Scream => ScreamState::NAME,
        }
    }
}

impl fmt::Display for EnemyStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Context
// ============================================================================

/// Everything the states of one enemy read and write
#[derive(Debug)]
pub struct EnemyContext<N> {
    pub agent: Entity,
    pub blackboard: Blackboard,
    pub stats: EnemyStats,
    pub roam: RoamConfig,
    pub navigator: N,
    pub graph: Arc<PatrolGraph>,
    pub planner: PathPlanner,
    pub rng: ChaCha8Rng,
    /// Player position known to the level, used to bias roaming
    pub player_position: Option<Vec3>,
    pub delta_time: f32,
    /// Events raised by states this tick
    pub outbox: Vec<GameEvent>,
}

impl<N: Navigator> EnemyContext<N> {
    /// Publish a state change
    pub fn announce(&mut self, state: &'static str) {
        log::debug!("Enemy {:?} entered {state}", self.agent);
        self.blackboard.current_state = state;
        self.outbox.push(GameEvent::StateChanged {
            agent: self.agent,
            state,
        });
    }
}

// ============================================================================
// Enemy
// ============================================================================

/// One AI-driven enemy
pub struct Enemy<N: Navigator + 'static> {
    ctx: EnemyContext<N>,
    fsm: StateMachine<EnemyStateId, EnemyContext<N>>,
    vision: FieldOfView,
    hearing: Hearing,
    look_at: LookAtDriver,
}

impl<N: Navigator + 'static> Enemy<N> {
    /// Wire up an enemy and enter Idle
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] when the stats cannot drive an agent.
    pub fn new(
        agent: Entity,
        mut navigator: N,
        graph: Arc<PatrolGraph>,
        config: &AiConfig,
    ) -> Result<Self, ConfigError> {
        config.stats.validate()?;
        navigator.set_speed(config.stats.walk_speed);

        let mut ctx = EnemyContext {
            agent,
            blackboard: Blackboard::default(),
            stats: config.stats.clone(),
            roam: config.roam.clone(),
            navigator,
            graph,
            planner: PathPlanner::new(config.metric),
            rng: ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(u64::from(agent.id()))),
            player_position: None,
            delta_time: 0.0,
            outbox: Vec::new(),
        };

        let mut fsm = Self::state_machine();
        fsm.start(EnemyStateId::Idle, &mut ctx)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(Self {
            ctx,
            fsm,
            vision: FieldOfView::new(config.vision.clone()),
            hearing: Hearing::new(config.hearing.clone()),
            look_at: LookAtDriver::new(config.look_at.clone()),
        })
    }

    /// States and transitions, in priority order
    fn state_machine() -> StateMachine<EnemyStateId, EnemyContext<N>> {
        use EnemyStateId::{ChasePlayer, ChaseSound, Idle, LastKnownPosition, Roam, Scream};

        let mut fsm = StateMachine::new();
        fsm.add_state(Idle, IdleState);
        fsm.add_state(Roam, RoamState::default());
        fsm.add_state(ChasePlayer, ChasePlayerState);
        fsm.add_state(ChaseSound, ChaseSoundState::default());
        fsm.add_state(LastKnownPosition, LastKnownPositionState::default());
        fsm.add_state(Scream, ScreamState::default());

        fsm.add_any_transition(Scream, |ctx: &EnemyContext<N>| {
            ctx.blackboard.scream_ready(&ctx.stats) && ctx.blackboard.player_target.is_some()
        });
        fsm.add_transition(Scream, ChasePlayer, |ctx: &EnemyContext<N>| {
            !ctx.blackboard.scream_ready(&ctx.stats) && ctx.blackboard.player_target.is_some()
        });
        fsm.add_transition(Scream, Idle, |ctx: &EnemyContext<N>| {
            !ctx.blackboard.scream_ready(&ctx.stats) && ctx.blackboard.player_target.is_none()
        });

        fsm.add_transition_from(&[Idle, Roam], ChasePlayer, |ctx: &EnemyContext<N>| {
            ctx.blackboard.player_target.is_some()
        });
        // Losing sight mid-chase goes straight to the remembered spot
        fsm.add_transition(ChasePlayer, LastKnownPosition, |ctx: &EnemyContext<N>| {
            let board = &ctx.blackboard;
            board.player_target.is_none()
                && board.last_known_player_position.is_some()
                && board.lost_player
        });
        fsm.add_transition(ChasePlayer, Idle, |ctx: &EnemyContext<N>| {
            ctx.blackboard.player_target.is_none()
        });

        fsm.add_transition_from(&[Idle, Roam], LastKnownPosition, |ctx: &EnemyContext<N>| {
            ctx.blackboard.last_known_player_position.is_some() && ctx.blackboard.lost_player
        });
        fsm.add_transition(LastKnownPosition, ChasePlayer, |ctx: &EnemyContext<N>| {
            ctx.blackboard.player_target.is_some()
        });
        fsm.add_transition(LastKnownPosition, Idle, |ctx: &EnemyContext<N>| {
            ctx.blackboard.last_known_player_position.is_none()
        });

        fsm.add_transition_from(&[Idle, Roam], ChaseSound, |ctx: &EnemyContext<N>| {
            ctx.blackboard.sound_target.is_some()
        });
        fsm.add_transition(ChaseSound, Idle, |ctx: &EnemyContext<N>| {
            ctx.blackboard.sound_target.is_none() || ctx.blackboard.player_target.is_some()
        });

        fsm.add_transition(Idle, Roam, |ctx: &EnemyContext<N>| {
            ctx.blackboard.has_no_target()
        });

        fsm
    }

    /// Advance perception and behaviour by `dt` seconds.
    ///
    /// `player_position` is the level's knowledge of the player used to bias
    /// roaming; only `targets` that pass the vision check are chased.
    pub fn tick(
        &mut self,
        dt: f32,
        targets: &[SightTarget],
        player_position: Option<Vec3>,
        events: &mut EventQueue,
        space: &impl SpatialQuery,
    ) {
        self.ctx.delta_time = dt;
        self.ctx.player_position = player_position;

        let position = self.ctx.navigator.position();
        let forward = self.ctx.navigator.forward();
        self.vision.update(
            dt,
            position,
            forward,
            targets,
            space,
            &mut self.ctx.blackboard,
        );
        self.hearing
            .process(position, events.sounds(), &mut self.ctx.blackboard);

        if self.fsm.current() != Some(EnemyStateId::Scream) {
            let board = &mut self.ctx.blackboard;
            board.scream_cooldown_elapsed =
                (board.scream_cooldown_elapsed + dt).min(self.ctx.stats.scream_cooldown);
        }

        if let Err(err) = self.fsm.tick(&mut self.ctx) {
            log::warn!("Enemy {:?} skipped a tick: {err}", self.ctx.agent);
        }

        self.look_at
            .update(dt, self.ctx.blackboard.current_state, &mut self.ctx.rng);
        events.extend(self.ctx.outbox.drain(..));
    }

    #[must_use]
    pub fn entity(&self) -> Entity {
        self.ctx.agent
    }

    #[must_use]
    pub fn state(&self) -> Option<EnemyStateId> {
        self.fsm.current()
    }

    /// Display name of the active state
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        self.ctx.blackboard.current_state
    }

    #[must_use]
    pub fn blackboard(&self) -> &Blackboard {
        &self.ctx.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.ctx.blackboard
    }

    #[must_use]
    pub fn stats(&self) -> &EnemyStats {
        &self.ctx.stats
    }

    #[must_use]
    pub fn navigator(&self) -> &N {
        &self.ctx.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.ctx.navigator
    }

    #[must_use]
    pub fn vision(&self) -> &FieldOfView {
        &self.vision
    }

    /// Head-tracking weight for the animation rig
    #[must_use]
    pub fn look_weight(&self) -> f32 {
        self.look_at.weight()
    }
}

impl<N: Navigator + fmt::Debug + 'static> fmt::Debug for Enemy<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enemy")
            .field("agent", &self.ctx.agent)
            .field("state", &self.fsm.current())
            .field("navigator", &self.ctx.navigator)
            .finish_non_exhaustive()
    }
}
