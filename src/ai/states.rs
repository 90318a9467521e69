//! Enemy behaviour states
//!
//! Every state announces itself on enter so observers (animation rigs, UI,
//! logs) can follow the agent through [`Blackboard::current_state`].
//!
//! [`Blackboard::current_state`]: super::enemy::Blackboard::current_state

use glam::{Quat, Vec3};
use rand::seq::SliceRandom;

use super::enemy::EnemyContext;
use super::fsm::State;
use super::graph::NodeId;
use super::navigation::Navigator;
use crate::core::GameEvent;

// ============================================================================
// Idle
// ============================================================================

/// Stands still until some target shows up
#[derive(Debug, Default)]
pub struct IdleState;

impl IdleState {
    pub const NAME: &'static str = "Idle";
}

impl<N: Navigator> State<EnemyContext<N>> for IdleState {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enter(&mut self, ctx: &mut EnemyContext<N>) {
        ctx.announce(Self::NAME);
        ctx.navigator.reset_path();
    }

    fn tick(&mut self, _ctx: &mut EnemyContext<N>) {}
}

// ============================================================================
// Roam
// ============================================================================

/// Walks patrol routes between graph nodes
#[derive(Debug, Default)]
pub struct RoamState {
    waypoints: Vec<Vec3>,
    index: usize,
    wait_timer: f32,
    retry_timer: f32,
}

impl RoamState {
    pub const NAME: &'static str = "Roam";

    /// Waypoints of the route being walked
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// Pick a goal node, biased toward the player when one is known
    fn choose_goal<N: Navigator>(ctx: &mut EnemyContext<N>, start: NodeId) -> NodeId {
        let graph = &ctx.graph;
        let candidates = match ctx.player_position {
            Some(player) => {
                let near = graph.within_radius(player, ctx.roam.player_bias_radius);
                if near.is_empty() {
                    graph.nearest_n(player, ctx.roam.fallback_nearest)
                } else {
                    near
                }
            }
            None => graph.nodes().map(|node| node.id).collect(),
        };

        let others: Vec<NodeId> = candidates.iter().copied().filter(|&id| id != start).collect();
        let pool = if others.is_empty() { candidates } else { others };
        pool.choose(&mut ctx.rng).copied().unwrap_or(start)
    }

    /// Plan a new route from the node nearest the agent
    fn request_path<N: Navigator>(&mut self, ctx: &mut EnemyContext<N>) {
        self.waypoints.clear();
        self.index = 0;
        self.wait_timer = 0.0;

        let Some(start) = ctx.graph.nearest(ctx.navigator.position()) else {
            log::warn!("Roaming without patrol nodes");
            self.retry_timer = ctx.roam.path_retry_interval;
            return;
        };
        let goal = Self::choose_goal(ctx, start);

        match ctx.planner.find_path(&ctx.graph, start, goal) {
            Ok(path) => {
                log::debug!(
                    "Roaming {start} -> {goal} over {} nodes ({:.1} units)",
                    path.nodes.len(),
                    path.length
                );
                self.waypoints = path.waypoints;
                if let Some(&first) = self.waypoints.first() {
                    ctx.navigator.set_destination(first);
                }
            }
            Err(err) => {
                log::warn!("Roam path failed, retrying: {err}");
                ctx.navigator.reset_path();
                self.retry_timer = ctx.roam.path_retry_interval;
            }
        }
    }
}

impl<N: Navigator> State<EnemyContext<N>> for RoamState {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enter(&mut self, ctx: &mut EnemyContext<N>) {
        ctx.announce(Self::NAME);
        self.request_path(ctx);
    }

    fn tick(&mut self, ctx: &mut EnemyContext<N>) {
        if self.waypoints.is_empty() {
            self.retry_timer -= ctx.delta_time;
            if self.retry_timer <= 0.0 {
                self.request_path(ctx);
            }
            return;
        }

        let arrived = !ctx.navigator.path_pending()
            && ctx.navigator.remaining_distance() <= ctx.roam.arrive_threshold;
        if !arrived {
            return;
        }

        if self.index + 1 < self.waypoints.len() {
            self.index += 1;
            ctx.navigator.set_destination(self.waypoints[self.index]);
            return;
        }

        // End of route
        self.wait_timer += ctx.delta_time;
        if self.wait_timer >= ctx.stats.roam_wait_time {
            self.request_path(ctx);
        }
    }

    fn exit(&mut self, ctx: &mut EnemyContext<N>) {
        ctx.navigator.reset_path();
        self.waypoints.clear();
    }
}

// ============================================================================
// Chase Player
// ============================================================================

/// Runs at the player while they stay in sight
#[derive(Debug, Default)]
pub struct ChasePlayerState;

impl ChasePlayerState {
    pub const NAME: &'static str = "Chase Player";
}

impl<N: Navigator> State<EnemyContext<N>> for ChasePlayerState {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enter(&mut self, ctx: &mut EnemyContext<N>) {
        ctx.announce(Self::NAME);
        ctx.blackboard.lost_player = false;
        ctx.navigator.set_speed(ctx.stats.chase_speed);
    }

    fn tick(&mut self, ctx: &mut EnemyContext<N>) {
        if let Some(target) = ctx.blackboard.player_target {
            ctx.navigator.set_destination(target.position);
        }
    }

    fn exit(&mut self, ctx: &mut EnemyContext<N>) {
        ctx.blackboard.lost_player = true;
        ctx.navigator.set_speed(ctx.stats.walk_speed);
    }
}

// ============================================================================
// Investigation (Chase Sound, Last Known Position)
// ============================================================================

/// Arrive at a point, then linger before giving up on it
#[derive(Debug, Default)]
struct Investigation {
    timer: f32,
    point: Option<Vec3>,
}

impl Investigation {
    fn reset(&mut self) {
        self.timer = 0.0;
        self.point = None;
    }

    /// Returns `true` once the agent has waited long enough at `point`.
    /// A new point restarts the wait.
    fn tick<N: Navigator>(&mut self, ctx: &mut EnemyContext<N>, point: Vec3) -> bool {
        if self.point != Some(point) {
            self.point = Some(point);
            self.timer = 0.0;
        }
        ctx.navigator.set_destination(point);
        if ctx.navigator.position().distance(point) >= ctx.stats.arrival_radius {
            return false;
        }

        self.timer += ctx.delta_time;
        if self.timer >= ctx.stats.after_chase_wait_time {
            self.reset();
            return true;
        }
        false
    }
}

/// Investigates the most recent sound heard
#[derive(Debug, Default)]
pub struct ChaseSoundState {
    investigation: Investigation,
}

impl ChaseSoundState {
    pub const NAME: &'static str = "Chase Sound";
}

impl<N: Navigator> State<EnemyContext<N>> for ChaseSoundState {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enter(&mut self, ctx: &mut EnemyContext<N>) {
        ctx.announce(Self::NAME);
        self.investigation.reset();
        ctx.navigator.set_speed(ctx.stats.chase_speed);
    }

    fn tick(&mut self, ctx: &mut EnemyContext<N>) {
        let Some(sound) = ctx.blackboard.sound_target else {
            return;
        };
        if self.investigation.tick(ctx, sound) {
            log::debug!("Nothing found at sound {sound}");
            ctx.blackboard.sound_target = None;
        }
    }

    fn exit(&mut self, ctx: &mut EnemyContext<N>) {
        ctx.navigator.set_speed(ctx.stats.walk_speed);
    }
}

/// Searches where the player was last seen
#[derive(Debug, Default)]
pub struct LastKnownPositionState {
    investigation: Investigation,
}

impl LastKnownPositionState {
    pub const NAME: &'static str = "Last Known Position";
}

impl<N: Navigator> State<EnemyContext<N>> for LastKnownPositionState {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enter(&mut self, ctx: &mut EnemyContext<N>) {
        ctx.announce(Self::NAME);
        self.investigation.reset();
    }

    fn tick(&mut self, ctx: &mut EnemyContext<N>) {
        let Some(last_known) = ctx.blackboard.last_known_player_position else {
            return;
        };
        if self.investigation.tick(ctx, last_known) {
            log::debug!("Player not found at {last_known}");
            ctx.blackboard.last_known_player_position = None;
            ctx.blackboard.lost_player = false;
        }
    }
}

// ============================================================================
// Scream
// ============================================================================

/// Stops, turns to the player and screams; consumes the scream cooldown
#[derive(Debug, Default)]
pub struct ScreamState {
    timer: f32,
    finished: bool,
}

impl ScreamState {
    pub const NAME: &'static str = "Scream";
}

impl<N: Navigator> State<EnemyContext<N>> for ScreamState {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enter(&mut self, ctx: &mut EnemyContext<N>) {
        ctx.announce(Self::NAME);
        self.timer = 0.0;
        self.finished = false;
        ctx.navigator.reset_path();

        let position = ctx.navigator.position();
        log::info!("Enemy {:?} screams at {position}", ctx.agent);
        ctx.outbox.push(GameEvent::ScreamAlert {
            agent: ctx.agent,
            position,
            radius: ctx.stats.scream_radius,
        });
    }

    fn tick(&mut self, ctx: &mut EnemyContext<N>) {
        if let Some(target) = ctx.blackboard.player_target {
            let to_player = target.position - ctx.navigator.position();
            let flat = Vec3::new(to_player.x, 0.0, to_player.z);
            if flat.length_squared() > 1e-6 {
                let look = Quat::from_rotation_arc(Vec3::NEG_Z, flat.normalize());
                let t = (ctx.delta_time * ctx.stats.turn_speed).min(1.0);
                let rotation = ctx.navigator.rotation().slerp(look, t);
                ctx.navigator.set_rotation(rotation);
            }
        }

        if self.finished {
            return;
        }
        self.timer += ctx.delta_time;
        if self.timer >= ctx.stats.scream_duration {
            self.finished = true;
            ctx.blackboard.scream_cooldown_elapsed = 0.0;
        }
    }
}
