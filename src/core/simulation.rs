//! Fixed-order simulation loop
//!
//! One [`Simulation::step`] per frame:
//!
//! 1. Swap the event buffers (last frame's sounds become audible)
//! 2. Gather sight targets and the player position from the world
//! 3. Tick every enemy (perception, then its state machine)
//! 4. Integrate enemy movement and write it back to the world

use std::sync::Arc;

use glam::Vec3;
use hecs::Entity;

use super::config::{AiConfig, ConfigError};
use super::events::EventQueue;
use crate::ai::{
    BuildReport, Enemy, PatrolGraph, PatrolGraphBuilder, SoundStrength, SteeringAgent, spawn_grid,
};
use crate::ecs::{Name, Transform, World};
use crate::physics::Physics;

/// A level: world, static collision, patrol graph and the enemies in it
pub struct Simulation {
    /// Entities of the level
    pub world: World,
    /// Static collision used for sight and graph building
    pub physics: Physics,
    /// Sounds and notifications
    pub events: EventQueue,
    config: AiConfig,
    graph: Arc<PatrolGraph>,
    report: BuildReport,
    enemies: Vec<Enemy<SteeringAgent>>,
    elapsed: f32,
    frame: u64,
}

impl Simulation {
    /// Build the patrol graph and get ready to spawn enemies.
    ///
    /// Patrol points tagged in `world` are used when present; otherwise a
    /// grid is generated over the configured arena.
    pub fn new(config: AiConfig, mut physics: Physics, world: World) -> Self {
        if physics.needs_sync() {
            physics.sync();
        }

        let mut graph = PatrolGraph::from_world(&world);
        if graph.is_empty() {
            let points = spawn_grid(&config.spawner, &physics);
            log::debug!("Generated {} patrol points", points.len());
            graph = PatrolGraph::from_positions(points);
        }
        let report = PatrolGraphBuilder::new(config.graph.clone()).build(&mut graph, &physics);

        Self {
            world,
            physics,
            events: EventQueue::new(),
            config,
            graph: Arc::new(graph),
            report,
            enemies: Vec::new(),
            elapsed: 0.0,
            frame: 0,
        }
    }

    /// Spawn an enemy standing at `position`
    ///
    /// # Errors
    ///
    /// Returns an error if the configured stats are invalid.
    pub fn spawn_enemy(&mut self, position: Vec3) -> Result<Entity, ConfigError> {
        let name = format!("Enemy {}", self.enemies.len());
        let entity = self
            .world
            .spawn((Transform::from_position(position), Name::new(name)));
        let enemy = Enemy::new(
            entity,
            SteeringAgent::new(position),
            Arc::clone(&self.graph),
            &self.config,
        )?;
        self.enemies.push(enemy);
        Ok(entity)
    }

    /// Broadcast a sound, audible from the next step on
    pub fn emit_sound(&mut self, position: Vec3, strength: SoundStrength) {
        self.events.emit_sound(position, strength);
    }

    /// Advance the level by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        self.events.swap();

        let targets = self.world.sight_targets(self.config.vision.target_mask);
        let player = self.world.player_position();

        for enemy in &mut self.enemies {
            enemy.tick(dt, &targets, player, &mut self.events, &self.physics);

            let navigator = enemy.navigator_mut();
            navigator.update(dt);
            let (position, rotation) = (navigator.position, navigator.rotation);

            if let Ok(mut transform) = self.world.get_mut::<Transform>(enemy.entity()) {
                transform.position = position;
                transform.rotation = rotation;
            }
        }

        self.elapsed += dt;
        self.frame += 1;
    }

    /// Run `steps` frames of `dt` seconds
    pub fn run(&mut self, steps: u32, dt: f32) {
        for _ in 0..steps {
            self.step(dt);
        }
    }

    #[must_use]
    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    #[must_use]
    pub fn graph(&self) -> &PatrolGraph {
        &self.graph
    }

    /// Summary of the patrol graph build
    #[must_use]
    pub fn build_report(&self) -> &BuildReport {
        &self.report
    }

    #[must_use]
    pub fn enemies(&self) -> &[Enemy<SteeringAgent>] {
        &self.enemies
    }

    /// Seconds simulated so far
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Number of steps taken
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}
