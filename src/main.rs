//! Headless demo: two enemies patrolling a walled arena while the player
//! circles the pillar in the middle and makes some noise.
//!
//! Usage: `stalker [config.ron|config.json]`, verbosity through `RUST_LOG`.

use std::path::Path;

use stalker::prelude::*;

const ARENA_HALF: f32 = 20.0;
const FRAME_TIME: f32 = 1.0 / 30.0;
const DURATION: f32 = 40.0;

fn load_config() -> Result<AiConfig, ConfigError> {
    let Some(arg) = std::env::args().nth(1) else {
        return Ok(AiConfig::default().with_arena(Vec3::ZERO, Vec3::new(36.0, 0.0, 36.0)));
    };
    let path = Path::new(&arg);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => AiConfig::load_json(path),
        _ => AiConfig::load_ron(path),
    }
}

/// Ground, four perimeter walls and a pillar
fn build_arena() -> Physics {
    let mut physics = Physics::new();
    physics.add_ground(0.0, ARENA_HALF + 1.0);

    let wall_height = 2.0;
    let thickness = 0.5;
    for (center, half) in [
        (Vec3::new(0.0, wall_height, -ARENA_HALF), Vec3::new(ARENA_HALF, wall_height, thickness)),
        (Vec3::new(0.0, wall_height, ARENA_HALF), Vec3::new(ARENA_HALF, wall_height, thickness)),
        (Vec3::new(-ARENA_HALF, wall_height, 0.0), Vec3::new(thickness, wall_height, ARENA_HALF)),
        (Vec3::new(ARENA_HALF, wall_height, 0.0), Vec3::new(thickness, wall_height, ARENA_HALF)),
    ] {
        physics.add_obstacle(center, half);
    }
    physics.add_obstacle(Vec3::new(0.0, wall_height, 0.0), Vec3::new(3.0, wall_height, 3.0));

    physics
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = load_config()?;
    let mut world = World::new();
    let player = world.spawn_player(Vec3::new(10.0, 0.0, 0.0));

    let mut sim = Simulation::new(config, build_arena(), world);
    let report = sim.build_report();
    log::info!(
        "Arena ready: {} patrol nodes, {} links, {} isolated",
        report.nodes,
        report.edges,
        report.isolated.len()
    );

    sim.spawn_enemy(Vec3::new(-15.0, 0.0, -15.0))?;
    sim.spawn_enemy(Vec3::new(15.0, 0.0, 15.0))?;

    let steps = (DURATION / FRAME_TIME) as u32;
    for step in 0..steps {
        let t = step as f32 * FRAME_TIME;

        // Player circles the pillar
        let angle = t * 0.25;
        let position = Vec3::new(angle.cos() * 10.0, 0.0, angle.sin() * 10.0);
        sim.world.set_position(player, position)?;

        // Knock something over every ten seconds
        if step > 0 && step % 300 == 0 {
            log::info!("Player made a loud noise at {position}");
            sim.emit_sound(position, SoundStrength::Loud);
        }

        sim.step(FRAME_TIME);

        for event in sim.events.iter() {
            match event {
                GameEvent::StateChanged { agent, state } => {
                    log::info!("[{:>5.1}s] {agent:?} -> {state}", sim.elapsed());
                }
                GameEvent::ScreamAlert { position, radius, .. } => {
                    log::info!("[{:>5.1}s] Scream at {position} (radius {radius})", sim.elapsed());
                }
                _ => {}
            }
        }
    }

    for enemy in sim.enemies() {
        println!(
            "{:?}: {} at {}, look weight {:.2}",
            enemy.entity(),
            enemy.state_name(),
            enemy.navigator().position(),
            enemy.look_weight()
        );
    }

    Ok(())
}
