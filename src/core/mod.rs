//! Core module
//!
//! Configuration, the event queue and the simulation loop

mod config;
mod events;
mod simulation;

pub use config::{AiConfig, ConfigError};
pub use events::{EventQueue, GameEvent};
pub use simulation::Simulation;
