//! Entity Component System module
//!
//! Built on top of the hecs ECS library

mod components;
mod world;

pub use components::{Name, PatrolMarker, PlayerMarker, Transform, Visible};
pub use world::World;
