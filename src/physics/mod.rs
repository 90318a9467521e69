//! Physics module
//!
//! Static level collision built on top of rapier3d, exposed to the AI through
//! the [`SpatialQuery`] capability.

mod query;
mod world;

pub use query::{LayerMask, OpenSpace, SpatialQuery};
pub use world::{ColliderHandle, Physics, RaycastHit, RigidBodyHandle};
