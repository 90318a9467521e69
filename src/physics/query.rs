//! Spatial query capability used by perception and graph building
//!
//! The AI never talks to rapier directly. It asks a [`SpatialQuery`] whether a
//! line is blocked, where the ground is below a point, or whether a sphere
//! overlaps an obstacle. [`Physics`](super::Physics) answers with real
//! colliders; [`OpenSpace`] answers "nothing is ever in the way".

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Bit mask selecting collision layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// No layers
    pub const NONE: Self = Self(0);
    /// Level geometry that blocks sight and movement
    pub const OBSTACLE: Self = Self(1 << 0);
    /// The player body
    pub const PLAYER: Self = Self(1 << 1);
    /// Walkable ground
    pub const GROUND: Self = Self(1 << 2);
    /// Every layer
    pub const ALL: Self = Self(u32::MAX);

    /// Combine two masks
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check if any layer is shared with `other`
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::OBSTACLE
    }
}

/// World queries the AI core depends on.
pub trait SpatialQuery {
    /// Returns `true` when something on `mask` lies on the segment `from -> to`.
    fn is_blocked(&self, from: Vec3, to: Vec3, mask: LayerMask) -> bool;

    /// Cast straight down from `origin` and return the hit point, if any.
    fn ground_below(&self, _origin: Vec3, _max_distance: f32) -> Option<Vec3> {
        None
    }

    /// Returns `true` when a sphere at `center` overlaps anything on `mask`.
    fn sphere_blocked(&self, _center: Vec3, _radius: f32, _mask: LayerMask) -> bool {
        false
    }
}

/// A world without obstacles or ground.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSpace;

impl SpatialQuery for OpenSpace {
    fn is_blocked(&self, _from: Vec3, _to: Vec3, _mask: LayerMask) -> bool {
        false
    }
}

impl<T: SpatialQuery + ?Sized> SpatialQuery for &T {
    fn is_blocked(&self, from: Vec3, to: Vec3, mask: LayerMask) -> bool {
        (**self).is_blocked(from, to, mask)
    }

    fn ground_below(&self, origin: Vec3, max_distance: f32) -> Option<Vec3> {
        (**self).ground_below(origin, max_distance)
    }

    fn sphere_blocked(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool {
        (**self).sphere_blocked(center, radius, mask)
    }
}
