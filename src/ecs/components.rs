//! Components the AI reads from the world

use glam::{Quat, Vec3};

use crate::physics::LayerMask;

/// Position and orientation of an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,
    /// Rotation as a quaternion
    pub rotation: Quat,
}

impl Transform {
    /// Create a transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Get the forward direction (negative Z in local space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Translate by a delta
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Tag: this entity is a patrol point
#[derive(Debug, Clone, Copy, Default)]
pub struct PatrolMarker;

/// Tag: this entity is the player
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerMarker;

/// Makes an entity detectable by vision on the given layer
#[derive(Debug, Clone, Copy)]
pub struct Visible {
    pub layer: LayerMask,
}

impl Default for Visible {
    fn default() -> Self {
        Self {
            layer: LayerMask::PLAYER,
        }
    }
}
