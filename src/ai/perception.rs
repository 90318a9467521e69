//! Vision and hearing
//!
//! These are the only writers of the agent's target fields. Both run before
//! the state machine in the same tick, so guards always see fresh values.

use std::fmt;

use glam::Vec3;
use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::enemy::{Blackboard, PlayerTarget};
use crate::physics::{LayerMask, SpatialQuery};

// ============================================================================
// Hearing
// ============================================================================

/// How far a sound carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SoundStrength {
    Faint = 1,
    Quiet = 2,
    Normal = 3,
    Loud = 4,
    VeryLoud = 5,
}

impl SoundStrength {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Faint => "Faint",
            Self::Quiet => "Quiet",
            Self::Normal => "Normal",
            Self::Loud => "Loud",
            Self::VeryLoud => "Very Loud",
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::Faint,
            Self::Quiet,
            Self::Normal,
            Self::Loud,
            Self::VeryLoud,
        ]
    }
}

impl fmt::Display for SoundStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hearing radius per sound strength
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HearingConfig {
    pub faint: f32,
    pub quiet: f32,
    pub normal: f32,
    pub loud: f32,
    pub very_loud: f32,
}

impl HearingConfig {
    #[must_use]
    pub fn radius(&self, strength: SoundStrength) -> f32 {
        match strength {
            SoundStrength::Faint => self.faint,
            SoundStrength::Quiet => self.quiet,
            SoundStrength::Normal => self.normal,
            SoundStrength::Loud => self.loud,
            SoundStrength::VeryLoud => self.very_loud,
        }
    }
}

impl Default for HearingConfig {
    fn default() -> Self {
        Self {
            faint: 4.0,
            quiet: 6.0,
            normal: 8.0,
            loud: 10.0,
            very_loud: 12.0,
        }
    }
}

/// Turns broadcast sounds into a sound target
#[derive(Debug, Clone, Default)]
pub struct Hearing {
    config: HearingConfig,
}

impl Hearing {
    #[must_use]
    pub fn new(config: HearingConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &HearingConfig {
        &self.config
    }

    /// React to one sound. Returns `true` when it was within range.
    pub fn hear(
        &self,
        listener: Vec3,
        position: Vec3,
        strength: SoundStrength,
        blackboard: &mut Blackboard,
    ) -> bool {
        if listener.distance(position) > self.config.radius(strength) {
            return false;
        }
        log::debug!("Heard a {strength} sound at {position}");
        blackboard.sound_target = Some(position);
        true
    }

    /// React to every sound of the previous frame; the last one in range wins.
    pub fn process(
        &self,
        listener: Vec3,
        sounds: impl IntoIterator<Item = (Vec3, SoundStrength)>,
        blackboard: &mut Blackboard,
    ) {
        for (position, strength) in sounds {
            self.hear(listener, position, strength, blackboard);
        }
    }
}

// ============================================================================
// Vision
// ============================================================================

/// Something vision can lock on to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SightTarget {
    pub entity: Entity,
    pub position: Vec3,
}

/// View cone settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// How far the agent can see
    pub radius: f32,
    /// Full cone angle in degrees
    pub angle: f32,
    /// Seconds between cone checks
    pub poll_interval: f32,
    /// Height of the eyes above the agent's feet
    pub eye_height: f32,
    /// Layers that can be seen
    pub target_mask: LayerMask,
    /// Layers that block sight
    pub obstacle_mask: LayerMask,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            radius: 15.0,
            angle: 110.0,
            poll_interval: 0.1,
            eye_height: 1.6,
            target_mask: LayerMask::PLAYER,
            obstacle_mask: LayerMask::OBSTACLE,
        }
    }
}

/// Periodic cone-and-raycast check feeding the player target
#[derive(Debug, Clone, Default)]
pub struct FieldOfView {
    config: VisionConfig,
    poll_timer: f32,
    visible: Option<Entity>,
    had_visible: bool,
}

impl FieldOfView {
    #[must_use]
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// Entity locked on by the last poll
    #[must_use]
    pub fn visible(&self) -> Option<Entity> {
        self.visible
    }

    /// Whether `target` is inside the cone and unobstructed
    #[must_use]
    pub fn can_see(
        &self,
        origin: Vec3,
        forward: Vec3,
        target: Vec3,
        space: &impl SpatialQuery,
    ) -> bool {
        let offset = target - origin;
        let distance = offset.length();
        if distance > self.config.radius {
            return false;
        }
        if distance > f32::EPSILON {
            let half_angle = self.config.angle.to_radians() / 2.0;
            if forward.angle_between(offset / distance) >= half_angle {
                return false;
            }
        }

        let eye = Vec3::Y * self.config.eye_height;
        !space.is_blocked(origin + eye, target + eye, self.config.obstacle_mask)
    }

    /// Closest visible target
    fn poll(
        &self,
        origin: Vec3,
        forward: Vec3,
        targets: &[SightTarget],
        space: &impl SpatialQuery,
    ) -> Option<Entity> {
        targets
            .iter()
            .filter(|target| self.can_see(origin, forward, target.position, space))
            .min_by(|a, b| {
                a.position
                    .distance_squared(origin)
                    .total_cmp(&b.position.distance_squared(origin))
            })
            .map(|target| target.entity)
    }

    /// Run one tick of vision and write the result to the blackboard.
    ///
    /// The cone check only runs every `poll_interval`; in between, the locked
    /// target's position is refreshed from `targets` so pursuit stays live.
    pub fn update(
        &mut self,
        dt: f32,
        origin: Vec3,
        forward: Vec3,
        targets: &[SightTarget],
        space: &impl SpatialQuery,
        blackboard: &mut Blackboard,
    ) {
        self.poll_timer += dt;
        if self.poll_timer >= self.config.poll_interval {
            self.poll_timer = 0.0;
            self.visible = self.poll(origin, forward, targets, space);
        }

        let current = self
            .visible
            .and_then(|entity| targets.iter().find(|target| target.entity == entity))
            .map(|target| PlayerTarget {
                entity: target.entity,
                position: target.position,
            });
        if current.is_none() {
            self.visible = None;
        }

        if self.had_visible && current.is_none() {
            if let Some(last) = blackboard.player_target {
                log::debug!("Lost sight of player at {}", last.position);
                blackboard.last_known_player_position = Some(last.position);
                blackboard.lost_player = true;
            }
        }

        blackboard.player_target = current;
        self.had_visible = current.is_some();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::OpenSpace;

    struct Blocked;

    impl SpatialQuery for Blocked {
        fn is_blocked(&self, _from: Vec3, _to: Vec3, _mask: LayerMask) -> bool {
            true
        }
    }

    fn entity() -> Entity {
        hecs::World::new().spawn(())
    }

    fn instant_vision() -> FieldOfView {
        FieldOfView::new(VisionConfig {
            poll_interval: 0.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_hearing_radius_per_strength() {
        let hearing = Hearing::default();
        let mut board = Blackboard::default();
        let sound = Vec3::new(9.0, 0.0, 0.0);

        assert!(!hearing.hear(Vec3::ZERO, sound, SoundStrength::Normal, &mut board));
        assert!(board.sound_target.is_none());

        assert!(hearing.hear(Vec3::ZERO, sound, SoundStrength::Loud, &mut board));
        assert_eq!(board.sound_target, Some(sound));
    }

    #[test]
    fn test_hearing_radius_grows_with_strength() {
        let config = HearingConfig::default();
        let radii: Vec<f32> = SoundStrength::all().iter().map(|&s| config.radius(s)).collect();
        assert!(radii.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(SoundStrength::VeryLoud.to_string(), "Very Loud");
    }

    #[test]
    fn test_vision_cone() {
        let vision = instant_vision();
        let forward = Vec3::NEG_Z;

        assert!(vision.can_see(Vec3::ZERO, forward, Vec3::new(0.0, 0.0, -10.0), &OpenSpace));
        // Behind
        assert!(!vision.can_see(Vec3::ZERO, forward, Vec3::new(0.0, 0.0, 10.0), &OpenSpace));
        // Too far
        assert!(!vision.can_see(Vec3::ZERO, forward, Vec3::new(0.0, 0.0, -20.0), &OpenSpace));
        // Obstructed
        assert!(!vision.can_see(Vec3::ZERO, forward, Vec3::new(0.0, 0.0, -10.0), &Blocked));
    }

    #[test]
    fn test_vision_sets_and_loses_target() {
        let mut vision = instant_vision();
        let mut board = Blackboard::default();
        let player = entity();
        let seen = [SightTarget {
            entity: player,
            position: Vec3::new(0.0, 0.0, -5.0),
        }];

        vision.update(0.016, Vec3::ZERO, Vec3::NEG_Z, &seen, &OpenSpace, &mut board);
        assert_eq!(board.player_target.map(|t| t.entity), Some(player));
        assert!(!board.lost_player);

        vision.update(0.016, Vec3::ZERO, Vec3::NEG_Z, &seen, &Blocked, &mut board);
        assert!(board.player_target.is_none());
        assert!(board.lost_player);
        assert_eq!(board.last_known_player_position, Some(Vec3::new(0.0, 0.0, -5.0)));
    }

    #[test]
    fn test_vision_tracks_between_polls() {
        let mut vision = FieldOfView::new(VisionConfig {
            poll_interval: 0.1,
            ..Default::default()
        });
        let mut board = Blackboard::default();
        let player = entity();

        let mut targets = [SightTarget {
            entity: player,
            position: Vec3::new(0.0, 0.0, -5.0),
        }];

        // First poll happens once the interval elapses
        vision.update(0.05, Vec3::ZERO, Vec3::NEG_Z, &targets, &OpenSpace, &mut board);
        assert!(board.player_target.is_none());
        vision.update(0.05, Vec3::ZERO, Vec3::NEG_Z, &targets, &OpenSpace, &mut board);
        assert!(board.player_target.is_some());

        // Player moves; position follows without a new poll
        targets[0].position = Vec3::new(1.0, 0.0, -6.0);
        vision.update(0.01, Vec3::ZERO, Vec3::NEG_Z, &targets, &Blocked, &mut board);
        assert_eq!(
            board.player_target.map(|t| t.position),
            Some(Vec3::new(1.0, 0.0, -6.0))
        );
    }

    #[test]
    fn test_vision_picks_closest() {
        let vision = instant_vision();
        let near = entity();
        let far = entity();
        let targets = [
            SightTarget {
                entity: far,
                position: Vec3::new(0.0, 0.0, -12.0),
            },
            SightTarget {
                entity: near,
                position: Vec3::new(0.0, 0.0, -3.0),
            },
        ];

        assert_eq!(
            vision.poll(Vec3::ZERO, Vec3::NEG_Z, &targets, &OpenSpace),
            Some(near)
        );
    }
}
