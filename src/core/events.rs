//! Event Queue for Perception and Observability
//!
//! Sounds are broadcast through a double-buffered queue: anything emitted
//! during tick N is heard during tick N+1, after the swap. The same queue
//! carries what agents report outward (state changes, scream alerts) to
//! animation and audio consumers.
//!
//! # Example
//!
//! ```ignore
//! // Gameplay: a door slams
//! events.emit_sound(door_position, SoundStrength::Loud);
//!
//! // Next tick, after swap: every enemy's hearing reads it
//! events.swap();
//! for (position, strength) in events.sounds() {
//!     hearing.hear(listener, position, strength, &mut blackboard);
//! }
//! ```

use std::collections::VecDeque;

use glam::Vec3;
use hecs::Entity;

use crate::ai::SoundStrength;

// ============================================================================
// Event Types
// ============================================================================

/// Events exchanged between the AI core and its collaborators.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GameEvent {
    /// A sound was made somewhere in the world.
    SoundEmitted {
        /// World-space origin of the sound
        position: Vec3,
        /// How far the sound carries
        strength: SoundStrength,
    },

    /// An agent entered a new behaviour state.
    StateChanged {
        /// The agent that changed state
        agent: Entity,
        /// Display name of the new state
        state: &'static str,
    },

    /// An agent screamed; effects and alerts radiate from `position`.
    ScreamAlert {
        /// The screaming agent
        agent: Entity,
        /// Origin of the alert wave
        position: Vec3,
        /// Radius of the alert wave
        radius: f32,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue for frame-consistent event processing.
///
/// Events pushed during frame N are available for reading during frame N+1.
/// Perception therefore never depends on the order producers ran in.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this frame
    pending: VecDeque<GameEvent>,
    /// Events from previous frame, ready for processing
    processing: VecDeque<GameEvent>,
}

impl EventQueue {
    const DEFAULT_CAPACITY: usize = 64;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: VecDeque::with_capacity(Self::DEFAULT_CAPACITY),
            processing: VecDeque::with_capacity(Self::DEFAULT_CAPACITY),
        }
    }

    /// Push an event to be processed next frame.
    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    /// Broadcast a sound to every listener (heard next frame).
    pub fn emit_sound(&mut self, position: Vec3, strength: SoundStrength) {
        self.push(GameEvent::SoundEmitted { position, strength });
    }

    /// Swap the pending and processing queues.
    ///
    /// Call this once per frame, before any perception runs.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over events from the previous frame.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.processing.iter()
    }

    /// Sounds emitted during the previous frame.
    pub fn sounds(&self) -> impl Iterator<Item = (Vec3, SoundStrength)> + '_ {
        self.processing.iter().filter_map(|event| match event {
            GameEvent::SoundEmitted { position, strength } => Some((*position, *strength)),
            _ => None,
        })
    }

    /// Check if there are any events to process.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Get the number of events ready for processing.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Get the number of events pending for next frame.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Clear all events (both pending and processing).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<GameEvent> for EventQueue {
    fn extend<I: IntoIterator<Item = GameEvent>>(&mut self, iter: I) {
        self.pending.extend(iter);
    }
}

// ============================================================================
// Tests
// ============================================================================
