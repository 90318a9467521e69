//! Look-at rig weight driven by the agent's current state name

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookAtConfig {
    /// Blend speed toward the target weight
    pub speed: f32,
    pub min_weight: f32,
    pub max_weight: f32,
    /// State names that make the head track the player
    pub active_states: Vec<String>,
}

impl Default for LookAtConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            min_weight: 0.5,
            max_weight: 1.0,
            active_states: vec![
                "Chase Player".to_owned(),
                "Scream".to_owned(),
                "Last Known Position".to_owned(),
            ],
        }
    }
}

/// Smoothed head-tracking weight
#[derive(Debug, Clone, Default)]
pub struct LookAtDriver {
    config: LookAtConfig,
    weight: f32,
    target: f32,
    active: bool,
}

impl LookAtDriver {
    #[must_use]
    pub fn new(config: LookAtConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Current blended weight in `[0, max_weight]`
    #[must_use]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Weight the driver is blending toward
    #[must_use]
    pub fn target(&self) -> f32 {
        self.target
    }

    fn is_active_state(&self, state: &str) -> bool {
        !state.is_empty() && self.config.active_states.iter().any(|s| s == state)
    }

    pub fn update(&mut self, dt: f32, state: &str, rng: &mut impl Rng) {
        let active = self.is_active_state(state);
        if active && !self.active {
            let (low, high) = (self.config.min_weight, self.config.max_weight);
            self.target = if high > low {
                rng.gen_range(low..=high)
            } else {
                low
            };
        } else if !active {
            self.target = 0.0;
        }
        self.active = active;

        let t = (dt * self.config.speed).min(1.0);
        self.weight += (self.target - self.weight) * t;
    }
}
