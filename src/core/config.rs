//! AI configuration
//!
//! One serde document holds every tunable of the enemy AI. Missing fields
//! fall back to their defaults, so a config file only lists what it changes.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{
    CostMetric, EnemyStats, GraphBuilderConfig, HearingConfig, LookAtConfig, RoamConfig,
    SpawnerConfig, VisionConfig,
};

/// Errors that can occur while loading, saving or validating a config
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("RON error: {0}")]
    Ron(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything an enemy (and the level it patrols) can be tuned with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub stats: EnemyStats,
    pub graph: GraphBuilderConfig,
    pub spawner: SpawnerConfig,
    pub vision: VisionConfig,
    pub hearing: HearingConfig,
    pub roam: RoamConfig,
    pub look_at: LookAtConfig,
    /// Cost used for both path costs and the A* heuristic
    pub metric: CostMetric,
    /// Base seed for the per-agent RNG
    pub seed: u64,
}

impl AiConfig {
    #[must_use]
    pub fn with_stats(mut self, stats: EnemyStats) -> Self {
        self.stats = stats;
        self
    }

    #[must_use]
    pub fn with_vision(mut self, vision: VisionConfig) -> Self {
        self.vision = vision;
        self
    }

    #[must_use]
    pub fn with_hearing(mut self, hearing: HearingConfig) -> Self {
        self.hearing = hearing;
        self
    }

    #[must_use]
    pub fn with_roam(mut self, roam: RoamConfig) -> Self {
        self.roam = roam;
        self
    }

    /// Patrol grid centred on `center` covering `extent`
    #[must_use]
    pub fn with_arena(mut self, center: Vec3, extent: Vec3) -> Self {
        self.spawner.center = center;
        self.spawner.extent = extent;
        self
    }

    #[must_use]
    pub fn with_metric(mut self, metric: CostMetric) -> Self {
        self.metric = metric;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Parse a RON document
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::Ron(e.to_string()))
    }

    /// Load config from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if file reading or parsing fails.
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config = Self::from_ron_str(&content)?;
        log::info!("Loaded AI config from {}", path.display());
        Ok(config)
    }

    /// Save config to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Ron(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Load config from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if file reading or parsing fails.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Json(e.to_string()))?;
        log::info!("Loaded AI config from {}", path.display());
        Ok(config)
    }

    /// Save config to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json_string =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Json(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = AiConfig::from_ron_str(
            "(stats: (chase_speed: 7.5, scream_enabled: false), seed: 9, metric: Squared)",
        )
        .unwrap();

        assert_eq!(config.stats.chase_speed, 7.5);
        assert!(!config.stats.scream_enabled);
        assert_eq!(config.stats.walk_speed, EnemyStats::default().walk_speed);
        assert_eq!(config.metric, CostMetric::Squared);
        assert_eq!(config.seed, 9);
        assert_eq!(config.hearing, HearingConfig::default());
    }

    #[test]
    fn test_config_ron_roundtrip() {
        let config = AiConfig::default()
            .with_seed(42)
            .with_arena(Vec3::new(1.0, 0.0, 2.0), Vec3::new(20.0, 0.0, 30.0));

        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let loaded = AiConfig::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = AiConfig::default().with_metric(CostMetric::Squared);

        let json_str = serde_json::to_string(&config).unwrap();
        let loaded: AiConfig = serde_json::from_str(&json_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_bad_input_reports_error() {
        assert!(matches!(
            AiConfig::from_ron_str("(stats: 3)"),
            Err(ConfigError::Ron(_))
        ));
        assert!(matches!(
            AiConfig::load_ron("/definitely/not/here.ron"),
            Err(ConfigError::Io(_))
        ));
    }
}
