// src/config.rs - Tunable thresholds for the action rules and hysteresis
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::action::Action;
use crate::error::ConfigError;

/// Everything the classifier can be tuned with. The defaults are calibration
/// values, not physical constants; load a JSON file to override any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Frames kept per track (W).
    pub history_capacity: usize,
    pub crouch: CrouchConfig,
    pub mountain_climber: MountainClimberConfig,
    pub run: RunConfig,
    pub jump: JumpConfig,
    pub holds: HoldConfig,
    /// Per-tick processing budget, used only for the overrun warning.
    pub frame_budget_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrouchConfig {
    pub knee_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountainClimberConfig {
    /// Straight arms: both elbows above this.
    pub elbow_min: f64,
    /// Hunched forward: both shoulders below this.
    pub shoulder_max: f64,
    /// Below this many buffered frames the pose alone is enough.
    pub grace_frames: usize,
    pub hip_window: usize,
    pub hip_asymmetry_min: f64,
    pub hip_range_min: f64,
    pub hip_trend_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub knee_diff_min: f64,
    pub elbow_delta_min: f64,
    /// Both knees under this is a squat, not a stride.
    pub deep_squat_knee_max: f64,
    /// At least one knee must be straighter than this.
    pub extended_knee_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    pub min_frames: usize,
    /// Upward hip travel as a fraction of the average torso size.
    pub rise_ratio_min: f64,
    /// (max - min) / avg torso size must stay under this.
    pub torso_variation_max: f64,
    pub deep_crouch_knee_max: f64,
    /// Average torso size below this is treated as a collapsed skeleton.
    pub min_torso_size: f64,
}

/// Frames a stable label is kept after its rule stops firing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldConfig {
    pub crouch: u32,
    pub mountain_climber: u32,
    pub run: u32,
    pub jump: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            history_capacity: 5,
            crouch: CrouchConfig::default(),
            mountain_climber: MountainClimberConfig::default(),
            run: RunConfig::default(),
            jump: JumpConfig::default(),
            holds: HoldConfig::default(),
            frame_budget_ms: 33.0,
        }
    }
}

impl Default for CrouchConfig {
    fn default() -> Self {
        Self { knee_max: 120.0 }
    }
}

impl Default for MountainClimberConfig {
    fn default() -> Self {
        Self {
            elbow_min: 160.0,
            shoulder_max: 115.0,
            grace_frames: 3,
            hip_window: 3,
            hip_asymmetry_min: 15.0,
            hip_range_min: 12.0,
            hip_trend_min: 8.0,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            knee_diff_min: 20.0,
            elbow_delta_min: 10.0,
            deep_squat_knee_max: 90.0,
            extended_knee_min: 130.0,
        }
    }
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            min_frames: 3,
            rise_ratio_min: 0.08,
            torso_variation_max: 0.15,
            deep_crouch_knee_max: 110.0,
            min_torso_size: 1e-3,
        }
    }
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            crouch: 8,
            mountain_climber: 2,
            run: 0,
            jump: 0,
        }
    }
}

impl HoldConfig {
    pub fn for_action(&self, action: Action) -> u32 {
        match action {
            Action::Crouch => self.crouch,
            Action::MountainClimber => self.mountain_climber,
            Action::Run => self.run,
            Action::Jump => self.jump,
            Action::Unknown => 0,
        }
    }
}

impl ClassifierConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::invalid_value("(serialization)", e.to_string()))?;
        std::fs::write(path, json).map_err(|source| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::invalid_value("history_capacity", "must be > 0"));
        }

        let angles = [
            ("crouch.knee_max", self.crouch.knee_max),
            ("mountain_climber.elbow_min", self.mountain_climber.elbow_min),
            ("mountain_climber.shoulder_max", self.mountain_climber.shoulder_max),
            ("mountain_climber.hip_asymmetry_min", self.mountain_climber.hip_asymmetry_min),
            ("mountain_climber.hip_range_min", self.mountain_climber.hip_range_min),
            ("mountain_climber.hip_trend_min", self.mountain_climber.hip_trend_min),
            ("run.knee_diff_min", self.run.knee_diff_min),
            ("run.elbow_delta_min", self.run.elbow_delta_min),
            ("run.deep_squat_knee_max", self.run.deep_squat_knee_max),
            ("run.extended_knee_min", self.run.extended_knee_min),
            ("jump.deep_crouch_knee_max", self.jump.deep_crouch_knee_max),
        ];
        for (field, value) in angles {
            if !value.is_finite() || !(0.0..=180.0).contains(&value) {
                return Err(ConfigError::invalid_value(
                    field,
                    format!("must be an angle in [0, 180], got {value}"),
                ));
            }
        }

        let ratios = [
            ("jump.rise_ratio_min", self.jump.rise_ratio_min),
            ("jump.torso_variation_max", self.jump.torso_variation_max),
            ("jump.min_torso_size", self.jump.min_torso_size),
            ("frame_budget_ms", self.frame_budget_ms),
        ];
        for (field, value) in ratios {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid_value(
                    field,
                    format!("must be finite and >= 0, got {value}"),
                ));
            }
        }

        if self.mountain_climber.hip_window < 2 {
            return Err(ConfigError::invalid_value(
                "mountain_climber.hip_window",
                "must be >= 2 to measure a trend",
            ));
        }
        if self.jump.min_frames < 2 {
            return Err(ConfigError::invalid_value(
                "jump.min_frames",
                "must be >= 2 to measure displacement",
            ));
        }
        if self.jump.min_frames > self.history_capacity {
            return Err(ConfigError::invalid_value(
                "jump.min_frames",
                format!(
                    "cannot exceed history_capacity ({})",
                    self.history_capacity
                ),
            ));
        }

        Ok(())
    }
}
