use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_sample_time() -> f64 {
    0.001
}
const fn default_step_height() -> f64 {
    0.1
}
const fn default_min_pendulum_height() -> f64 {
    1e-3
}

// ---------------------------------------------------------------------------
// PreviewConfig
// ---------------------------------------------------------------------------

/// Tuning of the multi-phase preview engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Trajectory sampling interval in seconds (default: 0.001 = 1000 Hz).
    #[serde(default = "default_sample_time")]
    pub sample_time: f64,

    /// Swing-foot clearance above the straight liftoff-touchdown line (m).
    #[serde(default = "default_step_height")]
    pub step_height: f64,

    /// Minimum normal contact force (N) for a foot to count as supporting.
    #[serde(default)]
    pub force_threshold: f64,

    /// Smallest CoM height above the CoP (m) accepted by the cart-table model.
    #[serde(default = "default_min_pendulum_height")]
    pub min_pendulum_height: f64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            sample_time: default_sample_time(),
            step_height: default_step_height(),
            force_threshold: 0.0,
            min_pendulum_height: default_min_pendulum_height(),
        }
    }
}

impl PreviewConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_time > 0.0 && self.sample_time.is_finite()) {
            return Err(ConfigError::InvalidSampleTime(self.sample_time));
        }
        if !(self.step_height >= 0.0 && self.step_height.is_finite()) {
            return Err(ConfigError::InvalidStepHeight(self.step_height));
        }
        if !(self.force_threshold >= 0.0 && self.force_threshold.is_finite()) {
            return Err(ConfigError::InvalidForceThreshold(self.force_threshold));
        }
        if !(self.min_pendulum_height > 0.0 && self.min_pendulum_height.is_finite()) {
            return Err(ConfigError::InvalidMinPendulumHeight(
                self.min_pendulum_height,
            ));
        }
        Ok(())
    }

    /// Sampling rate in Hz.
    pub fn sample_hz(&self) -> f64 {
        1.0 / self.sample_time
    }

    /// Parse and validate from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
