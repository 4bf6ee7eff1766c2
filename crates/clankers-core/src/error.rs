use thiserror::Error;

/// Top-level error type for the Clankers preview crates.
#[derive(Debug, Error)]
pub enum ClankersError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Preview sequence error: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Preview error: {0}")]
    Preview(#[from] PreviewError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid sample_time: {0} (must be > 0)")]
    InvalidSampleTime(f64),

    #[error("Invalid step_height: {0} (must be >= 0)")]
    InvalidStepHeight(f64),

    #[error("Invalid force_threshold: {0} (must be >= 0)")]
    InvalidForceThreshold(f64),

    #[error("Invalid min_pendulum_height: {0} (must be > 0)")]
    InvalidMinPendulumHeight(f64),
}

/// Errors raised while reading a preview-sequence description.
///
/// `phase` is `None` for fields outside the per-phase tables.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Missing required field {field}{}", phase_suffix(.phase))]
    MissingField { field: String, phase: Option<usize> },

    #[error("Invalid value for {field}{}: {message}", phase_suffix(.phase))]
    InvalidField {
        field: String,
        phase: Option<usize>,
        message: String,
    },

    #[error("Unknown foot {name} in phase_{phase}")]
    UnknownFoot { phase: usize, name: String },
}

#[allow(clippy::ref_option)]
fn phase_suffix(phase: &Option<usize>) -> String {
    phase.map(|k| format!(" in phase_{k}")).unwrap_or_default()
}

/// Errors raised by the preview engine and its models.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Robot model was not set before building the preview engine")]
    Uninitialized,

    #[error("Preview control has no phases")]
    EmptyControl,

    #[error("Invalid duration {duration} in phase_{phase} (must be finite and > 0)")]
    InvalidDuration { phase: usize, duration: f64 },

    #[error("Unknown foot {foot}")]
    UnknownFoot { foot: String },

    #[error("Invalid foot set: {0}")]
    InvalidFeet(String),

    #[error("No stance posture for foot {0}")]
    MissingStancePosture(String),

    #[error("Degenerate pendulum height {height} (CoM must stay above the CoP)")]
    NumericDegeneracy { height: f64 },

    #[error("Collaborator failure: {0}")]
    Collaborator(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clankers_error_from_config_error() {
        let err = ConfigError::InvalidSampleTime(-1.0);
        let clankers_err: ClankersError = err.into();
        assert!(matches!(clankers_err, ClankersError::Config(_)));
        assert!(clankers_err.to_string().contains("-1"));
    }

    #[test]
    fn clankers_error_from_sequence_error() {
        let err = SequenceError::MissingField {
            field: "duration".into(),
            phase: Some(3),
        };
        let clankers_err: ClankersError = err.into();
        assert!(matches!(clankers_err, ClankersError::Sequence(_)));
        assert!(clankers_err.to_string().contains("phase_3"));
    }

    #[test]
    fn clankers_error_from_preview_error() {
        let clankers_err: ClankersError = PreviewError::Uninitialized.into();
        assert!(matches!(
            clankers_err,
            ClankersError::Preview(PreviewError::Uninitialized)
        ));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::Io(_)));
    }

    #[test]
    fn sequence_error_display_messages() {
        assert_eq!(
            SequenceError::MissingField {
                field: "com_pos".into(),
                phase: None
            }
            .to_string(),
            "Missing required field com_pos"
        );
        assert_eq!(
            SequenceError::MissingField {
                field: "head_acc".into(),
                phase: Some(1)
            }
            .to_string(),
            "Missing required field head_acc in phase_1"
        );
        assert_eq!(
            SequenceError::InvalidField {
                field: "cop_shift".into(),
                phase: Some(0),
                message: "expected 2 numbers".into()
            }
            .to_string(),
            "Invalid value for cop_shift in phase_0: expected 2 numbers"
        );
        assert_eq!(
            SequenceError::UnknownFoot {
                phase: 2,
                name: "XX".into()
            }
            .to_string(),
            "Unknown foot XX in phase_2"
        );
    }

    #[test]
    fn preview_error_display_messages() {
        assert_eq!(
            PreviewError::EmptyControl.to_string(),
            "Preview control has no phases"
        );
        assert_eq!(
            PreviewError::InvalidDuration {
                phase: 4,
                duration: 0.0
            }
            .to_string(),
            "Invalid duration 0 in phase_4 (must be finite and > 0)"
        );
        assert_eq!(
            PreviewError::MissingStancePosture("FL".into()).to_string(),
            "No stance posture for foot FL"
        );
        assert!(
            PreviewError::NumericDegeneracy { height: -0.2 }
                .to_string()
                .contains("-0.2")
        );
    }

    #[test]
    fn config_error_display_messages() {
        assert_eq!(
            ConfigError::InvalidSampleTime(0.0).to_string(),
            "Invalid sample_time: 0 (must be > 0)"
        );
        assert_eq!(
            ConfigError::InvalidStepHeight(-0.1).to_string(),
            "Invalid step_height: -0.1 (must be >= 0)"
        );
    }
}
