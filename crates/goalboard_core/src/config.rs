//! Board configuration.
//!
//! # Responsibility
//! - Hold gesture thresholds, feedback scaling and the remote timeout.
//! - Load overrides from JSON, falling back to defaults per field.
//!
//! # Invariants
//! - `activation_threshold < commit_threshold <= max_distance`.
//! - Every distance and the remote timeout are strictly positive.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const DEFAULT_SCROLL_TOLERANCE: f64 = 80.0;
const DEFAULT_ACTIVATION_THRESHOLD: f64 = 5.0;
const DEFAULT_COMMIT_THRESHOLD: f64 = 50.0;
const DEFAULT_MAX_DISTANCE: f64 = 120.0;
const DEFAULT_MAX_OPACITY: f64 = 0.95;
const DEFAULT_ACTIVE_PROGRESS: f64 = 0.2;
const DEFAULT_MAX_TRANSLATE: f64 = 120.0;
const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 10_000;

/// Swipe recognition thresholds, in pointer units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Vertical drift beyond which a move may be read as scrolling.
    pub scroll_tolerance: f64,
    /// Horizontal travel that fixes a direction and suppresses scrolling.
    pub activation_threshold: f64,
    /// Horizontal travel required for a release to commit.
    pub commit_threshold: f64,
    /// Travel that maps to progress `1.0`.
    pub max_distance: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            scroll_tolerance: DEFAULT_SCROLL_TOLERANCE,
            activation_threshold: DEFAULT_ACTIVATION_THRESHOLD,
            commit_threshold: DEFAULT_COMMIT_THRESHOLD,
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

/// Visual feedback scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub max_opacity: f64,
    /// Progress above which a row renders as active.
    pub active_progress: f64,
    pub max_translate: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            max_opacity: DEFAULT_MAX_OPACITY,
            active_progress: DEFAULT_ACTIVE_PROGRESS,
            max_translate: DEFAULT_MAX_TRANSLATE,
        }
    }
}

/// Top-level configuration for a goal session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub gesture: GestureConfig,
    pub feedback: FeedbackConfig,
    /// Upper bound for one remote call, in milliseconds.
    pub remote_timeout_ms: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            gesture: GestureConfig::default(),
            feedback: FeedbackConfig::default(),
            remote_timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
        }
    }
}

impl BoardConfig {
    /// Parses a JSON document and validates the result.
    ///
    /// # Errors
    /// - Returns `ConfigError::Parse` for malformed JSON or wrong field types.
    /// - Returns validation errors from [`BoardConfig::validate`].
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    /// Checks threshold ordering and ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gesture = &self.gesture;
        require_positive("gesture.scroll_tolerance", gesture.scroll_tolerance)?;
        require_positive("gesture.activation_threshold", gesture.activation_threshold)?;
        require_positive("gesture.commit_threshold", gesture.commit_threshold)?;
        require_positive("gesture.max_distance", gesture.max_distance)?;
        if gesture.activation_threshold >= gesture.commit_threshold {
            return Err(ConfigError::ThresholdOrder {
                lower: "gesture.activation_threshold",
                upper: "gesture.commit_threshold",
            });
        }
        if gesture.commit_threshold > gesture.max_distance {
            return Err(ConfigError::ThresholdOrder {
                lower: "gesture.commit_threshold",
                upper: "gesture.max_distance",
            });
        }

        let feedback = &self.feedback;
        if !(feedback.max_opacity > 0.0 && feedback.max_opacity <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "feedback.max_opacity",
                value: feedback.max_opacity,
            });
        }
        if !(0.0..1.0).contains(&feedback.active_progress) {
            return Err(ConfigError::OutOfRange {
                field: "feedback.active_progress",
                value: feedback.active_progress,
            });
        }
        require_positive("feedback.max_translate", feedback.max_translate)?;

        if self.remote_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Configuration load and validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Parse(String),
    NotPositive { field: &'static str, value: f64 },
    OutOfRange { field: &'static str, value: f64 },
    ThresholdOrder {
        lower: &'static str,
        upper: &'static str,
    },
    ZeroTimeout,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid board config: {message}"),
            Self::NotPositive { field, value } => {
                write!(f, "{field} must be > 0, got {value}")
            }
            Self::OutOfRange { field, value } => write!(f, "{field} out of range: {value}"),
            Self::ThresholdOrder { lower, upper } => {
                write!(f, "{lower} must be smaller than {upper}")
            }
            Self::ZeroTimeout => write!(f, "remote_timeout_ms must be > 0"),
        }
    }
}

impl Error for ConfigError {}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    // NaN fails this comparison too.
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardConfig, ConfigError};

    #[test]
    fn defaults_are_valid() {
        let config = BoardConfig::default();
        config.validate().unwrap();
        assert_eq!(config.gesture.commit_threshold, 50.0);
        assert_eq!(config.remote_timeout().as_millis(), 10_000);
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config =
            BoardConfig::from_json_str(r#"{"gesture": {"commit_threshold": 40}}"#).unwrap();
        assert_eq!(config.gesture.commit_threshold, 40.0);
        assert_eq!(config.gesture.max_distance, 120.0);
        assert_eq!(config.feedback.max_opacity, 0.95);
    }

    #[test]
    fn rejects_commit_threshold_beyond_max_distance() {
        let err = BoardConfig::from_json_str(
            r#"{"gesture": {"commit_threshold": 150, "max_distance": 100}}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ThresholdOrder {
                lower: "gesture.commit_threshold",
                upper: "gesture.max_distance",
            }
        );
    }

    #[test]
    fn rejects_malformed_json() {
        let err = BoardConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
