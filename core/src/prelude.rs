use serde::{Deserialize, Serialize};

use crate::interface::{Frame, RawDetection, TrackedDetection};

/// Tuning shared by the stability tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Frame-to-frame displacement (pixels) still counted as "not moving".
    pub movement_threshold: f32,
    /// Consecutive non-moving frames before a track is reported as stable.
    pub stability_threshold: u32,
    /// Wall-clock seconds between periodic tracker resets. Infinite means never.
    pub reset_interval_secs: f64,
    /// Positions retained per track.
    pub history_limit: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            movement_threshold: 5.0,
            stability_threshold: 10,
            reset_interval_secs: 5.0,
            history_limit: 300,
        }
    }
}

impl TrackingConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.movement_threshold.is_nan() || self.movement_threshold < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "movement_threshold {} must be non-negative",
                self.movement_threshold
            )));
        }
        if self.reset_interval_secs.is_nan() || self.reset_interval_secs < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "reset_interval_secs {} must be non-negative",
                self.reset_interval_secs
            )));
        }
        Ok(())
    }
}

/// Common error type for the scoring engine and its collaborators.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid calibration: radius {0} must be positive")]
    CalibrationInvalid(i32),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("malformed frame: {0}")]
    InvalidFrame(String),
    #[error("frame unavailable: {0}")]
    FrameUnavailable(String),
    #[error("detection unavailable: {0}")]
    DetectionUnavailable(String),
    #[error("track update failed: {0}")]
    TrackUpdateFailed(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Produces frames on demand. Fails with `FrameUnavailable` when nothing is ready.
pub trait FrameSource {
    fn next_frame(&mut self) -> EngineResult<Frame>;
}

/// Per-frame dart detector; output is already filtered to the dart class.
pub trait DartDetector {
    fn detect(&mut self, frame: &Frame) -> EngineResult<Vec<RawDetection>>;
}

/// Multi-object identity assignment. Ids persist across `update` calls until
/// `reinitialize` drops all association memory.
pub trait IdentityTracker {
    fn update(&mut self, detections: &[RawDetection]) -> EngineResult<Vec<TrackedDetection>>;
    fn reinitialize(&mut self);
}

/// Proposes a board circle `(center_x, center_y, radius)` for a frame.
pub trait CircleFinder {
    fn propose_circle(&mut self, frame: &Frame) -> Option<(i32, i32, i32)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_config_validation() {
        assert!(TrackingConfig::default().validate().is_ok());

        let never = TrackingConfig {
            reset_interval_secs: f64::INFINITY,
            ..TrackingConfig::default()
        };
        assert!(never.validate().is_ok());

        for bad in [-1.0, f64::NAN] {
            let config = TrackingConfig {
                reset_interval_secs: bad,
                ..TrackingConfig::default()
            };
            assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
        }
        let config = TrackingConfig {
            movement_threshold: -0.5,
            ..TrackingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
