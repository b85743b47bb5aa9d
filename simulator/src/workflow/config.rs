use anyhow::Context;
use dartcore::prelude::TrackingConfig;
use dartcore::scoring::Calibration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::generator::scene::SceneConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub tracking: TrackingConfig,
    pub calibration: Calibration,
    pub scene: SceneConfig,
    /// Interval between streamed updates.
    pub tick_ms: u64,
    pub bind: SocketAddr,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            tracking: TrackingConfig::default(),
            calibration: Calibration::default(),
            scene: SceneConfig::default(),
            tick_ms: 100,
            bind: SocketAddr::from(([127, 0, 0, 1], 9000)),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .tracking
            .validate()
            .and_then(|()| config.calibration.validate())
            .with_context(|| format!("validating workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(frames: u64, seed: u64, auto_calibrate: bool) -> Self {
        let mut config = Self::default();
        config.scene.frames = frames;
        config.scene.seed = seed;
        config.calibration.auto_calibrate = auto_calibrate;
        config
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_overrides_scene() {
        let cfg = WorkflowConfig::from_args(12, 7, false);
        assert_eq!(cfg.scene.frames, 12);
        assert_eq!(cfg.scene.seed, 7);
        assert!(!cfg.calibration.auto_calibrate);
        assert_eq!(cfg.tracking.stability_threshold, 10);
    }

    #[test]
    fn config_load_reads_yaml_with_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        let yaml = "\
tracking:
  movement_threshold: 3.5
calibration:
  center_x: 320
  center_y: 240
  radius: 200
  auto_calibrate: false
scene:
  frames: 40
  darts:
    - { x: 320.0, y: 140.0, land_frame: 2 }
tick_ms: 50
";
        temp.write_all(yaml.as_bytes()).unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.tracking.movement_threshold, 3.5);
        assert_eq!(cfg.tracking.reset_interval_secs, 5.0);
        assert_eq!(cfg.calibration, Calibration::new(320, 240, 200, false));
        assert_eq!(cfg.scene.darts.len(), 1);
        assert_eq!(cfg.scene.darts[0].settle_frames, 3);
        assert_eq!(cfg.scene.width, 1280);
        assert_eq!(cfg.tick(), Duration::from_millis(50));
    }

    #[test]
    fn config_load_rejects_bad_radius() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"calibration: { center_x: 1, center_y: 1, radius: 0, auto_calibrate: true }\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }

    #[test]
    fn config_load_accepts_never_reset() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"tracking:\n  reset_interval_secs: .inf\n").unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert!(cfg.tracking.reset_interval_secs.is_infinite());
    }

    #[test]
    fn config_load_rejects_negative_reset_interval() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"tracking:\n  reset_interval_secs: -2.0\n").unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}
