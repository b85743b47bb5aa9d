use dartcore::interface::FrameUpdate;
use serde::{Deserialize, Serialize};

/// Latest state published by the stream for HTTP readers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BridgeModel {
    pub latest: Option<FrameUpdate>,
}

impl BridgeModel {
    pub fn publish(&mut self, update: FrameUpdate) {
        self.latest = Some(update);
    }
}

/// Body of `POST /calibration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationRequest {
    pub center_x: i32,
    pub center_y: i32,
    pub radius: i32,
}

/// Query of `POST /detect`; the body carries `width * height` row-major
/// luminance bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectQuery {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub frame_id: u64,
    #[serde(default)]
    pub timestamp: f64,
}

/// Query of `POST /auto_calibration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoCalibrationQuery {
    #[serde(default = "enabled_by_default")]
    pub enable: bool,
}

fn enabled_by_default() -> bool {
    true
}
