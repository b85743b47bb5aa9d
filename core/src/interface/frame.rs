use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::prelude::{EngineError, EngineResult};
use crate::scoring::aggregator::Score;

/// Single grayscale frame handed to the detector and circle finder.
#[derive(Debug, Clone)]
pub struct Frame {
    pub pixels: Array2<u8>,
    pub frame_id: u64,
    pub timestamp: f64,
}

impl Frame {
    pub fn new(pixels: Array2<u8>, frame_id: u64, timestamp: f64) -> Self {
        Self {
            pixels,
            frame_id,
            timestamp,
        }
    }

    /// Black frame of the given size.
    pub fn blank(width: usize, height: usize, frame_id: u64, timestamp: f64) -> Self {
        Self::new(Array2::zeros((height, width)), frame_id, timestamp)
    }

    /// Frame from row-major luminance bytes.
    pub fn from_luma(
        width: usize,
        height: usize,
        luma: Vec<u8>,
        frame_id: u64,
        timestamp: f64,
    ) -> EngineResult<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidFrame(format!(
                "empty {}x{} frame",
                width, height
            )));
        }
        let received = luma.len();
        let pixels = Array2::from_shape_vec((height, width), luma).map_err(|_| {
            EngineError::InvalidFrame(format!(
                "{} bytes do not fill a {}x{} frame",
                received, width, height
            ))
        })?;
        Ok(Self::new(pixels, frame_id, timestamp))
    }

    pub fn width(&self) -> u32 {
        self.pixels.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.pixels.nrows() as u32
    }
}

/// One message of the per-frame streaming variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameUpdate {
    pub score: Score,
    pub frame_id: u64,
    pub timestamp: f64,
    pub heartbeat: u64,
}
