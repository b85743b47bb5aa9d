use serde::{Deserialize, Serialize};

/// One detected or tracked dart tip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl Point {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }
}

/// Axis-aligned box in pixel coordinates, `(x1, y1)` top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Square box of half-width `half` centred on `(x, y)`.
    pub fn around(x: f32, y: f32, half: f32) -> Self {
        Self::new(x - half, y - half, x + half, y + half)
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) * 0.5, (self.y1 + self.y2) * 0.5)
    }
}

/// Detector output for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl RawDetection {
    pub fn new(bbox: BoundingBox, confidence: f32) -> Self {
        Self { bbox, confidence }
    }
}

/// Detection after the identity tracker attached a persistent id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedDetection {
    pub track_id: u64,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl TrackedDetection {
    pub fn new(track_id: u64, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            track_id,
            bbox,
            confidence,
        }
    }

    /// Midpoint of the box carried as a dart point.
    pub fn center_point(&self) -> Point {
        let (x, y) = self.bbox.center();
        Point::new(x, y, self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_point_is_box_midpoint() {
        let tracked = TrackedDetection::new(3, BoundingBox::new(10.0, 20.0, 30.0, 60.0), 0.8);
        assert_eq!(tracked.center_point(), Point::new(20.0, 40.0, 0.8));
    }
}
