use std::collections::HashMap;

use dartcore::interface::{BoundingBox, Frame, RawDetection};
use dartcore::prelude::{DartDetector, EngineError, EngineResult};
use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::vision::gray_image;

/// Bright-blob dart tip detector for synthetic footage.
pub struct BlobDetector {
    /// Minimum luminance of a tip pixel.
    pub threshold: u8,
    pub min_pixels: usize,
    /// Pixel count at which confidence saturates.
    pub full_confidence_pixels: usize,
    /// Half-width of the box reported around each tip.
    pub box_half: f32,
}

impl Default for BlobDetector {
    fn default() -> Self {
        Self {
            threshold: 240,
            min_pixels: 3,
            full_confidence_pixels: 25,
            box_half: 10.0,
        }
    }
}

#[derive(Default)]
struct Blob {
    sum_x: f64,
    sum_y: f64,
    count: usize,
}

impl BlobDetector {
    /// 4-connected components of pixels at or above the threshold, in raster
    /// order of their first pixel.
    fn blobs(&self, gray: &GrayImage) -> Vec<Blob> {
        let threshold = self.threshold;
        let mask = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            if gray.get_pixel(x, y)[0] >= threshold {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        let labels = connected_components(&mask, Connectivity::Four, Luma([0u8]));

        let mut index: HashMap<u32, usize> = HashMap::new();
        let mut blobs: Vec<Blob> = Vec::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label[0];
            if label == 0 {
                continue;
            }
            let slot = *index.entry(label).or_insert_with(|| {
                blobs.push(Blob::default());
                blobs.len() - 1
            });
            let blob = &mut blobs[slot];
            blob.sum_x += x as f64;
            blob.sum_y += y as f64;
            blob.count += 1;
        }
        blobs
    }
}

impl DartDetector for BlobDetector {
    fn detect(&mut self, frame: &Frame) -> EngineResult<Vec<RawDetection>> {
        let gray = gray_image(frame).ok_or_else(|| {
            EngineError::DetectionUnavailable(format!(
                "frame {} has an inconsistent shape",
                frame.frame_id
            ))
        })?;
        let full = self.full_confidence_pixels.max(1) as f32;
        Ok(self
            .blobs(&gray)
            .into_iter()
            .filter(|blob| blob.count >= self.min_pixels)
            .map(|blob| {
                let x = (blob.sum_x / blob.count as f64) as f32;
                let y = (blob.sum_y / blob.count as f64) as f32;
                let confidence = (blob.count as f32 / full).min(1.0);
                RawDetection::new(BoundingBox::around(x, y, self.box_half), confidence)
            })
            .collect())
    }
}
