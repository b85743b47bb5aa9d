pub mod association;
pub mod blob;
pub mod circle;

pub use association::NearestTracker;
pub use blob::BlobDetector;
pub use circle::GradientCircleFinder;

use dartcore::interface::Frame;
use image::GrayImage;

/// Copies a frame into an `image` buffer for the imageproc operators.
pub(crate) fn gray_image(frame: &Frame) -> Option<GrayImage> {
    GrayImage::from_raw(
        frame.width(),
        frame.height(),
        frame.pixels.iter().copied().collect(),
    )
}
