pub mod detection;
pub mod frame;

pub use detection::{BoundingBox, Point, RawDetection, TrackedDetection};
pub use frame::{Frame, FrameUpdate};
