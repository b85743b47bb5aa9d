//! Stability-tracking and board-scoring core for the Rust dart scoring platform.
//!
//! Per-frame detections flow through an external identity tracker into the
//! [`scoring::StabilityTracker`]; darts that came to rest are mapped onto board
//! sections under the session's shared calibration.

pub mod interface;
pub mod math;
pub mod prelude;
pub mod scoring;
pub mod session;
pub mod telemetry;

pub use prelude::{EngineError, EngineResult, TrackingConfig};
pub use session::{ScoringSession, SessionStatus};
