pub mod aggregator;
pub mod autocal;
pub mod calibration;
pub mod mapper;
pub mod stability;

pub use aggregator::{score_darts, DartThrow, Score};
pub use calibration::{Calibration, CalibrationStore};
pub use mapper::{sector_of, ScoringSection};
pub use stability::{StabilityTracker, Track};
