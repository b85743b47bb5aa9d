use crate::interface::Frame;
use crate::prelude::CircleFinder;
use crate::scoring::calibration::CalibrationStore;

/// Feeds a circle-finder proposal into the store. No proposal, or auto mode
/// off, leaves calibration untouched. Returns whether the calibration changed.
pub fn apply_proposal(store: &CalibrationStore, proposal: Option<(i32, i32, i32)>) -> bool {
    match proposal {
        Some((center_x, center_y, radius)) => store.propose_auto(center_x, center_y, radius),
        None => false,
    }
}

/// Runs the finder for `frame` only while auto mode is on.
pub fn auto_calibrate(
    store: &CalibrationStore,
    finder: &mut dyn CircleFinder,
    frame: &Frame,
) -> bool {
    if !store.current().auto_calibrate {
        return false;
    }
    apply_proposal(store, finder.propose_circle(frame))
}
