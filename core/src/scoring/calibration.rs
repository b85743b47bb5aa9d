use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::prelude::{EngineError, EngineResult};

/// Board center and radius in pixels plus the auto-calibration flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calibration {
    pub center_x: i32,
    pub center_y: i32,
    pub radius: i32,
    pub auto_calibrate: bool,
}

impl Calibration {
    pub fn new(center_x: i32, center_y: i32, radius: i32, auto_calibrate: bool) -> Self {
        Self {
            center_x,
            center_y,
            radius,
            auto_calibrate,
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.radius <= 0 {
            return Err(EngineError::CalibrationInvalid(self.radius));
        }
        Ok(())
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(640, 360, 300, true)
    }
}

/// Shared calibration. Readers get whole snapshots; writers swap the snapshot
/// under the write lock, so center and radius are never observed torn.
pub struct CalibrationStore {
    current: RwLock<Arc<Calibration>>,
}

impl CalibrationStore {
    pub fn new(initial: Calibration) -> EngineResult<Self> {
        initial.validate()?;
        Ok(Self {
            current: RwLock::new(Arc::new(initial)),
        })
    }

    pub fn snapshot(&self) -> Arc<Calibration> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current(&self) -> Calibration {
        *self.snapshot()
    }

    /// Operator calibration. Always leaves auto mode off.
    pub fn set_manual(&self, center_x: i32, center_y: i32, radius: i32) -> EngineResult<()> {
        let next = Calibration::new(center_x, center_y, radius, false);
        next.validate()?;
        self.swap(|_| Some(next));
        info!(
            "Calibration set manually: center=({}, {}), radius={}",
            center_x, center_y, radius
        );
        Ok(())
    }

    pub fn set_auto_mode(&self, enabled: bool) {
        self.swap(|current| {
            Some(Calibration {
                auto_calibrate: enabled,
                ..*current
            })
        });
        info!(
            "Auto-calibration {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Applies a detected circle only while auto mode is on. Returns whether it
    /// was stored.
    pub fn propose_auto(&self, center_x: i32, center_y: i32, radius: i32) -> bool {
        if radius <= 0 {
            debug!("Ignoring auto-calibration proposal with radius {}", radius);
            return false;
        }
        let applied = self.swap(|current| {
            current
                .auto_calibrate
                .then(|| Calibration::new(center_x, center_y, radius, true))
        });
        if applied {
            debug!(
                "Auto-calibration applied: center=({}, {}), radius={}",
                center_x, center_y, radius
            );
        }
        applied
    }

    /// Replaces the snapshot with `update(current)` when it returns `Some`.
    fn swap<F>(&self, update: F) -> bool
    where
        F: FnOnce(&Calibration) -> Option<Calibration>,
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        match update(&guard) {
            Some(next) => {
                *guard = Arc::new(next);
                true
            }
            None => false,
        }
    }
}

impl Default for CalibrationStore {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(Calibration::default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn manual_calibration_disables_auto_mode() {
        let store = CalibrationStore::default();
        assert!(store.current().auto_calibrate);

        store.set_manual(500, 400, 250).unwrap();
        assert_eq!(store.current(), Calibration::new(500, 400, 250, false));

        assert!(!store.propose_auto(10, 10, 10));
        assert_eq!(store.current().center_x, 500);

        store.set_auto_mode(true);
        assert!(store.propose_auto(10, 20, 30));
        assert_eq!(store.current(), Calibration::new(10, 20, 30, true));
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let store = CalibrationStore::default();
        assert_eq!(
            store.set_manual(1, 2, 0),
            Err(EngineError::CalibrationInvalid(0))
        );
        assert!(!store.propose_auto(1, 2, -4));
        assert_eq!(store.current(), Calibration::default());
        assert!(CalibrationStore::new(Calibration::new(0, 0, -1, true)).is_err());
    }

    #[test]
    fn toggling_auto_mode_keeps_geometry() {
        let store = CalibrationStore::new(Calibration::new(1, 2, 3, true)).unwrap();
        store.set_auto_mode(false);
        assert_eq!(store.current(), Calibration::new(1, 2, 3, false));
    }

    #[test]
    fn concurrent_readers_never_see_torn_values() {
        let store = Arc::new(CalibrationStore::new(Calibration::new(100, 100, 100, true)).unwrap());
        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for i in 1..500 {
                    store.propose_auto(100 + i, 100 + i, 100 + i);
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let cal = store.current();
                        assert_eq!(cal.center_x, cal.radius);
                        assert_eq!(cal.center_y, cal.radius);
                    }
                })
            })
            .collect();
        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
