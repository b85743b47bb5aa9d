use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use crate::interface::{Point, RawDetection, TrackedDetection};
use crate::math::geometry::GeometryHelper;
use crate::prelude::{EngineResult, IdentityTracker, TrackingConfig};
use crate::telemetry::LogManager;

/// Motion history of one tracked dart candidate. Gains one stability count per
/// frame it moves less than `movement_threshold` and drops to zero otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub track_id: u64,
    pub position_history: VecDeque<Point>,
    pub stable_count: u32,
    pub last_position: Point,
}

impl Track {
    fn new(track_id: u64, position: Point) -> Self {
        let mut position_history = VecDeque::new();
        position_history.push_back(position);
        Self {
            track_id,
            position_history,
            stable_count: 0,
            last_position: position,
        }
    }

    fn advance(&mut self, position: Point, movement_threshold: f32, history_limit: usize) {
        let moved = GeometryHelper::distance(
            (position.x, position.y),
            (self.last_position.x, self.last_position.y),
        );
        if moved < movement_threshold {
            self.stable_count += 1;
        } else {
            self.stable_count = 0;
        }

        self.position_history.push_back(position);
        if history_limit > 0 {
            while self.position_history.len() > history_limit {
                self.position_history.pop_front();
            }
        }
        self.last_position = position;
    }
}

/// Per-session stability state machine wrapped around an identity tracker.
pub struct StabilityTracker {
    config: TrackingConfig,
    tracker: Box<dyn IdentityTracker + Send>,
    tracks: BTreeMap<u64, Track>,
    stable: Vec<Point>,
    last_reset: Instant,
    logger: LogManager,
}

impl StabilityTracker {
    pub fn new(config: TrackingConfig, tracker: Box<dyn IdentityTracker + Send>) -> Self {
        Self {
            config,
            tracker,
            tracks: BTreeMap::new(),
            stable: Vec::new(),
            last_reset: Instant::now(),
            logger: LogManager::new("stability"),
        }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn tracks(&self) -> &BTreeMap<u64, Track> {
        &self.tracks
    }

    pub fn stable_darts(&self) -> &[Point] {
        &self.stable
    }

    pub fn update(&mut self, detections: &[RawDetection]) -> EngineResult<Vec<Point>> {
        self.update_at(detections, Instant::now())
    }

    /// Runs one frame through the identity tracker and the stability rules.
    ///
    /// Empty input keeps every track and the current stable set. A tracker
    /// failure leaves state untouched.
    pub fn update_at(
        &mut self,
        detections: &[RawDetection],
        now: Instant,
    ) -> EngineResult<Vec<Point>> {
        if detections.is_empty() {
            return Ok(self.stable.clone());
        }

        let tracked = self.tracker.update(detections)?;
        self.observe(&tracked);

        if let Some(interval) = self.reset_interval() {
            if now.saturating_duration_since(self.last_reset) > interval {
                self.periodic_reset(now);
            }
        }

        Ok(self.stable.clone())
    }

    /// Applies one frame of identified detections and recomputes the stable set.
    pub fn observe(&mut self, tracked: &[TrackedDetection]) -> &[Point] {
        let movement_threshold = self.config.movement_threshold;
        let stability_threshold = self.config.stability_threshold;
        let history_limit = self.config.history_limit;

        for detection in tracked {
            let position = detection.center_point();
            match self.tracks.get_mut(&detection.track_id) {
                Some(track) => {
                    let was_stable = track.stable_count >= stability_threshold;
                    track.advance(position, movement_threshold, history_limit);
                    if !was_stable && track.stable_count >= stability_threshold {
                        self.logger.detail(&format!(
                            "track {} at rest at ({:.1}, {:.1})",
                            track.track_id, position.x, position.y
                        ));
                    }
                }
                None => {
                    self.logger
                        .detail(&format!("new track {}", detection.track_id));
                    self.tracks
                        .insert(detection.track_id, Track::new(detection.track_id, position));
                }
            }
        }

        let before = self.tracks.len();
        self.tracks
            .retain(|id, _| tracked.iter().any(|detection| detection.track_id == *id));
        if self.tracks.len() < before {
            self.logger.detail(&format!(
                "dropped {} inactive tracks",
                before - self.tracks.len()
            ));
        }

        self.stable = self
            .tracks
            .values()
            .filter(|track| track.stable_count >= stability_threshold)
            .map(|track| track.last_position)
            .collect();
        &self.stable
    }

    /// Operator reset: forgets tracks, tracker memory and the stable set.
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.reinitialize(now);
        self.stable.clear();
        self.logger.record("tracker reset, stable darts cleared");
    }

    /// Reset that keeps already-resolved darts visible to the scorer.
    pub fn periodic_reset(&mut self, now: Instant) {
        let carried = self.stable.clone();
        self.reinitialize(now);
        self.stable = carried;
        self.logger.record(&format!(
            "tracker reset, carrying {} stable darts",
            self.stable.len()
        ));
    }

    fn reinitialize(&mut self, now: Instant) {
        self.tracker.reinitialize();
        self.tracks.clear();
        self.last_reset = now;
    }

    /// `None` when the interval is infinite or beyond `Duration`'s range.
    fn reset_interval(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.config.reset_interval_secs.max(0.0)).ok()
    }
}
