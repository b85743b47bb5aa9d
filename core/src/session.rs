use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::interface::{Frame, FrameUpdate};
use crate::prelude::{
    CircleFinder, DartDetector, EngineError, EngineResult, FrameSource, IdentityTracker,
    TrackingConfig,
};
use crate::scoring::aggregator::{score_darts, Score};
use crate::scoring::autocal;
use crate::scoring::calibration::{Calibration, CalibrationStore};
use crate::scoring::stability::StabilityTracker;
use crate::telemetry::{LogManager, MetricsRecorder};

/// Point-in-time summary for status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub frames_processed: usize,
    pub frames_skipped: usize,
    pub errors: usize,
    pub active_tracks: usize,
    pub stable_darts: usize,
    pub auto_calibrate: bool,
}

struct Pipeline {
    frames: Box<dyn FrameSource + Send>,
    detector: Box<dyn DartDetector + Send>,
    circles: Option<Box<dyn CircleFinder + Send>>,
    stability: StabilityTracker,
}

pub struct ScoringSession {
    pipeline: Mutex<Pipeline>,
    calibration: CalibrationStore,
    metrics: MetricsRecorder,
    heartbeat: AtomicU64,
    logger: LogManager,
}

impl ScoringSession {
    pub fn new(
        tracking: TrackingConfig,
        calibration: Calibration,
        frames: Box<dyn FrameSource + Send>,
        detector: Box<dyn DartDetector + Send>,
        tracker: Box<dyn IdentityTracker + Send>,
    ) -> EngineResult<Self> {
        Ok(Self {
            pipeline: Mutex::new(Pipeline {
                frames,
                detector,
                circles: None,
                stability: StabilityTracker::new(tracking, tracker),
            }),
            calibration: CalibrationStore::new(calibration)?,
            metrics: MetricsRecorder::new(),
            heartbeat: AtomicU64::new(0),
            logger: LogManager::new("session"),
        })
    }

    /// Enables auto-calibration proposals from `finder`.
    pub fn with_circle_finder(mut self, finder: Box<dyn CircleFinder + Send>) -> Self {
        self.pipeline
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .circles = Some(finder);
        self
    }

    /// Single-shot scoring of an already acquired frame.
    pub fn process_frame(&self, frame: &Frame) -> EngineResult<Score> {
        let mut pipeline = self.lock_pipeline()?;
        self.run_pipeline(&mut pipeline, frame)
    }

    /// Pulls the next frame from the source and scores it.
    pub fn process_next(&self) -> EngineResult<FrameUpdate> {
        let mut pipeline = self.lock_pipeline()?;
        let frame = match pipeline.frames.next_frame() {
            Ok(frame) => frame,
            Err(err) => {
                self.metrics.record_skipped();
                return Err(err);
            }
        };
        let score = self.run_pipeline(&mut pipeline, &frame)?;
        Ok(FrameUpdate {
            score,
            frame_id: frame.frame_id,
            timestamp: frame.timestamp,
            heartbeat: self.heartbeat.fetch_add(1, Ordering::SeqCst),
        })
    }

    /// Streams one update per tick until `shutdown` flips to true or either
    /// channel end goes away. Tracking restarts from scratch for every stream,
    /// and the loop stops only between frames.
    pub async fn run_stream(
        &self,
        tick: Duration,
        updates: mpsc::Sender<FrameUpdate>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if let Err(err) = self.reset_tracking() {
            self.logger.warn(&format!("tracking not reset: {}", err));
        }
        self.logger
            .record(&format!("stream started, tick {} ms", tick.as_millis()));

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                changed = shutdown.changed() => {
                    let stop = changed.is_err() || *shutdown.borrow();
                    if stop {
                        break;
                    }
                    continue;
                }
            }

            match self.process_next() {
                Ok(update) => {
                    if updates.send(update).await.is_err() {
                        self.logger.record("stream receiver dropped");
                        break;
                    }
                }
                Err(EngineError::FrameUnavailable(reason)) => {
                    self.logger.detail(&format!("no frame ready: {}", reason));
                }
                Err(err) => {
                    self.logger.warn(&format!("frame skipped: {}", err));
                }
            }
        }

        self.logger.record("stream stopped");
    }

    pub fn set_calibration(&self, center_x: i32, center_y: i32, radius: i32) -> EngineResult<()> {
        self.calibration.set_manual(center_x, center_y, radius)
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration.current()
    }

    pub fn set_auto_calibration(&self, enabled: bool) {
        self.calibration.set_auto_mode(enabled);
    }

    /// Forgets every track and stable dart, e.g. at the start of a new turn.
    pub fn reset_tracking(&self) -> EngineResult<()> {
        let mut pipeline = self.lock_pipeline()?;
        pipeline.stability.reset();
        Ok(())
    }

    pub fn status(&self) -> EngineResult<SessionStatus> {
        let metrics = self.metrics.snapshot();
        let pipeline = self.lock_pipeline()?;
        Ok(SessionStatus {
            frames_processed: metrics.processed,
            frames_skipped: metrics.skipped,
            errors: metrics.errors,
            active_tracks: pipeline.stability.tracks().len(),
            stable_darts: pipeline.stability.stable_darts().len(),
            auto_calibrate: self.calibration.current().auto_calibrate,
        })
    }

    fn lock_pipeline(&self) -> EngineResult<std::sync::MutexGuard<'_, Pipeline>> {
        self.pipeline
            .lock()
            .map_err(|_| EngineError::Internal("pipeline lock poisoned".into()))
    }

    fn run_pipeline(&self, pipeline: &mut Pipeline, frame: &Frame) -> EngineResult<Score> {
        if let Some(finder) = pipeline.circles.as_deref_mut() {
            autocal::auto_calibrate(&self.calibration, finder, frame);
        }

        let stable = pipeline
            .detector
            .detect(frame)
            .and_then(|detections| pipeline.stability.update(&detections));
        let stable = match stable {
            Ok(stable) => stable,
            Err(err) => {
                self.metrics.record_error();
                self.logger
                    .warn(&format!("frame {} not scored: {}", frame.frame_id, err));
                return Err(err);
            }
        };

        let calibration = self.calibration.snapshot();
        let score = score_darts(&stable, &calibration, frame.width(), frame.height());
        self.metrics.record_processed();
        Ok(score)
    }
}
