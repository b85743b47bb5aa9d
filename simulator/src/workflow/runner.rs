use crate::generator::scene::SyntheticCamera;
use crate::vision::{BlobDetector, GradientCircleFinder, NearestTracker};
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use dartcore::prelude::EngineError;
use dartcore::scoring::{Calibration, Score};
use dartcore::ScoringSession;
use log::{info, warn};

pub struct WorkflowResult {
    pub frames_processed: usize,
    pub frames_failed: usize,
    pub final_score: Option<Score>,
    /// `(frame_id, total_score)` every time the total changed.
    pub score_changes: Vec<(u64, i32)>,
    pub calibration: Calibration,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Session wired to the synthetic camera and the simulator's vision stack.
    pub fn build_session(&self) -> anyhow::Result<ScoringSession> {
        let session = ScoringSession::new(
            self.config.tracking.clone(),
            self.config.calibration,
            Box::new(SyntheticCamera::new(self.config.scene.clone())),
            Box::new(BlobDetector::default()),
            Box::new(NearestTracker::default()),
        )
        .context("creating scoring session")?
        .with_circle_finder(Box::new(GradientCircleFinder::default()));
        Ok(session)
    }

    /// Scores every frame of the scene until the footage runs out.
    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let session = self.build_session()?;
        let mut result = WorkflowResult {
            frames_processed: 0,
            frames_failed: 0,
            final_score: None,
            score_changes: Vec::new(),
            calibration: session.calibration(),
        };
        let mut last_total = 0;

        loop {
            match session.process_next() {
                Ok(update) => {
                    result.frames_processed += 1;
                    if update.score.total_score != last_total {
                        info!(
                            "frame {}: total {} -> {}",
                            update.frame_id, last_total, update.score.total_score
                        );
                        last_total = update.score.total_score;
                        result
                            .score_changes
                            .push((update.frame_id, update.score.total_score));
                    }
                    result.final_score = Some(update.score);
                }
                Err(EngineError::FrameUnavailable(_)) => break,
                Err(err) => {
                    warn!("frame skipped: {}", err);
                    result.frames_failed += 1;
                }
            }
        }

        result.calibration = session.calibration();
        Ok(result)
    }
}
