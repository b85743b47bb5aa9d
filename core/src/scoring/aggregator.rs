use serde::{Deserialize, Serialize};

use crate::interface::Point;
use crate::scoring::calibration::Calibration;
use crate::scoring::mapper::{sector_of, ScoringSection};

/// One resting dart with its mapped section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DartThrow {
    pub section: ScoringSection,
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

/// Scored view of the stable darts of one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub throws: Vec<DartThrow>,
    pub total_score: i32,
    pub image_width: u32,
    pub image_height: u32,
}

impl Score {
    pub fn empty(image_width: u32, image_height: u32) -> Self {
        Self {
            throws: Vec::new(),
            total_score: 0,
            image_width,
            image_height,
        }
    }
}

/// Scores `darts` in the order given. Misses stay in the throw list.
pub fn score_darts(
    darts: &[Point],
    calibration: &Calibration,
    image_width: u32,
    image_height: u32,
) -> Score {
    let mut score = Score::empty(image_width, image_height);
    for dart in darts {
        let section = sector_of(dart.x, dart.y, calibration);
        score.total_score += section.points();
        score.throws.push(DartThrow {
            section,
            x: dart.x,
            y: dart.y,
            confidence: dart.confidence,
        });
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_scores_zero() {
        let score = score_darts(&[], &Calibration::default(), 1280, 720);
        assert_eq!(score, Score::empty(1280, 720));
    }

    #[test]
    fn darts_are_scored_in_input_order() {
        let cal = Calibration::new(640, 360, 300, false);
        let darts = [
            Point::new(640.0, 360.0 - 150.0, 0.9),
            Point::new(640.0, 360.0 - 177.0, 0.8),
            Point::new(2000.0, 2000.0, 0.4),
            Point::new(640.0, 360.0, 0.7),
        ];
        let score = score_darts(&darts, &cal, 1280, 720);

        let labels: Vec<&str> = score.throws.iter().map(|t| t.section.label.as_str()).collect();
        assert_eq!(labels, vec!["20", "T20", "Miss", "Bull"]);
        assert_eq!(score.total_score, 20 + 60 + 0 + 50);
        assert_eq!(score.throws[2].confidence, 0.4);
        assert_eq!(
            score.total_score,
            score.throws.iter().map(|t| t.section.points()).sum::<i32>()
        );
    }

    #[test]
    fn score_serializes_with_wire_field_names() {
        let cal = Calibration::new(100, 100, 100, false);
        let score = score_darts(&[Point::new(100.0, 41.0, 0.5)], &cal, 200, 200);
        let value = serde_json::to_value(&score).unwrap();
        assert_eq!(value["total_score"], 60);
        assert_eq!(value["throws"][0]["section"]["label"], "T20");
        assert_eq!(value["image_width"], 200);
    }
}
