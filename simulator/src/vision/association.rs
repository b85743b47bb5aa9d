use dartcore::interface::{RawDetection, TrackedDetection};
use dartcore::math::GeometryHelper;
use dartcore::prelude::{EngineResult, IdentityTracker};

#[derive(Debug, Clone)]
struct Candidate {
    id: u64,
    center: (f32, f32),
    missed: u32,
}

/// Greedy centroid association with monotonically increasing ids.
pub struct NearestTracker {
    /// Largest centroid jump still matched to an existing id.
    pub max_distance: f32,
    /// Frames an unmatched id is remembered before it is dropped.
    pub max_missed: u32,
    candidates: Vec<Candidate>,
    next_id: u64,
}

impl NearestTracker {
    pub fn new(max_distance: f32, max_missed: u32) -> Self {
        Self {
            max_distance,
            max_missed,
            candidates: Vec::new(),
            next_id: 1,
        }
    }
}

impl Default for NearestTracker {
    fn default() -> Self {
        Self::new(30.0, 30)
    }
}

impl IdentityTracker for NearestTracker {
    fn update(&mut self, detections: &[RawDetection]) -> EngineResult<Vec<TrackedDetection>> {
        let mut order: Vec<usize> = (0..detections.len()).collect();
        order.sort_by(|&a, &b| detections[b].confidence.total_cmp(&detections[a].confidence));

        let mut matched = vec![false; self.candidates.len()];
        let mut assigned: Vec<Option<u64>> = vec![None; detections.len()];

        for index in order {
            let center = detections[index].bbox.center();
            let best = self
                .candidates
                .iter()
                .enumerate()
                .filter(|(slot, _)| !matched[*slot])
                .map(|(slot, candidate)| (slot, GeometryHelper::distance(center, candidate.center)))
                .filter(|&(_, distance)| distance <= self.max_distance)
                .min_by(|a, b| a.1.total_cmp(&b.1));

            match best {
                Some((slot, _)) => {
                    matched[slot] = true;
                    let candidate = &mut self.candidates[slot];
                    candidate.center = center;
                    candidate.missed = 0;
                    assigned[index] = Some(candidate.id);
                }
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    self.candidates.push(Candidate {
                        id,
                        center,
                        missed: 0,
                    });
                    matched.push(true);
                    assigned[index] = Some(id);
                }
            }
        }

        for (candidate, hit) in self.candidates.iter_mut().zip(&matched) {
            if !hit {
                candidate.missed += 1;
            }
        }
        let max_missed = self.max_missed;
        self.candidates.retain(|candidate| candidate.missed <= max_missed);

        Ok(detections
            .iter()
            .zip(assigned)
            .filter_map(|(detection, id)| {
                id.map(|id| TrackedDetection::new(id, detection.bbox, detection.confidence))
            })
            .collect())
    }

    /// Drops all association memory. Ids keep counting up so post-reset ids
    /// never collide with earlier ones.
    fn reinitialize(&mut self) {
        self.candidates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dartcore::interface::BoundingBox;

    fn det(x: f32, y: f32, confidence: f32) -> RawDetection {
        RawDetection::new(BoundingBox::around(x, y, 10.0), confidence)
    }

    fn ids(tracked: &[TrackedDetection]) -> Vec<u64> {
        tracked.iter().map(|t| t.track_id).collect()
    }

    #[test]
    fn nearby_detections_keep_their_ids() {
        let mut tracker = NearestTracker::default();
        let first = tracker
            .update(&[det(100.0, 100.0, 0.9), det(300.0, 100.0, 0.8)])
            .unwrap();
        assert_eq!(ids(&first), vec![1, 2]);

        let second = tracker
            .update(&[det(302.0, 101.0, 0.8), det(99.0, 98.0, 0.9)])
            .unwrap();
        assert_eq!(ids(&second), vec![2, 1]);
    }

    #[test]
    fn far_detection_gets_a_new_id() {
        let mut tracker = NearestTracker::default();
        tracker.update(&[det(100.0, 100.0, 0.9)]).unwrap();
        let tracked = tracker.update(&[det(200.0, 100.0, 0.9)]).unwrap();
        assert_eq!(ids(&tracked), vec![2]);
    }

    #[test]
    fn reinitialize_forgets_positions_but_not_the_counter() {
        let mut tracker = NearestTracker::default();
        tracker.update(&[det(100.0, 100.0, 0.9)]).unwrap();
        tracker.reinitialize();
        let tracked = tracker.update(&[det(100.0, 100.0, 0.9)]).unwrap();
        assert_eq!(ids(&tracked), vec![2]);
    }

    #[test]
    fn unmatched_ids_expire() {
        let mut tracker = NearestTracker::new(30.0, 1);
        tracker.update(&[det(100.0, 100.0, 0.9)]).unwrap();
        tracker.update(&[det(500.0, 100.0, 0.9)]).unwrap();
        tracker.update(&[det(500.0, 100.0, 0.9)]).unwrap();
        let tracked = tracker.update(&[det(100.0, 100.0, 0.9)]).unwrap();
        assert_eq!(ids(&tracked), vec![3]);
    }
}
