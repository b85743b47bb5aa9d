use dartcore::interface::Frame;
use dartcore::prelude::{EngineError, EngineResult, FrameSource};
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::generator::raster::paint_disk;

pub const BACKGROUND_LEVEL: u8 = 20;
pub const BOARD_LEVEL: u8 = 110;
pub const DART_LEVEL: u8 = 255;

/// A dart that lands at `(x, y)` on `land_frame` and wobbles for
/// `settle_frames` before coming to rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedDart {
    pub x: f32,
    pub y: f32,
    pub land_frame: u64,
    #[serde(default = "default_settle_frames")]
    pub settle_frames: u64,
}

fn default_settle_frames() -> u64 {
    3
}

/// Configuration for the synthetic board camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub width: usize,
    pub height: usize,
    pub fps: f64,
    pub board_center_x: f32,
    pub board_center_y: f32,
    pub board_radius: f32,
    pub dart_radius: f32,
    /// Per-frame positional noise of a resting dart, pixels.
    pub jitter: f32,
    /// Displacement of a dart while it is still settling, pixels.
    pub wobble: f32,
    /// Frames served before the footage runs out.
    pub frames: u64,
    pub seed: u64,
    pub darts: Vec<ScriptedDart>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30.0,
            board_center_x: 640.0,
            board_center_y: 360.0,
            board_radius: 300.0,
            dart_radius: 3.0,
            jitter: 0.5,
            wobble: 8.0,
            frames: 90,
            seed: 0,
            darts: vec![
                ScriptedDart {
                    x: 640.0,
                    y: 183.0,
                    land_frame: 5,
                    settle_frames: 3,
                },
                ScriptedDart {
                    x: 640.0,
                    y: 360.0,
                    land_frame: 25,
                    settle_frames: 3,
                },
                ScriptedDart {
                    x: 832.0,
                    y: 360.0,
                    land_frame: 45,
                    settle_frames: 3,
                },
            ],
        }
    }
}

/// Frame source that renders the scripted scene with seeded noise.
pub struct SyntheticCamera {
    config: SceneConfig,
    rng: StdRng,
    next_frame: u64,
}

impl SyntheticCamera {
    pub fn new(config: SceneConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            next_frame: 0,
        }
    }

    fn render(&mut self, frame_id: u64) -> Array2<u8> {
        let config = &self.config;
        let mut pixels = Array2::from_elem((config.height, config.width), BACKGROUND_LEVEL);
        paint_disk(
            &mut pixels,
            config.board_center_x,
            config.board_center_y,
            config.board_radius,
            BOARD_LEVEL,
        );

        for dart in config.darts.iter().filter(|d| d.land_frame <= frame_id) {
            let since_landing = frame_id - dart.land_frame;
            let spread = if since_landing < dart.settle_frames {
                config.wobble
            } else {
                config.jitter
            };
            let (dx, dy) = if spread > 0.0 {
                (
                    self.rng.gen_range(-spread..=spread),
                    self.rng.gen_range(-spread..=spread),
                )
            } else {
                (0.0, 0.0)
            };
            paint_disk(
                &mut pixels,
                dart.x + dx,
                dart.y + dy,
                config.dart_radius,
                DART_LEVEL,
            );
        }
        pixels
    }
}

impl FrameSource for SyntheticCamera {
    fn next_frame(&mut self) -> EngineResult<Frame> {
        if self.next_frame >= self.config.frames {
            return Err(EngineError::FrameUnavailable(format!(
                "scene ended after {} frames",
                self.config.frames
            )));
        }
        let frame_id = self.next_frame;
        self.next_frame += 1;
        let pixels = self.render(frame_id);
        let fps = if self.config.fps > 0.0 { self.config.fps } else { 30.0 };
        Ok(Frame::new(pixels, frame_id, frame_id as f64 / fps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_scene() -> SceneConfig {
        SceneConfig {
            width: 200,
            height: 100,
            board_center_x: 100.0,
            board_center_y: 50.0,
            board_radius: 40.0,
            frames: 3,
            darts: vec![ScriptedDart {
                x: 100.0,
                y: 30.0,
                land_frame: 1,
                settle_frames: 0,
            }],
            ..SceneConfig::default()
        }
    }

    #[test]
    fn camera_renders_board_and_landed_darts() {
        let mut camera = SyntheticCamera::new(small_scene());

        let first = camera.next_frame().unwrap();
        assert_eq!((first.width(), first.height()), (200, 100));
        assert_eq!(first.pixels[[50, 100]], BOARD_LEVEL);
        assert_eq!(first.pixels[[0, 0]], BACKGROUND_LEVEL);
        assert!(first.pixels.iter().all(|&v| v != DART_LEVEL));

        let second = camera.next_frame().unwrap();
        assert_eq!(second.frame_id, 1);
        assert!((second.timestamp - 1.0 / 30.0).abs() < 1e-9);
        assert!(second.pixels.iter().any(|&v| v == DART_LEVEL));
    }

    #[test]
    fn camera_runs_out_of_frames() {
        let mut camera = SyntheticCamera::new(small_scene());
        for _ in 0..3 {
            camera.next_frame().unwrap();
        }
        assert!(matches!(
            camera.next_frame(),
            Err(EngineError::FrameUnavailable(_))
        ));
    }

    #[test]
    fn same_seed_renders_same_frames() {
        let mut a = SyntheticCamera::new(small_scene());
        let mut b = SyntheticCamera::new(small_scene());
        for _ in 0..3 {
            assert_eq!(a.next_frame().unwrap().pixels, b.next_frame().unwrap().pixels);
        }
    }
}
