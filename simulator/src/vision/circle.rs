use dartcore::interface::Frame;
use dartcore::prelude::CircleFinder;
use image::{ImageBuffer, Luma};

use crate::vision::gray_image;

/// Board circle proposal by gradient voting.
///
/// Edge pixels vote along their gradient at every radius of the window. The
/// peak of the smoothed accumulator is the rough centre, the most common edge
/// distance from it picks the rim, and the rim pixels refine both.
pub struct GradientCircleFinder {
    pub min_radius: i32,
    pub max_radius: i32,
    /// Edge strength threshold as a fraction of the strongest gradient.
    pub grad_threshold: f32,
    /// Gaussian sigma for accumulator smoothing.
    pub accum_sigma: f32,
    /// Rim pixels required per pixel of circumference.
    pub min_support: f32,
    /// Half-width of the band around the rim distance, pixels.
    pub rim_band: f32,
}

impl Default for GradientCircleFinder {
    fn default() -> Self {
        Self {
            min_radius: 50,
            max_radius: 300,
            grad_threshold: 0.2,
            accum_sigma: 2.0,
            min_support: 0.5,
            rim_band: 3.0,
        }
    }
}

struct Edge {
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
    magnitude: f32,
}

#[inline]
fn bilinear_add(accum: &mut [f32], stride: usize, x: f32, y: f32, weight: f32) {
    let x0 = x as usize;
    let y0 = y as usize;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;
    let base = y0 * stride + x0;
    accum[base] += weight * (1.0 - fx) * (1.0 - fy);
    accum[base + 1] += weight * fx * (1.0 - fy);
    accum[base + stride] += weight * (1.0 - fx) * fy;
    accum[base + stride + 1] += weight * fx * fy;
}

impl GradientCircleFinder {
    fn edges(&self, gray: &image::GrayImage) -> Vec<Edge> {
        let gx = imageproc::gradients::horizontal_scharr(gray);
        let gy = imageproc::gradients::vertical_scharr(gray);
        let stride = gray.width() as usize;

        let max_mag = gx
            .as_raw()
            .iter()
            .zip(gy.as_raw().iter())
            .map(|(&gx, &gy)| (gx as f32).hypot(gy as f32))
            .fold(0.0f32, f32::max);
        if max_mag < 1e-6 {
            return Vec::new();
        }
        let threshold = self.grad_threshold * max_mag;

        gx.as_raw()
            .iter()
            .zip(gy.as_raw().iter())
            .enumerate()
            .filter_map(|(idx, (&gx, &gy))| {
                let (gx, gy) = (gx as f32, gy as f32);
                let magnitude = gx.hypot(gy);
                (magnitude >= threshold).then(|| Edge {
                    x: (idx % stride) as f32,
                    y: (idx / stride) as f32,
                    dx: gx / magnitude,
                    dy: gy / magnitude,
                    magnitude,
                })
            })
            .collect()
    }

    /// Smoothed accumulator peak of votes cast along both gradient directions.
    fn vote_center(&self, edges: &[Edge], width: u32, height: u32) -> Option<(f32, f32)> {
        let stride = width as usize;
        let mut accum = vec![0.0f32; stride * height as usize];
        let x_limit = (width - 1) as f32;
        let y_limit = (height - 1) as f32;

        for edge in edges {
            for r in self.min_radius..=self.max_radius {
                let r = r as f32;
                for sign in [1.0f32, -1.0] {
                    let vx = edge.x + sign * edge.dx * r;
                    let vy = edge.y + sign * edge.dy * r;
                    if vx >= 0.0 && vx < x_limit && vy >= 0.0 && vy < y_limit {
                        bilinear_add(&mut accum, stride, vx, vy, edge.magnitude);
                    }
                }
            }
        }

        let accum = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(width, height, accum)?;
        let smoothed = if self.accum_sigma > 0.0 {
            imageproc::filter::gaussian_blur_f32(&accum, self.accum_sigma)
        } else {
            accum
        };
        let (peak, &score) = smoothed
            .as_raw()
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))?;
        if score <= 0.0 {
            return None;
        }
        Some(((peak % stride) as f32, (peak / stride) as f32))
    }

    /// Most common whole-pixel edge distance from `center` inside the window.
    fn rim_distance(&self, edges: &[Edge], center: (f32, f32)) -> Option<f32> {
        let max = self.max_radius as usize;
        let mut histogram = vec![0usize; max + 1];
        for edge in edges {
            let distance = (edge.x - center.0).hypot(edge.y - center.1).round() as usize;
            if distance <= max {
                histogram[distance] += 1;
            }
        }
        let (radius, &votes) = histogram
            .iter()
            .enumerate()
            .skip(self.min_radius as usize)
            .max_by_key(|&(radius, &votes)| (votes, std::cmp::Reverse(radius)))?;
        (votes > 0).then_some(radius as f32)
    }
}

impl CircleFinder for GradientCircleFinder {
    fn propose_circle(&mut self, frame: &Frame) -> Option<(i32, i32, i32)> {
        if self.min_radius < 1 || self.max_radius < self.min_radius {
            return None;
        }
        let gray = gray_image(frame)?;
        let (width, height) = gray.dimensions();
        if width < 4 || height < 4 {
            return None;
        }

        let edges = self.edges(&gray);
        if edges.is_empty() {
            return None;
        }
        let rough = self.vote_center(&edges, width, height)?;
        let rim = self.rim_distance(&edges, rough)?;

        let ring: Vec<&Edge> = edges
            .iter()
            .filter(|edge| {
                ((edge.x - rough.0).hypot(edge.y - rough.1) - rim).abs() <= self.rim_band
            })
            .collect();
        let circumference = std::f32::consts::TAU * rim;
        if (ring.len() as f32) < self.min_support * circumference {
            return None;
        }

        let count = ring.len() as f32;
        let center_x = ring.iter().map(|edge| edge.x).sum::<f32>() / count;
        let center_y = ring.iter().map(|edge| edge.y).sum::<f32>() / count;
        let radius = ring
            .iter()
            .map(|edge| (edge.x - center_x).hypot(edge.y - center_y))
            .sum::<f32>()
            / count;
        // A partial arc refines to a centre near itself.
        if (radius - rim).abs() > self.rim_band {
            return None;
        }

        Some((
            center_x.round() as i32,
            center_y.round() as i32,
            (radius.round() as i32).clamp(self.min_radius, self.max_radius),
        ))
    }
}
