use image::GrayImage;
use tracing::debug;

use crate::{config::HoughConfig, error::Result, traits::SegmentDetector, types::LineSegment};

/// One-degree angular resolution over a half turn
const ANGLE_BINS: usize = 180;
/// Fixed-point precision used while tracing along a line
const SHIFT: u32 = 16;

/// Progressive probabilistic Hough transform producing finite segments.
///
/// Edge points are visited in raster order, which keeps the output fully
/// deterministic for a given edge map. Each point votes into a (theta, rho)
/// accumulator; once a bin reaches `vote_threshold` the line is traced through
/// the edge mask in both directions, tolerating gaps of up to `max_line_gap`
/// pixels. Traced points are removed from the mask, and when the traced
/// segment is at least `min_line_length` long their votes are withdrawn too.
#[derive(Debug, Clone)]
pub struct ProbabilisticHough {
    pub vote_threshold: u32,
    pub min_line_length: u32,
    pub max_line_gap: u32,
}

impl Default for ProbabilisticHough {
    fn default() -> Self {
        Self::from(&HoughConfig::default())
    }
}

impl From<&HoughConfig> for ProbabilisticHough {
    fn from(config: &HoughConfig) -> Self {
        Self {
            vote_threshold: config.vote_threshold,
            min_line_length: config.min_line_length,
            max_line_gap: config.max_line_gap,
        }
    }
}

struct Accumulator {
    votes: Vec<i32>,
    rho_bins: usize,
    /// (cos, sin) per angle bin
    trig: [(f32, f32); ANGLE_BINS],
}

impl Accumulator {
    fn new(width: usize, height: usize) -> Self {
        let rho_bins = (width + height) * 2 + 1;
        let mut trig = [(0.0f32, 0.0f32); ANGLE_BINS];
        for (n, entry) in trig.iter_mut().enumerate() {
            let theta = (n as f64).to_radians();
            *entry = (theta.cos() as f32, theta.sin() as f32);
        }

        Self {
            votes: vec![0; rho_bins * ANGLE_BINS],
            rho_bins,
            trig,
        }
    }

    fn cell(&self, x: i64, y: i64, n: usize) -> usize {
        let (cos_t, sin_t) = self.trig[n];
        let rho = (x as f32 * cos_t + y as f32 * sin_t).round() as i64;
        let offset = (self.rho_bins as i64 - 1) / 2;
        n * self.rho_bins + (rho + offset) as usize
    }

    /// Add a point's votes and return the strongest (votes, angle bin)
    fn vote(&mut self, x: i64, y: i64) -> (i32, usize) {
        let mut best = (i32::MIN, 0);
        for n in 0..ANGLE_BINS {
            let cell = self.cell(x, y, n);
            self.votes[cell] += 1;
            if self.votes[cell] > best.0 {
                best = (self.votes[cell], n);
            }
        }
        best
    }

    fn withdraw(&mut self, x: i64, y: i64) {
        for n in 0..ANGLE_BINS {
            let cell = self.cell(x, y, n);
            self.votes[cell] -= 1;
        }
    }
}

/// Binary edge mask with bounds-checked access
struct EdgeMask {
    set: Vec<bool>,
    width: i64,
    height: i64,
}

impl EdgeMask {
    fn from_edges(edges: &GrayImage) -> (Self, Vec<(i64, i64)>) {
        let (width, height) = edges.dimensions();
        let mut set = vec![false; (width * height) as usize];
        let mut points = Vec::new();

        for (x, y, pixel) in edges.enumerate_pixels() {
            if pixel[0] > 0 {
                set[(y * width + x) as usize] = true;
                points.push((x as i64, y as i64));
            }
        }

        let mask = Self {
            set,
            width: width as i64,
            height: height as i64,
        };
        (mask, points)
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn get(&self, x: i64, y: i64) -> bool {
        self.set[(y * self.width + x) as usize]
    }

    fn clear(&mut self, x: i64, y: i64) {
        self.set[(y * self.width + x) as usize] = false;
    }
}

/// Fixed-point walker along the dominant axis of a Hough line
#[derive(Debug, Clone, Copy)]
struct LineWalk {
    origin: (i64, i64),
    step: (i64, i64),
    x_major: bool,
}

impl LineWalk {
    fn new(x: i64, y: i64, (cos_t, sin_t): (f32, f32)) -> Self {
        // Direction along the line is perpendicular to its normal
        let a = -sin_t;
        let b = cos_t;
        let one = (1i64 << SHIFT) as f32;
        let half = 1i64 << (SHIFT - 1);

        if a.abs() > b.abs() {
            Self {
                origin: (x, (y << SHIFT) + half),
                step: (if a > 0.0 { 1 } else { -1 }, (b * one / a.abs()).round() as i64),
                x_major: true,
            }
        } else {
            Self {
                origin: ((x << SHIFT) + half, y),
                step: ((a * one / b.abs()).round() as i64, if b > 0.0 { 1 } else { -1 }),
                x_major: false,
            }
        }
    }

    fn reversed(self) -> Self {
        Self {
            step: (-self.step.0, -self.step.1),
            ..self
        }
    }

    fn pixel(&self, position: (i64, i64)) -> (i64, i64) {
        if self.x_major {
            (position.0, position.1 >> SHIFT)
        } else {
            (position.0 >> SHIFT, position.1)
        }
    }

    fn advance(&self, position: (i64, i64)) -> (i64, i64) {
        (position.0 + self.step.0, position.1 + self.step.1)
    }
}

impl ProbabilisticHough {
    /// Follow the line until the gap budget runs out; returns the last edge pixel
    fn trace_end(&self, mask: &EdgeMask, walk: LineWalk) -> (i64, i64) {
        let mut end = walk.pixel(walk.origin);
        let mut gap = 0;
        let mut position = walk.origin;

        loop {
            let (px, py) = walk.pixel(position);
            if !mask.contains(px, py) {
                break;
            }
            if mask.get(px, py) {
                gap = 0;
                end = (px, py);
            } else {
                gap += 1;
                if gap > self.max_line_gap {
                    break;
                }
            }
            position = walk.advance(position);
        }

        end
    }

    /// Remove the traced points from the mask, withdrawing votes for kept lines
    fn consume(
        &self,
        mask: &mut EdgeMask,
        accumulator: &mut Accumulator,
        walk: LineWalk,
        end: (i64, i64),
        keep: bool,
    ) {
        let mut position = walk.origin;
        loop {
            let (px, py) = walk.pixel(position);
            if !mask.contains(px, py) {
                break;
            }
            if mask.get(px, py) {
                if keep {
                    accumulator.withdraw(px, py);
                }
                mask.clear(px, py);
            }
            if (px, py) == end {
                break;
            }
            position = walk.advance(position);
        }
    }
}

impl SegmentDetector for ProbabilisticHough {
    fn detect_segments(&self, edges: &GrayImage) -> Result<Vec<LineSegment>> {
        let (mut mask, points) = EdgeMask::from_edges(edges);
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let mut accumulator =
            Accumulator::new(edges.width() as usize, edges.height() as usize);
        let min_length = self.min_line_length as i64;
        let mut segments = Vec::new();

        for &(x, y) in &points {
            // Already absorbed by an earlier line
            if !mask.get(x, y) {
                continue;
            }

            let (votes, best) = accumulator.vote(x, y);
            if votes < self.vote_threshold as i32 {
                continue;
            }

            let forward = LineWalk::new(x, y, accumulator.trig[best]);
            let backward = forward.reversed();
            let ends = [
                self.trace_end(&mask, forward),
                self.trace_end(&mask, backward),
            ];

            let keep = (ends[1].0 - ends[0].0).abs() >= min_length
                || (ends[1].1 - ends[0].1).abs() >= min_length;

            for (walk, end) in [(forward, ends[0]), (backward, ends[1])] {
                self.consume(&mut mask, &mut accumulator, walk, end, keep);
            }

            if keep {
                segments.push(LineSegment::new(
                    ends[0].0 as f64,
                    ends[0].1 as f64,
                    ends[1].0 as f64,
                    ends[1].1 as f64,
                ));
            }
        }

        debug!(
            edge_points = points.len(),
            segments = segments.len(),
            "probabilistic hough finished"
        );
        Ok(segments)
    }
}
