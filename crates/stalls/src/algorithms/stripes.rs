use image::GrayImage;
use tracing::debug;

use lot_common::StallBox;

use crate::{
    config::StripeConfig,
    types::{AisleBand, Orientation},
};

/// Pixel window around an aisle band, end-exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripeWindow {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl StripeWindow {
    /// Window spanning the band's axis and `fixed ± scale * thickness` across
    /// it, clamped to the image. `None` when nothing is left after clamping.
    pub fn around(band: &AisleBand, window_scale: f64, width: u32, height: u32) -> Option<Self> {
        let half = band.thickness * window_scale;
        let fixed = band.fixed_coordinate;
        let (axis_limit, cross_limit) = match band.orientation {
            Orientation::Horizontal => (width as f64, height as f64),
            Orientation::Vertical => (height as f64, width as f64),
        };

        // Truncation toward zero mirrors integer pixel indexing
        let cross_start = (fixed - half).max(0.0) as i64;
        let cross_end = (fixed + half).min(cross_limit) as i64;
        let axis_start = band.span_start.max(0.0) as i64;
        let axis_end = band.span_end.min(axis_limit) as i64;

        if cross_end <= cross_start || axis_end <= axis_start {
            return None;
        }

        let window = match band.orientation {
            Orientation::Horizontal => Self {
                x0: axis_start as u32,
                y0: cross_start as u32,
                x1: axis_end as u32,
                y1: cross_end as u32,
            },
            Orientation::Vertical => Self {
                x0: cross_start as u32,
                y0: axis_start as u32,
                x1: cross_end as u32,
                y1: axis_end as u32,
            },
        };
        Some(window)
    }
}

/// Sum edge intensities across the aisle, one sample per along-axis pixel
pub fn axis_profile(edges: &GrayImage, window: &StripeWindow, orientation: Orientation) -> Vec<f64> {
    match orientation {
        Orientation::Horizontal => (window.x0..window.x1)
            .map(|x| {
                (window.y0..window.y1)
                    .map(|y| edges.get_pixel(x, y)[0] as f64)
                    .sum::<f64>()
            })
            .collect(),
        Orientation::Vertical => (window.y0..window.y1)
            .map(|y| {
                (window.x0..window.x1)
                    .map(|x| edges.get_pixel(x, y)[0] as f64)
                    .sum::<f64>()
            })
            .collect(),
    }
}

/// Normalised 1-D Gaussian; sigma derived from the length the usual way
/// (`0.3 * ((len - 1) / 2 - 1) + 0.8`, i.e. 5.0 for 31 taps)
pub fn gaussian_kernel(length: usize) -> Vec<f64> {
    let sigma = 0.3 * ((length as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (length as f64 - 1.0) / 2.0;
    let weights: Vec<f64> = (0..length)
        .map(|i| {
            let offset = i as f64 - center;
            (-(offset * offset) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| w / total).collect()
}

/// Mirror an out-of-range index without repeating the edge sample
pub fn reflect_101(index: i64, len: usize) -> usize {
    let len = len as i64;
    if len <= 1 {
        return 0;
    }
    let mut index = index;
    while index < 0 || index >= len {
        index = if index < 0 { -index } else { 2 * (len - 1) - index };
    }
    index as usize
}

/// Convolve the profile with `kernel`, reflecting at both borders
pub fn smooth_profile(profile: &[f64], kernel: &[f64]) -> Vec<f64> {
    if profile.is_empty() {
        return Vec::new();
    }
    let radius = (kernel.len() / 2) as i64;
    (0..profile.len() as i64)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| weight * profile[reflect_101(i + k as i64 - radius, profile.len())])
                .sum::<f64>()
        })
        .collect()
}

/// Maximal runs of `true` as `[start, end)` pairs; a run still open at the
/// end closes at `mask.len()`
pub fn find_runs(mask: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut run_start = None;

    for (index, &on) in mask.iter().enumerate() {
        match (on, run_start) {
            (true, None) => run_start = Some(index),
            (false, Some(start)) => {
                runs.push((start, index));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        runs.push((start, mask.len()));
    }

    runs
}

/// Profile start, each run midpoint, then the last index, ascending
pub fn stripe_boundaries(runs: &[(usize, usize)], len: usize) -> Vec<f64> {
    let mut boundaries = Vec::with_capacity(runs.len() + 2);
    boundaries.push(0.0);
    boundaries.extend(runs.iter().map(|&(start, end)| (start + end) as f64 / 2.0));
    boundaries.push(len.saturating_sub(1) as f64);
    boundaries.sort_by(f64::total_cmp);
    boundaries
}

/// Splits aisle bands into stall boxes using the periodic stripe signal
#[derive(Debug, Clone)]
pub struct StripeSegmenter {
    pub threshold: f64,
    pub kernel: Vec<f64>,
    pub min_stall_span: f64,
}

impl Default for StripeSegmenter {
    fn default() -> Self {
        Self::from(&StripeConfig::default())
    }
}

impl From<&StripeConfig> for StripeSegmenter {
    fn from(config: &StripeConfig) -> Self {
        Self {
            threshold: config.threshold,
            kernel: gaussian_kernel(config.kernel_length),
            min_stall_span: config.min_stall_span,
        }
    }
}

impl StripeSegmenter {
    /// Stall boxes for one band, in along-axis order. Bands without at least
    /// two stripe runs yield nothing.
    pub fn segment(&self, edges: &GrayImage, band: &AisleBand, window_scale: f64) -> Vec<StallBox> {
        let Some(window) = StripeWindow::around(band, window_scale, edges.width(), edges.height())
        else {
            return Vec::new();
        };

        let profile = smooth_profile(&axis_profile(edges, &window, band.orientation), &self.kernel);
        let peak = profile.iter().copied().fold(0.0f64, f64::max);
        if peak <= 0.0 {
            return Vec::new();
        }

        let mask: Vec<bool> = profile.iter().map(|v| v / peak > self.threshold).collect();
        let runs = find_runs(&mask);
        if runs.len() < 2 {
            debug!(
                orientation = %band.orientation,
                fixed = band.fixed_coordinate,
                runs = runs.len(),
                "too few stripes, skipping aisle"
            );
            return Vec::new();
        }

        let boundaries = stripe_boundaries(&runs, mask.len());
        boundaries
            .windows(2)
            .filter(|pair| pair[1] - pair[0] >= self.min_stall_span)
            .filter_map(|pair| {
                let (low, high) = (pair[0], pair[1]);
                match band.orientation {
                    Orientation::Horizontal => StallBox::new(
                        (window.x0 as f64 + low) as i32,
                        window.y0 as i32,
                        (window.x0 as f64 + high) as i32,
                        window.y1 as i32,
                    ),
                    Orientation::Vertical => StallBox::new(
                        window.x0 as i32,
                        (window.y0 as f64 + low) as i32,
                        window.x1 as i32,
                        (window.y0 as f64 + high) as i32,
                    ),
                }
                .ok()
            })
            .collect()
    }
}
