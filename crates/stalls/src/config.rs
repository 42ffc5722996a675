use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{
    error::{Result, StallError},
    types::Orientation,
};

/// Tunables for every detection stage. Each field falls back to its default
/// when absent from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(default)]
pub struct DetectorConfig {
    pub edges: EdgeConfig,
    pub hough: HoughConfig,
    pub aisles: AisleConfig,
    pub stripes: StripeConfig,
    pub synthesis: SynthesisConfig,
    pub contour: ContourConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EdgeConfig {
    /// Sigma of the pre-Canny smoothing (0.8 matches a 3x3 kernel)
    #[schemars(range(min = 0.1, max = 10.0))]
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 0.8,
            canny_low: 40.0,
            canny_high: 110.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HoughConfig {
    /// Accumulator votes needed before a line is traced
    pub vote_threshold: u32,
    pub min_line_length: u32,
    pub max_line_gap: u32,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            vote_threshold: 80,
            min_line_length: 120,
            max_line_gap: 25,
        }
    }
}

/// Aisle discovery and stripe-window settings for both orientations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AisleConfig {
    /// Maximum distance between consecutive orthogonal midpoints in one aisle
    pub horizontal_cluster_gap: f64,
    pub vertical_cluster_gap: f64,
    /// Segments shorter than this are ignored
    pub horizontal_min_length: f64,
    pub vertical_min_length: f64,
    /// Half-height of the stripe window, in multiples of the aisle thickness
    pub horizontal_window_scale: f64,
    pub vertical_window_scale: f64,
    /// Accepted deviation from the aisle axis, in degrees
    pub angle_tolerance: f64,
    /// Thickness used when no member segment contributes a sample
    pub default_thickness: f64,
}

impl Default for AisleConfig {
    fn default() -> Self {
        Self {
            horizontal_cluster_gap: 14.0,
            vertical_cluster_gap: 18.0,
            horizontal_min_length: 150.0,
            vertical_min_length: 80.0,
            horizontal_window_scale: 1.8,
            vertical_window_scale: 2.0,
            angle_tolerance: 12.0,
            default_thickness: 10.0,
        }
    }
}

/// Settings resolved for a single orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AisleParams {
    pub orientation: Orientation,
    pub cluster_gap: f64,
    pub min_length: f64,
    pub window_scale: f64,
    pub angle_tolerance: f64,
    pub default_thickness: f64,
}

impl AisleConfig {
    pub fn params(&self, orientation: Orientation) -> AisleParams {
        let (cluster_gap, min_length, window_scale) = match orientation {
            Orientation::Horizontal => (
                self.horizontal_cluster_gap,
                self.horizontal_min_length,
                self.horizontal_window_scale,
            ),
            Orientation::Vertical => (
                self.vertical_cluster_gap,
                self.vertical_min_length,
                self.vertical_window_scale,
            ),
        };
        AisleParams {
            orientation,
            cluster_gap,
            min_length,
            window_scale,
            angle_tolerance: self.angle_tolerance,
            default_thickness: self.default_thickness,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StripeConfig {
    /// Normalised profile level above which a sample counts as stripe
    #[schemars(range(min = 0.0, max = 1.0))]
    pub threshold: f64,
    /// Length of the 1-D Gaussian applied to the profile (odd)
    pub kernel_length: usize,
    /// Boundary pairs closer than this are discarded as slivers
    pub min_stall_span: f64,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            threshold: 0.35,
            kernel_length: 31,
            min_stall_span: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SynthesisConfig {
    #[schemars(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self { confidence: 0.7 }
    }
}

/// Settings for the contour-based fallback detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ContourConfig {
    pub blur_sigma: f32,
    /// Radius of the local-mean window used for adaptive thresholding
    pub block_radius: u32,
    pub close_iterations: u32,
    pub erode_iterations: u32,
    pub min_area: f64,
    pub max_area: f64,
    /// Douglas-Peucker tolerance as a fraction of the contour perimeter
    pub approx_epsilon_ratio: f64,
    #[schemars(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            block_radius: 7,
            close_iterations: 2,
            erode_iterations: 1,
            min_area: 350.0,
            max_area: 4000.0,
            approx_epsilon_ratio: 0.02,
            confidence: 0.6,
        }
    }
}

impl DetectorConfig {
    pub fn aisle(&self, orientation: Orientation) -> AisleParams {
        self.aisles.params(orientation)
    }

    /// Get the JSON schema for the configuration file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DetectorConfig)
    }

    /// Reject tunables outside their meaningful ranges
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(StallError::InvalidParameter(message));

        if !(self.stripes.threshold > 0.0 && self.stripes.threshold <= 1.0) {
            return invalid(format!(
                "stripe threshold must be in (0, 1], got {}",
                self.stripes.threshold
            ));
        }
        if self.stripes.kernel_length == 0 || self.stripes.kernel_length % 2 == 0 {
            return invalid(format!(
                "stripe kernel length must be odd, got {}",
                self.stripes.kernel_length
            ));
        }
        for orientation in Orientation::iter() {
            let aisle = self.aisle(orientation);
            if !(aisle.cluster_gap > 0.0) {
                return invalid(format!(
                    "{orientation} cluster gap must be positive, got {}",
                    aisle.cluster_gap
                ));
            }
            if !(aisle.window_scale > 0.0) {
                return invalid(format!(
                    "{orientation} window scale must be positive, got {}",
                    aisle.window_scale
                ));
            }
        }
        if !(self.edges.blur_sigma > 0.0) || self.edges.canny_low > self.edges.canny_high {
            return invalid(format!(
                "edge settings out of range: sigma {}, canny {}..{}",
                self.edges.blur_sigma, self.edges.canny_low, self.edges.canny_high
            ));
        }
        if self.hough.vote_threshold == 0 {
            return invalid("hough vote threshold must be positive".to_string());
        }
        for confidence in [self.synthesis.confidence, self.contour.confidence] {
            if !(0.0..=1.0).contains(&confidence) {
                return invalid(format!("confidence must be in [0, 1], got {confidence}"));
            }
        }
        if self.contour.min_area > self.contour.max_area {
            return invalid(format!(
                "contour area range is empty: {}..{}",
                self.contour.min_area, self.contour.max_area
            ));
        }
        Ok(())
    }
}
