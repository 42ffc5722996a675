use image::{GrayImage, RgbImage};

use crate::{
    error::Result,
    types::{Detection, LineSegment},
};

/// Trait for turning a raw lot image into a binary edge map
pub trait EdgePreprocessor: Send + Sync {
    /// Produce a single-channel 0/255 map with the input's dimensions
    fn preprocess(&self, image: &RgbImage) -> Result<GrayImage>;
}

/// Trait for straight-line extraction over an edge map
pub trait SegmentDetector: Send + Sync {
    /// Extract segments regardless of their orientation
    fn detect_segments(&self, edges: &GrayImage) -> Result<Vec<LineSegment>>;
}

/// Main trait for stall detection strategies
pub trait StallDetector: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Detect stalls in one image; finding nothing is not an error
    fn detect(&self, image: &RgbImage) -> Result<Detection>;
}
