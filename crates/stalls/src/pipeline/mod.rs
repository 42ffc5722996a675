pub mod builder;

use image::{GrayImage, RgbImage};
use tracing::{debug, info};

use lot_common::StallRecord;

use crate::{
    algorithms::{
        aisles::cluster_aisles,
        lines::classify_segments,
        stripes::StripeSegmenter,
        synthesis::{synthesize_stalls, FIRST_STALL_ID},
    },
    config::AisleConfig,
    error::Result,
    traits::{EdgePreprocessor, SegmentDetector, StallDetector},
    types::{AisleBand, Detection, LineSegment, Orientation},
};

/// Aisle-aware detector: edges, lines, aisle bands, stripes, then stalls
pub struct StructureAwareDetector {
    preprocessor: Box<dyn EdgePreprocessor>,
    segment_detector: Box<dyn SegmentDetector>,
    segmenter: StripeSegmenter,
    aisles: AisleConfig,
    confidence: f64,
}

impl StructureAwareDetector {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(
        preprocessor: Box<dyn EdgePreprocessor>,
        segment_detector: Box<dyn SegmentDetector>,
        segmenter: StripeSegmenter,
        aisles: AisleConfig,
        confidence: f64,
    ) -> Self {
        Self {
            preprocessor,
            segment_detector,
            segmenter,
            aisles,
            confidence,
        }
    }

    /// Aisle bands of one orientation, in discovery order
    pub fn find_aisles(&self, segments: &[LineSegment], orientation: Orientation) -> Vec<AisleBand> {
        let params = self.aisles.params(orientation);
        let candidates = classify_segments(segments, &params);
        cluster_aisles(&candidates, &params)
    }

    /// Run every stage after edge detection.
    ///
    /// Ids are numbered across all aisles: horizontal aisles first, then
    /// vertical ones, each in discovery order.
    pub fn detect_in_edges(&self, edges: &GrayImage) -> Result<Detection> {
        let segments = self.segment_detector.detect_segments(edges)?;
        let horizontal = self.find_aisles(&segments, Orientation::Horizontal);
        let vertical = self.find_aisles(&segments, Orientation::Vertical);

        let mut stalls: Vec<StallRecord> = Vec::new();
        let mut next_id = FIRST_STALL_ID;

        for band in horizontal.iter().chain(&vertical) {
            let window_scale = self.aisles.params(band.orientation).window_scale;
            let boxes = self.segmenter.segment(edges, band, window_scale);
            let (records, following) = synthesize_stalls(&boxes, next_id, self.confidence);
            debug!(
                orientation = %band.orientation,
                fixed = band.fixed_coordinate,
                span = band.span_length(),
                stalls = records.len(),
                "sliced aisle"
            );
            stalls.extend(records);
            next_id = following;
        }

        Ok(Detection {
            stalls,
            horizontal_aisles: horizontal.len(),
            vertical_aisles: vertical.len(),
            image_width: edges.width(),
            image_height: edges.height(),
        })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "StructureAwareDetector: gaps {}/{}, stripe threshold {}",
            self.aisles.horizontal_cluster_gap,
            self.aisles.vertical_cluster_gap,
            self.segmenter.threshold
        )
    }
}

impl StallDetector for StructureAwareDetector {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn detect(&self, image: &RgbImage) -> Result<Detection> {
        let edges = self.preprocessor.preprocess(image)?;
        let detection = self.detect_in_edges(&edges)?;
        info!(
            horizontal_aisles = detection.horizontal_aisles,
            vertical_aisles = detection.vertical_aisles,
            stalls = detection.stalls.len(),
            "structure-aware detection finished"
        );
        Ok(detection)
    }
}
