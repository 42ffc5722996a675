use crate::{
    algorithms::{CannyEdgePreprocessor, ProbabilisticHough, StripeSegmenter},
    config::DetectorConfig,
    error::Result,
    pipeline::StructureAwareDetector,
    traits::{EdgePreprocessor, SegmentDetector},
    types::Orientation,
};

/// Builder for the structure-aware detector with a fluent API
pub struct PipelineBuilder {
    config: DetectorConfig,
    preprocessor: Option<Box<dyn EdgePreprocessor>>,
    segment_detector: Option<Box<dyn SegmentDetector>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder with default settings
    pub fn new() -> Self {
        Self {
            config: DetectorConfig::default(),
            preprocessor: None,
            segment_detector: None,
        }
    }

    /// Replace every tunable with `config`
    pub fn with_config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the edge preprocessor (replaces the Canny default)
    pub fn set_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: EdgePreprocessor + 'static,
    {
        self.preprocessor = Some(Box::new(preprocessor));
        self
    }

    /// Set the segment detector (replaces the Hough default)
    pub fn set_segment_detector<D>(mut self, detector: D) -> Self
    where
        D: SegmentDetector + 'static,
    {
        self.segment_detector = Some(Box::new(detector));
        self
    }

    pub fn with_cluster_gap(mut self, orientation: Orientation, gap: f64) -> Self {
        match orientation {
            Orientation::Horizontal => self.config.aisles.horizontal_cluster_gap = gap,
            Orientation::Vertical => self.config.aisles.vertical_cluster_gap = gap,
        }
        self
    }

    pub fn with_stripe_threshold(mut self, threshold: f64) -> Self {
        self.config.stripes.threshold = threshold;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Build the detector, filling in default stages where none were set.
    ///
    /// Fails with [`InvalidParameter`](crate::error::StallError::InvalidParameter) when the configuration is
    /// out of range.
    pub fn build(self) -> Result<StructureAwareDetector> {
        self.config.validate()?;
        let DetectorConfig {
            edges,
            hough,
            aisles,
            stripes,
            synthesis,
            ..
        } = self.config;

        let preprocessor = self
            .preprocessor
            .unwrap_or_else(|| Box::new(CannyEdgePreprocessor::from(&edges)));
        let segment_detector = self
            .segment_detector
            .unwrap_or_else(|| Box::new(ProbabilisticHough::from(&hough)));

        Ok(StructureAwareDetector::new(
            preprocessor,
            segment_detector,
            StripeSegmenter::from(&stripes),
            aisles,
            synthesis.confidence,
        ))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
