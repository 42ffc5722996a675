pub mod aisles;
pub mod contour;
pub mod hough;
pub mod lines;
pub mod preprocessing;
pub mod stripes;
pub mod synthesis;

pub use aisles::cluster_aisles;
pub use contour::ContourStallDetector;
pub use hough::ProbabilisticHough;
pub use lines::classify_segments;
pub use preprocessing::CannyEdgePreprocessor;
pub use stripes::{StripeSegmenter, StripeWindow};
pub use synthesis::synthesize_stalls;
