//! # Stall Geometry Extraction Library
//!
//! Finds parking stalls in a top-down lot image and keeps them in a per-lot
//! JSON store. The default detector is structure-aware: it locates aisles
//! from long painted edges, reads the stripe pattern along each aisle and
//! slices it into stall rectangles.
//!
//! ## Core Features
//!
//! - **Trait-based stages**: swap the edge preprocessor or segment detector
//! - **Deterministic output**: same image and settings, same stalls
//! - **Safe store updates**: one lot is replaced, every other lot is left alone
//! - **Exports**: preview overlays and GeoJSON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stalls::{process_lot, StructureAwareDetector};
//!
//! let detector = StructureAwareDetector::builder().build()?;
//! let detection = process_lot(&detector, "lot.png", "data/stalls.json", "north-lot")?;
//! println!("{} stalls", detection.stalls.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use stalls::{algorithms::*, Orientation, StructureAwareDetector};
//!
//! let detector = StructureAwareDetector::builder()
//!     .set_preprocessor(CannyEdgePreprocessor { blur_sigma: 1.2, ..Default::default() })
//!     .with_cluster_gap(Orientation::Vertical, 24.0)
//!     .with_stripe_threshold(0.4)
//!     .build()?;
//! # Ok::<(), stalls::StallError>(())
//! ```

use std::path::Path;

use image::RgbImage;
use tracing::{debug, info};

pub mod algorithms;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod preview;
pub mod store;
pub mod traits;
pub mod types;

pub use config::DetectorConfig;
pub use error::{Result, StallError};
pub use io::*;
pub use pipeline::{builder::PipelineBuilder, StructureAwareDetector};
pub use preview::{render_preview, save_preview};
pub use store::{upsert_lot, StallStore};
pub use traits::*;
pub use types::{AisleBand, Detection, LineSegment, Orientation};

/// Open an image from disk as 8-bit RGB
pub fn load_image(path: impl AsRef<Path>) -> Result<RgbImage> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| StallError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgb8())
}

/// Detect stalls in an already decoded image and store them as `lot_id`.
///
/// The returned detection carries the stalls in the order they were written.
/// Nothing is written if the store is corrupt.
pub fn process_image(
    detector: &dyn StallDetector,
    image: &RgbImage,
    store_path: impl AsRef<Path>,
    lot_id: &str,
) -> Result<Detection> {
    info!(
        detector = detector.name(),
        width = image.width(),
        height = image.height(),
        lot_id,
        "detecting stalls"
    );
    let mut detection = detector.detect(image)?;
    detection.stalls = upsert_lot(store_path, lot_id, detection.stalls)?;
    Ok(detection)
}

/// Load `image_path` and run [`process_image`] on it.
///
/// Nothing is written if the image cannot be read.
pub fn process_lot(
    detector: &dyn StallDetector,
    image_path: impl AsRef<Path>,
    store_path: impl AsRef<Path>,
    lot_id: &str,
) -> Result<Detection> {
    let image = load_image(&image_path)?;
    debug!(path = %image_path.as_ref().display(), "image loaded");
    process_image(detector, &image, store_path, lot_id)
}
