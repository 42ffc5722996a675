use geo_types::{Coord, LineString, Polygon};
use image::{GrayImage, Luma, RgbImage};
use imageproc::{
    contours::{BorderType, Contour},
    distance_transform::Norm,
    point::Point,
};
use tracing::debug;

use lot_common::{stall_id, StallRecord};

use crate::{
    algorithms::synthesis::FIRST_STALL_ID,
    config::ContourConfig,
    error::Result,
    traits::StallDetector,
    types::Detection,
};

/// Single-pass detector that treats closed blobs of line paint as stalls.
///
/// Cruder than the aisle-based detector: each external contour whose area is
/// plausible for one stall is reduced to its minimum-area rectangle, which may
/// be rotated. Records carry a lower confidence accordingly.
#[derive(Debug, Clone)]
pub struct ContourStallDetector {
    pub config: ContourConfig,
    /// Subtracted from the local mean before comparing each pixel
    pub threshold_offset: u8,
}

impl Default for ContourStallDetector {
    fn default() -> Self {
        Self::new(ContourConfig::default())
    }
}

impl ContourStallDetector {
    pub fn new(config: ContourConfig) -> Self {
        Self {
            config,
            threshold_offset: 4,
        }
    }

    /// Mark pixels darker than their neighbourhood mean
    fn binarize(&self, gray: &GrayImage) -> GrayImage {
        let radius = self.config.block_radius;
        let local_mean = imageproc::filter::box_filter(gray, radius, radius);

        let mut binary = GrayImage::new(gray.width(), gray.height());
        for (x, y, pixel) in gray.enumerate_pixels() {
            let limit = local_mean.get_pixel(x, y)[0].saturating_sub(self.threshold_offset);
            let value = if pixel[0] > limit { 0 } else { 255 };
            binary.put_pixel(x, y, Luma([value]));
        }
        binary
    }

    fn clean(&self, binary: &GrayImage) -> GrayImage {
        let mut cleaned = binary.clone();
        if self.config.close_iterations > 0 {
            let k = self.config.close_iterations.min(u8::MAX as u32) as u8;
            cleaned = imageproc::morphology::close(&cleaned, Norm::LInf, k);
        }
        if self.config.erode_iterations > 0 {
            let k = self.config.erode_iterations.min(u8::MAX as u32) as u8;
            cleaned = imageproc::morphology::erode(&cleaned, Norm::LInf, k);
        }
        cleaned
    }

    /// Reduce one contour to a stall polygon, or `None` if it is implausible
    fn contour_to_polygon(&self, contour: &Contour<i32>) -> Option<[[i32; 2]; 4]> {
        use geo::{Area, EuclideanLength, Simplify};

        let coords: Vec<Coord<f64>> = contour
            .points
            .iter()
            .map(|p| Coord { x: p.x as f64, y: p.y as f64 })
            .collect();
        let polygon = Polygon::new(LineString::new(coords), vec![]);

        let area = polygon.unsigned_area();
        if area < self.config.min_area || area > self.config.max_area {
            return None;
        }

        let epsilon = self.config.approx_epsilon_ratio * polygon.exterior().euclidean_length();
        let approx = polygon.simplify(&epsilon);
        // Closed ring repeats its first coordinate
        let vertices: Vec<Point<i32>> = approx
            .exterior()
            .coords()
            .skip(1)
            .map(|c| Point::new(c.x.round() as i32, c.y.round() as i32))
            .collect();
        if vertices.len() < 4 {
            return None;
        }

        let corners = imageproc::geometry::min_area_rect(&vertices);
        Some(corners.map(|p| [p.x, p.y]))
    }
}

impl StallDetector for ContourStallDetector {
    fn name(&self) -> &'static str {
        "contour"
    }

    fn detect(&self, image: &RgbImage) -> Result<Detection> {
        let gray = image::imageops::grayscale(image);
        let blurred = imageproc::filter::gaussian_blur_f32(&gray, self.config.blur_sigma);
        let cleaned = self.clean(&self.binarize(&blurred));

        let contours = imageproc::contours::find_contours::<i32>(&cleaned);
        let external: Vec<&Contour<i32>> = contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .collect();

        let stalls: Vec<StallRecord> = external
            .iter()
            .filter_map(|contour| self.contour_to_polygon(contour))
            .zip(FIRST_STALL_ID..)
            .map(|(polygon, id)| StallRecord::from_polygon(stall_id(id), polygon, self.config.confidence))
            .collect();

        debug!(
            contours = contours.len(),
            external = external.len(),
            stalls = stalls.len(),
            "contour detection finished"
        );

        Ok(Detection {
            stalls,
            horizontal_aisles: 0,
            vertical_aisles: 0,
            image_width: image.width(),
            image_height: image.height(),
        })
    }
}
