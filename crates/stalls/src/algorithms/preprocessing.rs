use image::{GrayImage, RgbImage};

use crate::{config::EdgeConfig, error::Result, traits::EdgePreprocessor};

/// Grayscale, Gaussian smoothing, then Canny edge detection
#[derive(Debug, Clone)]
pub struct CannyEdgePreprocessor {
    pub blur_sigma: f32,
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for CannyEdgePreprocessor {
    fn default() -> Self {
        Self::from(&EdgeConfig::default())
    }
}

impl From<&EdgeConfig> for CannyEdgePreprocessor {
    fn from(config: &EdgeConfig) -> Self {
        Self {
            blur_sigma: config.blur_sigma,
            low_threshold: config.canny_low,
            high_threshold: config.canny_high,
        }
    }
}

impl EdgePreprocessor for CannyEdgePreprocessor {
    fn preprocess(&self, image: &RgbImage) -> Result<GrayImage> {
        let gray = image::imageops::grayscale(image);
        let blurred = imageproc::filter::gaussian_blur_f32(&gray, self.blur_sigma);
        // imageproc's canny uses Sobel gradients with an L2 magnitude
        Ok(imageproc::edges::canny(
            &blurred,
            self.low_threshold,
            self.high_threshold,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_blank_image_has_no_edges() {
        let image = RgbImage::new(64, 48);
        let edges = CannyEdgePreprocessor::default().preprocess(&image).unwrap();

        assert_eq!(edges.dimensions(), (64, 48));
        assert!(edges.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_bright_rectangle_produces_binary_edges() {
        let mut image = RgbImage::new(80, 80);
        for y in 20..60 {
            for x in 20..60 {
                image.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }

        let edges = CannyEdgePreprocessor::default().preprocess(&image).unwrap();

        assert!(edges.pixels().any(|p| p[0] == 255));
        assert!(edges.pixels().all(|p| p[0] == 0 || p[0] == 255));
        // Flat interior carries no gradient
        assert_eq!(edges.get_pixel(40, 40)[0], 0);
    }
}
