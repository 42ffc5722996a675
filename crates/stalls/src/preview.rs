use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_line_segment_mut, draw_polygon_mut},
    point::Point,
};
use tracing::{debug, warn};

use lot_common::{StallRecord, StallStatus};

use crate::error::Result;

pub const OPEN_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
pub const FILLED_COLOR: Rgb<u8> = Rgb([200, 0, 0]);
pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

fn fill_color(status: StallStatus) -> Rgb<u8> {
    match status {
        StallStatus::Open => OPEN_COLOR,
        StallStatus::Filled => FILLED_COLOR,
    }
}

/// Copy of `image` with every stall filled by status and outlined in black
pub fn render_preview(image: &RgbImage, stalls: &[StallRecord]) -> RgbImage {
    let mut canvas = image.clone();

    for stall in stalls {
        let points: Vec<Point<i32>> = stall.polygon.iter().map(|&[x, y]| Point::new(x, y)).collect();
        // The fill routine rejects rings that repeat their first point
        if points.first() == points.last() {
            warn!(id = %stall.id, "skipping degenerate stall polygon");
            continue;
        }
        draw_polygon_mut(&mut canvas, &points, fill_color(stall.status));

        for (start, end) in points.iter().zip(points.iter().cycle().skip(1)) {
            draw_line_segment_mut(
                &mut canvas,
                (start.x as f32, start.y as f32),
                (end.x as f32, end.y as f32),
                OUTLINE_COLOR,
            );
        }
    }

    canvas
}

/// Render and save a preview, creating the output directory if needed
pub fn save_preview(image: &RgbImage, stalls: &[StallRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    render_preview(image, stalls).save(path)?;
    debug!(path = %path.display(), stalls = stalls.len(), "preview saved");
    Ok(())
}
