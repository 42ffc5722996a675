use crate::{
    config::AisleParams,
    types::{LineSegment, Orientation},
};

/// Whether a segment angle (degrees, `atan2` convention) lies within
/// `tolerance` of the aisle axis for `orientation`
pub fn matches_orientation(angle: f64, orientation: Orientation, tolerance: f64) -> bool {
    let magnitude = angle.abs();
    match orientation {
        Orientation::Horizontal => magnitude < tolerance || (magnitude - 180.0).abs() < tolerance,
        Orientation::Vertical => (magnitude - 90.0).abs() < tolerance,
    }
}

/// Keep the segments that are long enough and run along the requested axis
pub fn classify_segments(segments: &[LineSegment], params: &AisleParams) -> Vec<LineSegment> {
    segments
        .iter()
        .filter(|segment| segment.length() >= params.min_length)
        .filter(|segment| {
            matches_orientation(segment.angle(), params.orientation, params.angle_tolerance)
        })
        .copied()
        .collect()
}
