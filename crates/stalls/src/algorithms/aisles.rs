use tracing::debug;

use crate::{
    config::AisleParams,
    types::{AisleBand, LineSegment},
};

/// Sequentially band sorted values and return each band's mean.
///
/// A value joins the current band when it is within `gap` of the band's last
/// accepted value, so long chains of close values form a single band.
pub fn cluster_positions(values: &[f64], gap: f64) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut centers = Vec::new();
    let mut current: Vec<f64> = Vec::new();

    for value in sorted {
        if let Some(&last) = current.last() {
            if value - last > gap {
                centers.push(mean(&current));
                current.clear();
            }
        }
        current.push(value);
    }
    if !current.is_empty() {
        centers.push(mean(&current));
    }

    centers
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median, averaging the two middle samples for even counts
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Group classified segments into aisle bands.
///
/// Band positions come from [`cluster_positions`] over the segments'
/// orthogonal midpoints. A segment belongs to a band when its midpoint lies
/// within the cluster gap of the band position; the band's span and thickness
/// are taken from those members.
pub fn cluster_aisles(segments: &[LineSegment], params: &AisleParams) -> Vec<AisleBand> {
    let orientation = params.orientation;
    let midpoints: Vec<f64> = segments
        .iter()
        .map(|segment| segment.orthogonal_midpoint(orientation))
        .collect();

    let bands: Vec<AisleBand> = cluster_positions(&midpoints, params.cluster_gap)
        .into_iter()
        .filter_map(|center| {
            let mut span_start = f64::INFINITY;
            let mut span_end = f64::NEG_INFINITY;
            let mut thickness_samples = Vec::new();

            for (segment, &midpoint) in segments.iter().zip(&midpoints) {
                if (midpoint - center).abs() > params.cluster_gap {
                    continue;
                }
                let (low, high) = segment.axis_extent(orientation);
                span_start = span_start.min(low);
                span_end = span_end.max(high);
                thickness_samples.push(segment.perpendicular_extent(orientation));
            }

            let thickness = median(&thickness_samples).unwrap_or(params.default_thickness);
            AisleBand::new(orientation, span_start, span_end, center, thickness)
        })
        .collect();

    debug!(
        %orientation,
        segments = segments.len(),
        aisles = bands.len(),
        "clustered aisles"
    );
    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AisleConfig, types::Orientation};

    #[test]
    fn test_cluster_positions_chains_on_last_value() {
        // 0 -> 10 -> 20 chain even though 20 is more than 14 from the mean
        let centers = cluster_positions(&[20.0, 0.0, 10.0, 50.0, 55.0], 14.0);
        assert_eq!(centers, vec![10.0, 52.5]);
    }

    #[test]
    fn test_cluster_positions_edge_cases() {
        assert!(cluster_positions(&[], 14.0).is_empty());
        assert_eq!(cluster_positions(&[7.0], 14.0), vec![7.0]);
        // Exactly `gap` apart still joins
        assert_eq!(cluster_positions(&[0.0, 14.0], 14.0), vec![7.0]);
        assert_eq!(cluster_positions(&[0.0, 14.5], 14.0), vec![0.0, 14.5]);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn test_horizontal_bands() {
        let segments = vec![
            LineSegment::new(10.0, 100.0, 300.0, 104.0),
            LineSegment::new(40.0, 108.0, 350.0, 106.0),
            LineSegment::new(0.0, 300.0, 200.0, 300.0),
        ];
        let params = AisleConfig::default().params(Orientation::Horizontal);

        let bands = cluster_aisles(&segments, &params);

        assert_eq!(bands.len(), 2);
        let first = bands[0];
        assert_eq!(first.orientation, Orientation::Horizontal);
        assert_eq!(first.span_start, 10.0);
        assert_eq!(first.span_end, 350.0);
        assert_eq!(first.fixed_coordinate, 104.5);
        assert_eq!(first.thickness, 3.0);

        let second = bands[1];
        assert_eq!(second.fixed_coordinate, 300.0);
        assert_eq!(second.thickness, 0.0);
    }

    #[test]
    fn test_vertical_bands_use_x_midpoints() {
        let segments = vec![
            LineSegment::new(50.0, 10.0, 54.0, 200.0),
            LineSegment::new(60.0, 0.0, 60.0, 150.0),
        ];
        let params = AisleConfig::default().params(Orientation::Vertical);

        let bands = cluster_aisles(&segments, &params);

        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].span_start, 0.0);
        assert_eq!(bands[0].span_end, 200.0);
        assert_eq!(bands[0].fixed_coordinate, 56.0);
        assert_eq!(bands[0].thickness, 2.0);
    }

    #[test]
    fn test_zero_span_band_is_dropped() {
        // A perfectly vertical segment has no horizontal span
        let segments = vec![LineSegment::new(30.0, 0.0, 30.0, 200.0)];
        let params = AisleConfig::default().params(Orientation::Horizontal);

        assert!(cluster_aisles(&segments, &params).is_empty());
    }

    #[test]
    fn test_no_segments_no_bands() {
        let params = AisleConfig::default().params(Orientation::Horizontal);
        assert!(cluster_aisles(&[], &params).is_empty());
    }
}
