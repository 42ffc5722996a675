use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use lot_common::StallRecord;

/// Direction of an aisle's long axis
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A straight segment returned by the line detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: [f64; 2],
    pub end: [f64; 2],
}

impl LineSegment {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            start: [x1, y1],
            end: [x2, y2],
        }
    }

    pub fn dx(&self) -> f64 {
        self.end[0] - self.start[0]
    }

    pub fn dy(&self) -> f64 {
        self.end[1] - self.start[1]
    }

    pub fn length(&self) -> f64 {
        self.dx().hypot(self.dy())
    }

    /// Angle in degrees in `(-180, 180]`
    pub fn angle(&self) -> f64 {
        self.dy().atan2(self.dx()).to_degrees()
    }

    /// Midpoint on the axis perpendicular to an aisle of `orientation`
    pub fn orthogonal_midpoint(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => (self.start[1] + self.end[1]) / 2.0,
            Orientation::Vertical => (self.start[0] + self.end[0]) / 2.0,
        }
    }

    /// Endpoint coordinates along the aisle's long axis
    pub fn axis_extent(&self, orientation: Orientation) -> (f64, f64) {
        let (a, b) = match orientation {
            Orientation::Horizontal => (self.start[0], self.end[0]),
            Orientation::Vertical => (self.start[1], self.end[1]),
        };
        (a.min(b), a.max(b))
    }

    /// Extent across the aisle's long axis
    pub fn perpendicular_extent(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.dy().abs(),
            Orientation::Vertical => self.dx().abs(),
        }
    }
}

/// An elongated band of collinear edge signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AisleBand {
    pub orientation: Orientation,
    pub span_start: f64,
    pub span_end: f64,
    /// Position on the orthogonal axis
    pub fixed_coordinate: f64,
    pub thickness: f64,
}

impl AisleBand {
    /// Returns `None` unless `span_end > span_start`
    pub fn new(
        orientation: Orientation,
        span_start: f64,
        span_end: f64,
        fixed_coordinate: f64,
        thickness: f64,
    ) -> Option<Self> {
        (span_end > span_start).then_some(Self {
            orientation,
            span_start,
            span_end,
            fixed_coordinate,
            thickness,
        })
    }

    pub fn span_length(&self) -> f64 {
        self.span_end - self.span_start
    }
}

/// Output of one detector run over a single image
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detection {
    /// Records in discovery order
    pub stalls: Vec<StallRecord>,
    pub horizontal_aisles: usize,
    pub vertical_aisles: usize,
    pub image_width: u32,
    pub image_height: u32,
}
