//! # Lot Common - Shared Stall Types
//!
//! The serialisable data model shared by the detection library and the CLI:
//! stall records as they appear in `stalls.json`, the axis-aligned boxes they
//! are built from, and a few polygon helpers.
//!
//! ## Example
//!
//! ```rust
//! use lot_common::{StallBox, StallRecord, StallStatus};
//!
//! let stall_box = StallBox::new(10, 20, 60, 120).unwrap();
//! let record = StallRecord::from_box("S-001", &stall_box, 0.7);
//!
//! assert_eq!(record.polygon[0], [10, 20]);
//! assert_eq!(record.status, StallStatus::Open);
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Result type for lot operations
pub type Result<T> = std::result::Result<T, LotError>;

/// Standard error type for lot data
#[derive(Error, Debug)]
pub enum LotError {
    #[error("Invalid stall box: ({x0}, {y0}) -> ({x1}, {y1})")]
    InvalidBox { x0: i32, y0: i32, x1: i32, y1: i32 },
}

/// Permit code assigned to freshly detected stalls
pub const DEFAULT_PERMIT: &str = "C";

/// Occupancy state of a stall
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StallStatus {
    #[default]
    Open,
    Filled,
}

/// Axis-aligned stall rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct StallBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl StallBox {
    /// Create a box, rejecting degenerate or inverted extents
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Result<Self> {
        if x1 <= x0 || y1 <= y0 {
            return Err(LotError::InvalidBox { x0, y0, x1, y1 });
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }

    /// Corners in top-left, top-right, bottom-right, bottom-left order
    pub fn corners(&self) -> [[i32; 2]; 4] {
        [
            [self.x0, self.y0],
            [self.x1, self.y0],
            [self.x1, self.y1],
            [self.x0, self.y1],
        ]
    }
}

/// One stall as persisted in the stall store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StallRecord {
    /// Identifier of the form `S-NNN`, unique within its lot
    pub id: String,
    /// Four integer corners
    pub polygon: [[i32; 2]; 4],
    #[serde(default = "default_permit")]
    pub permit: Vec<String>,
    #[serde(default)]
    pub status: StallStatus,
    #[schemars(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
}

fn default_permit() -> Vec<String> {
    vec![DEFAULT_PERMIT.to_string()]
}

impl StallRecord {
    /// Build an open stall with the default permit from a box
    pub fn from_box(id: impl Into<String>, stall_box: &StallBox, confidence: f64) -> Self {
        Self::from_polygon(id, stall_box.corners(), confidence)
    }

    /// Build an open stall with the default permit from arbitrary corners
    pub fn from_polygon(id: impl Into<String>, polygon: [[i32; 2]; 4], confidence: f64) -> Self {
        Self {
            id: id.into(),
            polygon,
            permit: default_permit(),
            status: StallStatus::Open,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Mean of the polygon's x coordinates
    pub fn mean_x(&self) -> f64 {
        self.polygon.iter().map(|p| p[0] as f64).sum::<f64>() / 4.0
    }

    /// Mean of the polygon's y coordinates
    pub fn mean_y(&self) -> f64 {
        self.polygon.iter().map(|p| p[1] as f64).sum::<f64>() / 4.0
    }
}

/// Format the stall id for a sequence number, zero-padded to three digits
pub fn stall_id(sequence: u32) -> String {
    format!("S-{:03}", sequence)
}

/// Sort stalls into row-major reading order: by mean y, then mean x
pub fn sort_reading_order(stalls: &mut [StallRecord]) {
    stalls.sort_by(|a, b| {
        a.mean_y()
            .total_cmp(&b.mean_y())
            .then_with(|| a.mean_x().total_cmp(&b.mean_x()))
    });
}
