//! Shape model structures.

use serde::{Deserialize, Serialize};

/// Compass direction of a line or connector shape.
///
/// Derived from the shape's bounding-box angle in the worksheet coordinate
/// system (y grows downward): 0 = east, 90 = south, 180 = west, 270 = north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    E,
    SE,
    S,
    SW,
    W,
    NW,
    N,
    NE,
}

const COMPASS: [Direction; 8] = [
    Direction::E,
    Direction::SE,
    Direction::S,
    Direction::SW,
    Direction::W,
    Direction::NW,
    Direction::N,
    Direction::NE,
];

/// Angle of a line shape's bounding box, in degrees.
///
/// Matches the worksheet coordinate system where y grows downward.
pub fn line_angle_deg(w: f64, h: f64) -> f64 {
    h.atan2(w).to_degrees().rem_euclid(360.0)
}

/// Snap an angle in degrees to the nearest compass direction.
pub fn angle_to_compass(angle: f64) -> Direction {
    let idx = (((angle + 22.5).rem_euclid(360.0)) / 45.0) as usize;
    COMPASS[idx.min(7)]
}

/// A drawing shape placed on a worksheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shape {
    /// Text content of the shape (empty when none)
    #[serde(default)]
    pub text: String,

    /// Left offset in points
    pub l: i64,

    /// Top offset in points
    pub t: i64,

    /// Width in points (groups and verbose mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,

    /// Height in points (groups and verbose mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,

    /// Shape type label, e.g. "AutoShape-Rectangle" or "Line"
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<String>,

    /// Rotation in degrees (lines and connectors only, omitted when zero)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,

    /// Bounding-box angle for lines and connectors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle_deg: Option<f64>,

    /// Arrowhead style at the line start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin_arrow_style: Option<i32>,

    /// Arrowhead style at the line end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_arrow_style: Option<i32>,

    /// Compass direction for lines and connectors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

impl Shape {
    /// Create a shape with text at a position.
    pub fn new(text: impl Into<String>, l: i64, t: i64) -> Self {
        Self {
            text: text.into(),
            l,
            t,
            ..Default::default()
        }
    }

    /// Annotate a line shape with its angle and compass direction.
    pub fn with_line_geometry(mut self, w: f64, h: f64) -> Self {
        let angle = line_angle_deg(w, h);
        self.angle_deg = Some(angle);
        self.direction = Some(angle_to_compass(angle));
        self
    }

    /// Strip size fields for non-verbose output.
    pub fn without_size(mut self) -> Self {
        self.w = None;
        self.h = None;
        self
    }
}
