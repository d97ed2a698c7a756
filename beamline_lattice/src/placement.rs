//! Element placement and entry/exit geometry.
//!
//! An element is placed by its `middle` point, its physical `length`, a bend
//! angle and two yaw rotations (local and carried). Entry (`start`) and exit
//! (`end`) points are derived on every call:
//!
//! ```text
//! θ      = bend angle
//! R      = R(rotation.theta + global_rotation.theta)
//!
//! sz     = L·tan(θ/2)/θ          (|θ| > ε)   else  L/2
//! start  = middle − R·(0, 0, sz)
//!
//! ex, ez = L(1−cos θ)/θ, L·sin θ/θ   (|θ| > ε)   else  0, L
//! end    = start + R·(ex, 0, ez)
//! ```
//!
//! For a straight element this is `middle ± L/2` along the rotated z-axis.
//! For a bend, `middle` is the apex of the tangents at entry and exit.

use beamline_common::consts::BEND_ANGLE_EPSILON;
use beamline_common::geometry::{Position, Rotation};
use serde::{Deserialize, Serialize};

/// Position and rotation offset pair (alignment error, survey correction).
///
/// Carried as data; not applied to `start`/`end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementOffset {
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub rotation: Rotation,
}

/// Physical placement record of one element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Physical {
    /// Reference point [m].
    #[serde(default, alias = "position")]
    pub middle: Position,

    /// Local orientation.
    #[serde(default)]
    pub rotation: Rotation,

    /// Orientation carried from upstream elements.
    #[serde(default)]
    pub global_rotation: Rotation,

    /// Physical length [m], never negative.
    #[serde(default)]
    pub length: f64,

    /// Alignment error.
    #[serde(default)]
    pub error: PlacementOffset,

    /// Survey correction.
    #[serde(default)]
    pub survey: PlacementOffset,
}

impl Physical {
    /// Placement at `middle` with the given length and no rotation.
    pub fn new(middle: Position, length: f64) -> Self {
        Self {
            middle,
            length,
            ..Self::default()
        }
    }
}

/// Local offset from `middle` back to `start`, before rotation.
pub fn start_offset(length: f64, angle: f64) -> Position {
    let sz = if angle.abs() > BEND_ANGLE_EPSILON {
        length * (angle / 2.0).tan() / angle
    } else {
        length / 2.0
    };
    Position::on_axis(sz)
}

/// Local offset from `start` to `end`, before rotation.
pub fn end_offset(length: f64, angle: f64) -> Position {
    if angle.abs() > BEND_ANGLE_EPSILON {
        Position::new(
            length * (1.0 - angle.cos()) / angle,
            0.0,
            length * angle.sin() / angle,
        )
    } else {
        Position::on_axis(length)
    }
}

/// Anything with a placement in the survey frame.
///
/// Implementors supply the raw fields; `start`, `end` and friends are
/// recomputed from them on every call.
pub trait PhysicalPlacement {
    /// Reference point.
    fn middle(&self) -> Position;

    /// Path length along the element [m]. Drifts may report a negative
    /// length when the beam runs against the z-axis.
    fn length(&self) -> f64;

    /// Bend angle [rad]; zero for straight elements.
    fn bend_angle(&self) -> f64 {
        0.0
    }

    /// Local orientation. Only the yaw (`theta`) enters the geometry.
    fn rotation(&self) -> Rotation {
        Rotation::ZERO
    }

    /// Orientation carried from upstream, added to [`rotation`](Self::rotation).
    fn global_rotation(&self) -> Rotation {
        Rotation::ZERO
    }

    /// Local and carried rotation summed.
    fn combined_rotation(&self) -> Rotation {
        self.rotation() + self.global_rotation()
    }

    /// Entry point.
    fn start(&self) -> Position {
        let offset = start_offset(self.length(), self.bend_angle());
        self.middle() - self.combined_rotation().apply_yaw(offset)
    }

    /// Exit point.
    fn end(&self) -> Position {
        let offset = end_offset(self.length(), self.bend_angle());
        self.start() + self.combined_rotation().apply_yaw(offset)
    }

    /// `(start, end)` pair.
    fn span(&self) -> (Position, Position) {
        (self.start(), self.end())
    }

    /// Straight-line distance from entry to exit.
    fn chord(&self) -> f64 {
        let (start, end) = self.span();
        (end - start).norm()
    }
}
