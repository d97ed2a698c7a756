//! Survey-frame vector types.
//!
//! - [`Position`] - `(x, y, z)` point or displacement [m]
//! - [`Rotation`] - `(phi, psi, theta)` orientation angles [rad]
//!
//! # Coordinate System
//!
//! ```text
//!         +Y (vertical)
//!          │
//!          │
//!          └──────► +Z (beam direction)
//!         ╱
//!       +X
//! ```
//!
//! Only `theta` (yaw about the vertical axis) takes part in placement
//! geometry. `phi` and `psi` are carried so that round-tripped data keeps
//! them, but no rotation is applied for them.
//!
//! Both types accept several TOML shapes (see [`Position`] and [`Rotation`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

// ─── Position ───────────────────────────────────────────────────────

/// A point (or displacement) in the survey frame.
///
/// Deserializes from any of:
/// - a number: `middle = 1.25` → `(0, 0, 1.25)`
/// - a pair: `middle = [x, z]` → `(x, 0, z)`
/// - a triple: `middle = [x, y, z]`
/// - a table: `middle = { z = 1.25 }` (missing components default to 0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "PositionRepr")]
pub struct Position {
    /// Horizontal coordinate [m].
    pub x: f64,
    /// Vertical coordinate [m].
    pub y: f64,
    /// Longitudinal coordinate [m].
    pub z: f64,
}

impl Position {
    /// Origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a position from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Position on the beam axis at longitudinal coordinate `z`.
    pub const fn on_axis(z: f64) -> Self {
        Self::new(0.0, 0.0, z)
    }

    /// Components as an array.
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Dot product with another position or a plain 3-array.
    pub fn dot(self, other: impl Into<Position>) -> f64 {
        let o = other.into();
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    /// Signed "is ahead of" test: `(self - other) · direction`.
    ///
    /// Positive or zero means `self` lies at or beyond `other` along `direction`.
    pub fn vector_angle(self, other: impl Into<Position>, direction: impl Into<Position>) -> f64 {
        (self - other.into()).dot(direction)
    }

    /// Euclidean length.
    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Point halfway between `self` and `other`.
    pub fn midpoint(self, other: Position) -> Self {
        (self + other) * 0.5
    }

    /// Component-wise comparison within `tolerance`.
    pub fn approx_eq(self, other: Position, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }
}

impl From<[f64; 3]> for Position {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Position> for [f64; 3] {
    fn from(p: Position) -> Self {
        p.to_array()
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Add<[f64; 3]> for Position {
    type Output = Position;

    fn add(self, rhs: [f64; 3]) -> Position {
        self + Position::from(rhs)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Sub<[f64; 3]> for Position {
    type Output = Position;

    fn sub(self, rhs: [f64; 3]) -> Position {
        self - Position::from(rhs)
    }
}

/// `[a, b, c] - position`, the reflected subtraction.
impl Sub<Position> for [f64; 3] {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::from(self) - rhs
    }
}

impl Neg for Position {
    type Output = Position;

    fn neg(self) -> Position {
        Position::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Position {
    type Output = Position;

    fn mul(self, k: f64) -> Position {
        Position::new(self.x * k, self.y * k, self.z * k)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PositionRepr {
    Z(f64),
    Pair([f64; 2]),
    Triple([f64; 3]),
    Table {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        z: f64,
    },
}

impl From<PositionRepr> for Position {
    fn from(repr: PositionRepr) -> Self {
        match repr {
            PositionRepr::Z(z) => Position::on_axis(z),
            PositionRepr::Pair([x, z]) => Position::new(x, 0.0, z),
            PositionRepr::Triple(v) => Position::from(v),
            PositionRepr::Table { x, y, z } => Position::new(x, y, z),
        }
    }
}

// ─── Rotation ───────────────────────────────────────────────────────

/// Orientation angles [rad].
///
/// Composition is plain component-wise addition. Angles are never wrapped,
/// so repeated composition can leave the `[-π, π]` range.
///
/// Deserializes from a number (`theta`), a `[phi, psi, theta]` triple, or a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RotationRepr")]
pub struct Rotation {
    /// Roll about the beam axis.
    pub phi: f64,
    /// Pitch about the horizontal axis.
    pub psi: f64,
    /// Yaw about the vertical axis.
    pub theta: f64,
}

impl Rotation {
    /// No rotation.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a rotation from its components.
    pub const fn new(phi: f64, psi: f64, theta: f64) -> Self {
        Self { phi, psi, theta }
    }

    /// Pure yaw rotation.
    pub const fn yaw(theta: f64) -> Self {
        Self::new(0.0, 0.0, theta)
    }

    /// Yaw matrix `R(theta)` about the vertical axis.
    ///
    /// ```text
    /// ⎡  cos θ   0   sin θ ⎤
    /// ⎢    0     1     0   ⎥
    /// ⎣ -sin θ   0   cos θ ⎦
    /// ```
    pub fn yaw_matrix(&self) -> [[f64; 3]; 3] {
        let (s, c) = self.theta.sin_cos();
        [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]]
    }

    /// Apply the yaw matrix to a vector: `R(theta) · v`.
    pub fn apply_yaw(&self, v: Position) -> Position {
        let m = self.yaw_matrix();
        let row = |r: [f64; 3]| r[0] * v.x + r[1] * v.y + r[2] * v.z;
        Position::new(row(m[0]), row(m[1]), row(m[2]))
    }
}

impl Add for Rotation {
    type Output = Rotation;

    fn add(self, rhs: Rotation) -> Rotation {
        Rotation::new(self.phi + rhs.phi, self.psi + rhs.psi, self.theta + rhs.theta)
    }
}

impl Sub for Rotation {
    type Output = Rotation;

    fn sub(self, rhs: Rotation) -> Rotation {
        Rotation::new(self.phi - rhs.phi, self.psi - rhs.psi, self.theta - rhs.theta)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(phi={}, psi={}, theta={})", self.phi, self.psi, self.theta)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RotationRepr {
    Theta(f64),
    Triple([f64; 3]),
    Table {
        #[serde(default)]
        phi: f64,
        #[serde(default)]
        psi: f64,
        #[serde(default)]
        theta: f64,
    },
}

impl From<RotationRepr> for Rotation {
    fn from(repr: RotationRepr) -> Self {
        match repr {
            RotationRepr::Theta(theta) => Rotation::yaw(theta),
            RotationRepr::Triple([phi, psi, theta]) => Rotation::new(phi, psi, theta),
            RotationRepr::Table { phi, psi, theta } => Rotation::new(phi, psi, theta),
        }
    }
}
