//! Prelude module for common re-exports.
//!
//! This module provides convenient re-exports of commonly used types
//! so that consumers can do `use beamline_common::prelude::*;` and get
//! the most important types without listing individual paths.
//!
//! # Usage
//!
//! ```rust
//! use beamline_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, MachineInfo};
pub use crate::definitions::LatticeDefinitions;

// ─── Geometry ───────────────────────────────────────────────────────
pub use crate::geometry::{Position, Rotation};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{BEAM_AXIS, BEND_ANGLE_EPSILON, ORDER_TOLERANCE};
