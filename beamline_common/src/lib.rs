//! Beamline Common Library
//!
//! This crate provides the survey-frame vector types, shared constants and
//! configuration loading utilities for all beamline workspace crates.
//!
//! # Module Structure
//!
//! - [`geometry`] - `Position` / `Rotation` vector types
//! - [`consts`] - Geometry thresholds and default file names
//! - [`config`] - Configuration loading traits and types
//! - [`definitions`] - Area orderings and beam-path compositions
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! beamline_common = { path = "../beamline_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use beamline_common::geometry::Position;
//! use beamline_common::config::{ConfigLoader, MachineInfo};
//! ```

pub mod config;
pub mod consts;
pub mod definitions;
pub mod geometry;
pub mod prelude;
