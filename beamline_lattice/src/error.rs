//! Error and diagnostic types for lattice operations.
//!
//! Two kinds of problems are distinguished:
//!
//! - [`LatticeError`] - failures returned to the caller (unknown names,
//!   unresolvable paths). Propagated with `?`.
//! - [`BuildDiagnostic`] - tolerated defects in the external definitions,
//!   found while rebuilding sections and layouts. Collected on the snapshot
//!   and logged, never raised.

use std::fmt;

use beamline_common::config::ConfigError;
use thiserror::Error;

/// Result alias for lattice operations.
pub type LatticeResult<T> = Result<T, LatticeError>;

/// Error types for lattice queries and model construction.
#[derive(Debug, Clone, Error)]
pub enum LatticeError {
    /// Name is not in the element registry.
    #[error("Element '{name}' does not exist in the machine model")]
    ElementNotFound { name: String },

    /// Name is registered but not part of the resolved beam path.
    #[error("Element '{name}' does not exist anywhere in beam path '{path}'")]
    NotInPath { name: String, path: String },

    /// Path name does not match any layout.
    #[error("Beam path '{path}' is not defined")]
    UnknownPath { path: String },

    /// No rule could pick a single beam path.
    #[error("Beam path is ambiguous (candidates: {}); pass a path or set a default path", .candidates.join(", "))]
    AmbiguousPath { candidates: Vec<String> },

    /// Query needs a first/last element but the path has none.
    #[error("Beam path '{path}' contains no elements")]
    EmptyPath { path: String },

    /// Same element name supplied twice in one batch.
    #[error("Element '{name}' defined more than once")]
    DuplicateElement { name: String },

    /// Element data failed validation.
    #[error("Element '{name}' is invalid: {reason}")]
    InvalidElement { name: String, reason: String },

    /// Configuration loading failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Non-fatal defect found while rebuilding sections and layouts.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildDiagnostic {
    /// A layout names an area that has no section definition.
    UnknownArea { path: String, area: String },
    /// A section order names an element that is not registered.
    MissingElement { area: String, element: String },
    /// A section order names an element registered under another area.
    AreaMismatch {
        area: String,
        element: String,
        actual_area: String,
    },
    /// Order reconciliation removed an element from a layout.
    DroppedFromPath { path: String, element: String },
    /// An area has registered elements but no declared order; registration
    /// order was used.
    InferredOrder { area: String, elements: usize },
}

impl BuildDiagnostic {
    /// True for defects in the input data.
    ///
    /// `DroppedFromPath` is expected whenever a section spans several
    /// branches and is not counted.
    pub fn is_malformed_input(&self) -> bool {
        !matches!(self, Self::DroppedFromPath { .. })
    }
}

impl fmt::Display for BuildDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownArea { path, area } => {
                write!(f, "layout '{path}' references undefined area '{area}'")
            }
            Self::MissingElement { area, element } => {
                write!(f, "section '{area}' lists unregistered element '{element}'")
            }
            Self::AreaMismatch {
                area,
                element,
                actual_area,
            } => write!(
                f,
                "section '{area}' lists element '{element}' which belongs to area '{actual_area}'"
            ),
            Self::DroppedFromPath { path, element } => {
                write!(f, "element '{element}' is out of order and was dropped from layout '{path}'")
            }
            Self::InferredOrder { area, elements } => write!(
                f,
                "area '{area}' has no declared order; using registration order for {elements} element(s)"
            ),
        }
    }
}
