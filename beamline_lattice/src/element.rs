//! Element records and TOML element catalogues.
//!
//! ```toml
//! [[elements]]
//! name = "QUAD1"
//! machine_area = "FODO"
//! hardware_class = "magnet"
//! hardware_type = "quadrupole"
//!
//! [elements.physical]
//! middle = 0.1
//! length = 0.1
//!
//! [elements.magnetic]
//! order = 1
//! kl = 1.2
//! ```

use beamline_common::geometry::{Position, Rotation};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{LatticeError, LatticeResult};
use crate::placement::{Physical, PhysicalPlacement};

/// Element registry keyed by name, in insertion order.
pub type ElementArena = IndexMap<String, Element>;

/// Stable index of an element in an [`ElementArena`].
///
/// Valid only for the arena it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// Normal or skew multipole component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Magnetic {
    /// Multipole order (0 = dipole, 1 = quadrupole, ...).
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub skew: bool,
    /// Integrated strength. For a normal dipole this is the bend angle [rad].
    #[serde(default)]
    pub kl: f64,
}

impl Magnetic {
    /// Normal dipole with bend angle `angle`.
    pub fn dipole(angle: f64) -> Self {
        Self {
            order: 0,
            skew: false,
            kl: angle,
        }
    }
}

/// One piece of beamline hardware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,

    #[serde(default)]
    pub machine_area: String,

    #[serde(default)]
    pub hardware_class: String,

    #[serde(default)]
    pub hardware_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub physical: Physical,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnetic: Option<Magnetic>,
}

impl Element {
    /// Zero-length element at the origin.
    pub fn new(name: impl Into<String>, machine_area: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            machine_area: machine_area.into(),
            hardware_class: String::new(),
            hardware_type: String::new(),
            aliases: Vec::new(),
            physical: Physical::default(),
            magnetic: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.hardware_class = class.into();
        self
    }

    pub fn with_type(mut self, hardware_type: impl Into<String>) -> Self {
        self.hardware_type = hardware_type.into();
        self
    }

    pub fn with_middle(mut self, middle: impl Into<Position>) -> Self {
        self.physical.middle = middle.into();
        self
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.physical.length = length;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.physical.rotation = rotation;
        self
    }

    pub fn with_global_rotation(mut self, rotation: Rotation) -> Self {
        self.physical.global_rotation = rotation;
        self
    }

    /// Make this element a normal dipole bending by `angle` [rad].
    pub fn with_bend_angle(mut self, angle: f64) -> Self {
        self.magnetic = Some(Magnetic::dipole(angle));
        self
    }

    /// Bend angle: `kl` of a normal order-0 component, else 0.
    pub fn angle(&self) -> f64 {
        match self.magnetic {
            Some(Magnetic {
                order: 0,
                skew: false,
                kl,
            }) => kl,
            _ => 0.0,
        }
    }

    /// True if `name` is this element's name or one of its aliases.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Check the fields the geometry relies on.
    ///
    /// # Errors
    /// `InvalidElement` for an empty name, a negative or non-finite length,
    /// or a non-finite middle point.
    pub fn validate(&self) -> LatticeResult<()> {
        let invalid = |reason: &str| LatticeError::InvalidElement {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        let length = self.physical.length;
        if !length.is_finite() || length < 0.0 {
            return Err(invalid("length must be finite and non-negative"));
        }
        let m = self.physical.middle;
        if !(m.x.is_finite() && m.y.is_finite() && m.z.is_finite()) {
            return Err(invalid("middle must be finite"));
        }
        if !self.angle().is_finite() {
            return Err(invalid("bend angle must be finite"));
        }
        Ok(())
    }
}

impl PhysicalPlacement for Element {
    fn middle(&self) -> Position {
        self.physical.middle
    }

    fn length(&self) -> f64 {
        self.physical.length
    }

    fn bend_angle(&self) -> f64 {
        self.angle()
    }

    fn rotation(&self) -> Rotation {
        self.physical.rotation
    }

    fn global_rotation(&self) -> Rotation {
        self.physical.global_rotation
    }
}

/// Contents of one element catalogue file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementCatalog {
    #[serde(default)]
    pub elements: Vec<Element>,
}
