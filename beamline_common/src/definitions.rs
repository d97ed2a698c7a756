//! Lattice definitions: area orderings and beam-path compositions.
//!
//! Parsed from `lattice.toml`. Two maps drive every rebuild of the machine
//! model:
//!
//! - `sections`: area name → element names in canonical order
//! - `layouts`: path name → area names in traversal order
//!
//! ```toml
//! default_path = "line1"
//!
//! [machine]
//! name = "test-line"
//!
//! [sections]
//! FODO = ["QUAD1"]
//! NODO = ["QUAD2"]
//!
//! [layouts]
//! line1 = ["FODO", "NODO"]
//! ```
//!
//! Structural problems (empty names, duplicates) are rejected by
//! [`LatticeDefinitions::validate`]. Dangling references (an area with no
//! section, an element that is not registered) are not errors here; they
//! surface as build diagnostics when the model is rebuilt.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, MachineInfo};

/// Area and path definitions for one machine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatticeDefinitions {
    /// Machine identification.
    #[serde(default)]
    pub machine: MachineInfo,

    /// Path used when a query neither names one nor can infer one.
    #[serde(default)]
    pub default_path: Option<String>,

    /// Area name → ordered element names.
    #[serde(default)]
    pub sections: BTreeMap<String, Vec<String>>,

    /// Path name → ordered area names.
    #[serde(default)]
    pub layouts: BTreeMap<String, Vec<String>>,
}

impl LatticeDefinitions {
    /// Empty definitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the element order of one area.
    pub fn with_section<I, S>(mut self, area: impl Into<String>, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections
            .insert(area.into(), order.into_iter().map(Into::into).collect());
        self
    }

    /// Add (or replace) the area list of one path.
    pub fn with_layout<I, S>(mut self, path: impl Into<String>, areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layouts
            .insert(path.into(), areas.into_iter().map(Into::into).collect());
        self
    }

    /// Set the fallback path.
    pub fn with_default_path(mut self, path: impl Into<String>) -> Self {
        self.default_path = Some(path.into());
        self
    }

    /// Declared element order for `area`.
    pub fn area_order(&self, area: &str) -> Option<&[String]> {
        self.sections.get(area).map(Vec::as_slice)
    }

    /// Declared area list for `path`.
    pub fn path_areas(&self, path: &str) -> Option<&[String]> {
        self.layouts.get(path).map(Vec::as_slice)
    }

    /// Validate structural consistency.
    ///
    /// # Validation Rules
    /// 1. Machine name is not empty
    /// 2. Area and path names are not empty
    /// 3. No element name appears twice in one area order
    /// 4. No area appears twice in one path
    /// 5. `default_path`, when set, names a declared layout
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.machine.validate()?;

        for (area, order) in &self.sections {
            if area.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "section name cannot be empty".to_string(),
                ));
            }
            let mut seen = HashSet::new();
            for name in order {
                if !seen.insert(name.as_str()) {
                    return Err(ConfigError::ValidationError(format!(
                        "element '{name}' listed twice in section '{area}'"
                    )));
                }
            }
        }

        for (path, areas) in &self.layouts {
            if path.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "layout name cannot be empty".to_string(),
                ));
            }
            let mut seen = HashSet::new();
            for area in areas {
                if !seen.insert(area.as_str()) {
                    return Err(ConfigError::ValidationError(format!(
                        "area '{area}' listed twice in layout '{path}'"
                    )));
                }
            }
        }

        if let Some(default) = &self.default_path {
            if !self.layouts.contains_key(default) {
                return Err(ConfigError::ValidationError(format!(
                    "default_path '{default}' is not a declared layout"
                )));
            }
        }

        Ok(())
    }
}
