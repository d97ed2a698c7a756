//! Typed element filters and range queries.
//!
//! [`ElementFilter`] narrows by hardware class and type (both compared
//! case-insensitively; an empty list accepts everything).
//! [`ElementQuery`] adds the range (`start`/`end`) and an optional path.
//!
//! ```rust
//! use beamline_lattice::query::{ElementFilter, ElementQuery};
//!
//! let q = ElementQuery::new()
//!     .end_at("QUAD2")
//!     .with_filter(ElementFilter::quadrupoles());
//! assert_eq!(q.end.as_deref(), Some("QUAD2"));
//! ```

use crate::element::Element;

/// Hardware class/type filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementFilter {
    /// Accepted `hardware_class` values; empty accepts any.
    pub classes: Vec<String>,
    /// Accepted `hardware_type` values; empty accepts any.
    pub types: Vec<String>,
}

impl ElementFilter {
    /// Accept every element.
    pub fn any() -> Self {
        Self::default()
    }

    /// Accept elements whose class is one of `classes`.
    pub fn classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
            types: Vec::new(),
        }
    }

    /// Further restrict to elements whose type is one of `types`.
    pub fn types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `element` passes the filter.
    pub fn matches(&self, element: &Element) -> bool {
        contains_ignore_case(&self.classes, &element.hardware_class)
            && contains_ignore_case(&self.types, &element.hardware_type)
    }

    pub fn is_any(&self) -> bool {
        self.classes.is_empty() && self.types.is_empty()
    }

    pub fn magnets() -> Self {
        Self::classes(["magnet"])
    }

    pub fn quadrupoles() -> Self {
        Self::magnets().types(["quadrupole"])
    }

    pub fn dipoles() -> Self {
        Self::magnets().types(["dipole"])
    }

    pub fn sextupoles() -> Self {
        Self::magnets().types(["sextupole"])
    }

    pub fn solenoids() -> Self {
        Self::magnets().types(["solenoid"])
    }

    pub fn correctors() -> Self {
        Self::magnets().types(["corrector", "horizontal_corrector", "vertical_corrector"])
    }

    pub fn diagnostics() -> Self {
        Self::classes(["diagnostic"])
    }

    /// Faraday cups, wall-current monitors and integrating transformers.
    pub fn charge_diagnostics() -> Self {
        Self::diagnostics().types(["FCM", "WCM", "ICT"])
    }

    pub fn position_diagnostics() -> Self {
        Self::diagnostics().types(["screen", "BPM"])
    }

    pub fn screens() -> Self {
        Self::diagnostics().types(["screen"])
    }

    pub fn vacuum_components() -> Self {
        Self::classes(["vacuum"])
    }

    pub fn shutters() -> Self {
        Self::vacuum_components().types(["shutter"])
    }
}

fn contains_ignore_case(accepted: &[String], value: &str) -> bool {
    accepted.is_empty() || accepted.iter().any(|a| a.eq_ignore_ascii_case(value))
}

/// Range query over one beam path.
///
/// Missing `start`/`end` default to the first/last element of the path.
/// A missing `path` is resolved by the machine model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub path: Option<String>,
    pub filter: ElementFilter,
}

impl ElementQuery {
    /// Whole path, no filter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_at(mut self, name: impl Into<String>) -> Self {
        self.start = Some(name.into());
        self
    }

    pub fn end_at(mut self, name: impl Into<String>) -> Self {
        self.end = Some(name.into());
        self
    }

    pub fn on_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_filter(mut self, filter: ElementFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Shorthand for a class-only filter.
    pub fn of_class<I, S>(self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let types = self.filter.types.clone();
        self.with_filter(ElementFilter::classes(classes).types(types))
    }

    /// Shorthand for a type restriction, keeping any class filter.
    pub fn of_type<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = self.filter.types(types);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Element {
        Element::new("Q1", "A")
            .with_class("Magnet")
            .with_type("Quadrupole")
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(ElementFilter::any().matches(&quad()));
        assert!(ElementFilter::any().matches(&Element::new("X", "A")));
        assert!(ElementFilter::any().is_any());
    }

    #[test]
    fn class_match_is_case_insensitive() {
        assert!(ElementFilter::magnets().matches(&quad()));
        assert!(ElementFilter::classes(["MAGNET"]).matches(&quad()));
        assert!(!ElementFilter::diagnostics().matches(&quad()));
    }

    #[test]
    fn type_restriction() {
        assert!(ElementFilter::quadrupoles().matches(&quad()));
        assert!(!ElementFilter::dipoles().matches(&quad()));

        let bpm = Element::new("BPM1", "A")
            .with_class("diagnostic")
            .with_type("bpm");
        assert!(ElementFilter::position_diagnostics().matches(&bpm));
        assert!(!ElementFilter::charge_diagnostics().matches(&bpm));
        assert!(!ElementFilter::screens().matches(&bpm));
    }

    #[test]
    fn query_builder() {
        let q = ElementQuery::new()
            .start_at("Q1")
            .end_at("Q9")
            .on_path("line1")
            .of_type(["dipole"])
            .of_class(["magnet"]);
        assert_eq!(q.start.as_deref(), Some("Q1"));
        assert_eq!(q.path.as_deref(), Some("line1"));
        assert_eq!(q.filter, ElementFilter::dipoles());
    }
}
