//! Immutable lattice snapshot.
//!
//! A snapshot is the registry plus everything derived from it (sections,
//! layouts, diagnostics) at one point in time. It is built in one go by
//! [`LatticeSnapshot::build`] and never mutated afterwards; the machine
//! model swaps in a fresh one on every change.

use std::collections::BTreeMap;

use beamline_common::definitions::LatticeDefinitions;
use indexmap::IndexMap;
use static_assertions::assert_impl_all;
use tracing::{debug, warn};

use crate::drift::{LatticeItem, insert_drifts, s_positions};
use crate::element::{Element, ElementArena};
use crate::error::{BuildDiagnostic, LatticeError, LatticeResult};
use crate::layout::{Layout, LayoutView, build_layouts};
use crate::query::{ElementFilter, ElementQuery};
use crate::section::{Section, build_sections};

/// Registry and derived sections/layouts.
#[derive(Debug, Clone, Default)]
pub struct LatticeSnapshot {
    elements: ElementArena,
    sections: BTreeMap<String, Section>,
    layouts: BTreeMap<String, Layout>,
    default_path: Option<String>,
    diagnostics: Vec<BuildDiagnostic>,
}

assert_impl_all!(LatticeSnapshot: Send, Sync);

macro_rules! filtered_queries {
    ($($(#[$meta:meta])* $name:ident => $filter:ident;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self, query: &ElementQuery) -> LatticeResult<Vec<String>> {
                self.elements_between(&ElementQuery {
                    filter: ElementFilter::$filter(),
                    ..query.clone()
                })
            }
        )*
    };
}

impl LatticeSnapshot {
    /// Derive sections and layouts for `elements` under `definitions`.
    pub fn build(elements: ElementArena, definitions: &LatticeDefinitions) -> Self {
        let (sections, mut diagnostics) = build_sections(&elements, definitions);
        let (layouts, layout_diagnostics) = build_layouts(&elements, &sections, definitions);
        diagnostics.extend(layout_diagnostics);

        for diagnostic in &diagnostics {
            debug!(%diagnostic, "Lattice build diagnostic");
        }
        let malformed = diagnostics.iter().filter(|d| d.is_malformed_input()).count();
        if malformed > 0 {
            warn!(
                machine = %definitions.machine.name,
                count = malformed,
                "Lattice definitions reference missing areas or elements"
            );
        }
        debug!(
            elements = elements.len(),
            sections = sections.len(),
            layouts = layouts.len(),
            "Lattice rebuilt"
        );

        Self {
            elements,
            sections,
            layouts,
            default_path: definitions.default_path.clone(),
            diagnostics,
        }
    }

    pub fn elements(&self) -> &ElementArena {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Registry lookup; `None` if absent.
    pub fn get_element(&self, name: &str) -> Option<&Element> {
        self.elements.get(name)
    }

    /// Registry lookup that fails with `ElementNotFound`.
    pub fn require_element(&self, name: &str) -> LatticeResult<&Element> {
        self.get_element(name)
            .ok_or_else(|| LatticeError::ElementNotFound {
                name: name.to_string(),
            })
    }

    /// Element whose name or alias is `name`.
    pub fn find_element(&self, name: &str) -> Option<&Element> {
        self.get_element(name)
            .or_else(|| self.elements.values().find(|e| e.answers_to(name)))
    }

    pub fn section(&self, area: &str) -> Option<&Section> {
        self.sections.get(area)
    }

    pub fn sections(&self) -> &BTreeMap<String, Section> {
        &self.sections
    }

    pub fn layout(&self, path: &str) -> Option<LayoutView<'_>> {
        self.layouts.get(path).map(|l| l.view(&self.elements))
    }

    /// Path names in sorted order.
    pub fn layout_names(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }

    pub fn default_path(&self) -> Option<&str> {
        self.default_path.as_deref()
    }

    pub(crate) fn set_default_path(&mut self, path: Option<String>) {
        self.default_path = path;
    }

    /// Problems found in the definitions during the last rebuild.
    pub fn diagnostics(&self) -> &[BuildDiagnostic] {
        &self.diagnostics
    }

    /// Pick the layout a query runs on.
    ///
    /// In order:
    /// 1. `path`, if given
    /// 2. the `machine_area` of `end`, if it names a layout
    /// 3. the default path, if set
    /// 4. the only layout, if there is exactly one
    /// 5. the only layout containing `end`, if `end` is given
    ///
    /// # Errors
    /// - `UnknownPath` if `path` or the default path names no layout
    /// - `ElementNotFound` if `end` is not registered
    /// - `AmbiguousPath` if no rule applies
    pub fn resolve_path(&self, path: Option<&str>, end: Option<&str>) -> LatticeResult<LayoutView<'_>> {
        if let Some(path) = path {
            return self.named_layout(path);
        }

        if let Some(end) = end {
            let element = self.require_element(end)?;
            if let Some(view) = self.layout(&element.machine_area) {
                return Ok(view);
            }
        }

        if let Some(default) = self.default_path.as_deref() {
            return self.named_layout(default);
        }

        if self.layouts.len() == 1 {
            if let Some(layout) = self.layouts.values().next() {
                return Ok(layout.view(&self.elements));
            }
        }

        let containing: Vec<LayoutView<'_>> = match end {
            Some(end) => self
                .layouts
                .values()
                .map(|l| l.view(&self.elements))
                .filter(|v| v.contains(end))
                .collect(),
            None => Vec::new(),
        };
        if let [only] = containing[..] {
            return Ok(only);
        }

        let candidates = if containing.is_empty() {
            self.layout_names().map(str::to_string).collect()
        } else {
            containing.iter().map(|v| v.name().to_string()).collect()
        };
        Err(LatticeError::AmbiguousPath { candidates })
    }

    fn named_layout(&self, path: &str) -> LatticeResult<LayoutView<'_>> {
        self.layout(path).ok_or_else(|| LatticeError::UnknownPath {
            path: path.to_string(),
        })
    }

    /// Elements of the resolved path between `query.start` and `query.end`.
    pub fn select(&self, query: &ElementQuery) -> LatticeResult<Vec<&Element>> {
        let view = self.resolve_path(query.path.as_deref(), query.end.as_deref())?;
        view.elements_between(query.start.as_deref(), query.end.as_deref(), &query.filter)
    }

    /// Names of the elements [`select`](Self::select) returns.
    pub fn elements_between(&self, query: &ElementQuery) -> LatticeResult<Vec<String>> {
        Ok(self
            .select(query)?
            .into_iter()
            .map(|e| e.name.clone())
            .collect())
    }

    /// Elements of the range interleaved with drifts, keyed by name.
    pub fn create_drifts(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        path: Option<&str>,
    ) -> LatticeResult<IndexMap<String, LatticeItem<'_>>> {
        let view = self.resolve_path(path, end)?;
        let elements = view.elements_between(start, end, &ElementFilter::any())?;
        Ok(insert_drifts(&elements))
    }

    /// Cumulative s of every element on the path, drifts included in the sum.
    pub fn get_elements_s_pos(&self, path: Option<&str>) -> LatticeResult<IndexMap<String, f64>> {
        let items = self.create_drifts(None, None, path)?;
        Ok(s_positions(&items))
    }

    filtered_queries! {
        magnets => magnets;
        quadrupoles => quadrupoles;
        dipoles => dipoles;
        sextupoles => sextupoles;
        solenoids => solenoids;
        /// Horizontal, vertical and combined correctors.
        correctors => correctors;
        diagnostic_elements => diagnostics;
        charge_diagnostics => charge_diagnostics;
        /// Screens and BPMs.
        position_diagnostics => position_diagnostics;
        screens => screens;
        vacuum_components => vacuum_components;
        shutters => shutters;
    }
}
