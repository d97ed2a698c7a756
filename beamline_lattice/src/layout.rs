//! Beam-path layouts and order reconciliation.
//!
//! A layout concatenates the sections of its areas in declared order and then
//! reconciles the result into a sequence that advances monotonically along
//! the beam axis.
//!
//! # Reconciliation
//!
//! ```text
//! anchor = start(last)                 last is always kept
//! for e in rest, reversed:
//!     keep e  iff  (end(e) − anchor) · (0, 0, −1) ≥ −tol
//!     if kept: anchor = start(e)
//! ```
//!
//! `tol` is `ORDER_TOLERANCE` (1e-9 m) rather than a strict `≥ 0`, so that
//! touching elements whose computed endpoints differ by rounding error are
//! kept.
//!
//! Elements that end beyond the start of their kept successor are dropped.
//! This happens when one area serves several branches and only some of its
//! elements lie on this path.

use std::collections::{BTreeMap, HashMap};

use beamline_common::consts::{BEAM_AXIS, ORDER_TOLERANCE};
use beamline_common::definitions::LatticeDefinitions;
use beamline_common::geometry::Position;
use tracing::debug;

use crate::element::{Element, ElementArena, ElementId};
use crate::error::{BuildDiagnostic, LatticeError, LatticeResult};
use crate::placement::PhysicalPlacement;
use crate::query::ElementFilter;
use crate::section::Section;

/// Indices of the spans kept by reconciliation, in forward order.
///
/// `spans` holds the `(start, end)` points of the raw concatenation.
pub fn reconcile_spans(spans: &[(Position, Position)]) -> Vec<usize> {
    let Some(((last_start, _), rest)) = spans.split_last() else {
        return Vec::new();
    };

    let upstream = -Position::from(BEAM_AXIS);
    let mut anchor = *last_start;
    let mut kept = vec![rest.len()];
    for (index, (start, end)) in rest.iter().enumerate().rev() {
        if end.vector_angle(anchor, upstream) >= -ORDER_TOLERANCE {
            kept.push(index);
            anchor = *start;
        }
    }
    kept.reverse();
    kept
}

/// Reconciled element sequence of one beam path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    name: String,
    sections: Vec<String>,
    sequence: Vec<ElementId>,
    positions: HashMap<ElementId, usize>,
}

impl Layout {
    /// Concatenate `areas` from `sections` and reconcile.
    pub fn build(
        name: &str,
        areas: &[String],
        sections: &BTreeMap<String, Section>,
        arena: &ElementArena,
        diagnostics: &mut Vec<BuildDiagnostic>,
    ) -> Self {
        let mut raw: Vec<ElementId> = Vec::new();
        let mut used_areas = Vec::with_capacity(areas.len());
        for area in areas {
            match sections.get(area) {
                Some(section) => {
                    raw.extend_from_slice(section.members());
                    used_areas.push(area.clone());
                }
                None => diagnostics.push(BuildDiagnostic::UnknownArea {
                    path: name.to_string(),
                    area: area.clone(),
                }),
            }
        }

        let spans: Vec<(Position, Position)> = raw
            .iter()
            .filter_map(|id| arena.get_index(id.0).map(|(_, e)| e.span()))
            .collect();
        let kept = reconcile_spans(&spans);

        let mut sequence = Vec::with_capacity(kept.len());
        let mut next = kept.iter().peekable();
        for (index, id) in raw.iter().enumerate() {
            if next.peek() == Some(&&index) {
                next.next();
                sequence.push(*id);
            } else if let Some((element, _)) = arena.get_index(id.0) {
                diagnostics.push(BuildDiagnostic::DroppedFromPath {
                    path: name.to_string(),
                    element: element.clone(),
                });
            }
        }

        let positions = sequence.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        Self {
            name: name.to_string(),
            sections: used_areas,
            sequence,
            positions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Areas that contributed, in path order.
    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    pub fn sequence(&self) -> &[ElementId] {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Index of `id` in the reconciled sequence.
    pub fn position_of(&self, id: ElementId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Borrow together with the arena it indexes.
    pub fn view<'a>(&'a self, arena: &'a ElementArena) -> LayoutView<'a> {
        LayoutView {
            layout: self,
            arena,
        }
    }
}

/// Build every layout declared in `definitions`.
pub fn build_layouts(
    arena: &ElementArena,
    sections: &BTreeMap<String, Section>,
    definitions: &LatticeDefinitions,
) -> (BTreeMap<String, Layout>, Vec<BuildDiagnostic>) {
    let mut diagnostics = Vec::new();
    let layouts: BTreeMap<String, Layout> = definitions
        .layouts
        .iter()
        .map(|(path, areas)| {
            let layout = Layout::build(path, areas, sections, arena, &mut diagnostics);
            debug!(path = %path, elements = layout.len(), "Reconciled layout");
            (path.clone(), layout)
        })
        .collect();
    (layouts, diagnostics)
}

/// A layout borrowed with its element arena.
#[derive(Debug, Clone, Copy)]
pub struct LayoutView<'a> {
    layout: &'a Layout,
    arena: &'a ElementArena,
}

impl<'a> LayoutView<'a> {
    pub fn name(&self) -> &'a str {
        &self.layout.name
    }

    pub fn sections(&self) -> &'a [String] {
        &self.layout.sections
    }

    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// Elements in reconciled order.
    pub fn elements(&self) -> impl Iterator<Item = &'a Element> + 'a {
        let arena = self.arena;
        self.layout
            .sequence
            .iter()
            .filter_map(move |id| arena.get_index(id.0).map(|(_, e)| e))
    }

    pub fn names(&self) -> Vec<&'a str> {
        self.elements().map(|e| e.name.as_str()).collect()
    }

    pub fn first(&self) -> Option<&'a Element> {
        self.elements().next()
    }

    pub fn last(&self) -> Option<&'a Element> {
        let arena = self.arena;
        self.layout
            .sequence
            .last()
            .and_then(move |id| arena.get_index(id.0).map(|(_, e)| e))
    }

    /// Index of `name` in the reconciled sequence.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.arena
            .get_index_of(name)
            .and_then(|i| self.layout.position_of(ElementId(i)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Index of `name`, distinguishing unknown names from names off this path.
    pub fn lookup_index(&self, name: &str) -> LatticeResult<usize> {
        let Some(i) = self.arena.get_index_of(name) else {
            return Err(LatticeError::ElementNotFound {
                name: name.to_string(),
            });
        };
        self.layout
            .position_of(ElementId(i))
            .ok_or_else(|| LatticeError::NotInPath {
                name: name.to_string(),
                path: self.layout.name.clone(),
            })
    }

    /// Inclusive range `start..=end`, filtered.
    ///
    /// Missing bounds default to the first/last element. If `start` lies
    /// after `end` the result is empty.
    ///
    /// # Errors
    /// - `EmptyPath` if a bound is missing and the path has no elements
    /// - `ElementNotFound` / `NotInPath` for a bound that cannot be located
    pub fn elements_between(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        filter: &ElementFilter,
    ) -> LatticeResult<Vec<&'a Element>> {
        let first = match start {
            Some(name) => self.lookup_index(name)?,
            None if self.is_empty() => return Err(self.empty()),
            None => 0,
        };
        let last = match end {
            Some(name) => self.lookup_index(name)?,
            None if self.is_empty() => return Err(self.empty()),
            None => self.len() - 1,
        };
        if first > last {
            return Ok(Vec::new());
        }

        Ok(self
            .elements()
            .skip(first)
            .take(last - first + 1)
            .filter(|e| filter.matches(e))
            .collect())
    }

    fn empty(&self) -> LatticeError {
        LatticeError::EmptyPath {
            path: self.layout.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::build_sections;

    fn span(start: f64, end: f64) -> (Position, Position) {
        (Position::on_axis(start), Position::on_axis(end))
    }

    fn arena(elements: Vec<Element>) -> ElementArena {
        elements.into_iter().map(|e| (e.name.clone(), e)).collect()
    }

    fn quad(name: &str, area: &str, z: f64) -> Element {
        Element::new(name, area)
            .with_class("magnet")
            .with_type("quadrupole")
            .with_middle([0.0, 0.0, z])
            .with_length(0.1)
    }

    fn layout_of(
        arena: &ElementArena,
        defs: &LatticeDefinitions,
        path: &str,
    ) -> (Layout, Vec<BuildDiagnostic>) {
        let (sections, _) = build_sections(arena, defs);
        let (mut layouts, diags) = build_layouts(arena, &sections, defs);
        (layouts.remove(path).unwrap(), diags)
    }

    #[test]
    fn reconcile_empty() {
        assert!(reconcile_spans(&[]).is_empty());
    }

    #[test]
    fn reconcile_single_element_is_kept() {
        assert_eq!(reconcile_spans(&[span(5.0, 6.0)]), [0]);
    }

    #[test]
    fn reconcile_keeps_monotonic_sequence() {
        let spans = [span(0.0, 1.0), span(1.0, 2.0), span(3.0, 4.0)];
        assert_eq!(reconcile_spans(&spans), [0, 1, 2]);
    }

    #[test]
    fn reconcile_drops_element_overlapping_successor() {
        // Second element belongs to a branch that ends past the tail start.
        let spans = [span(0.0, 1.0), span(10.0, 11.0), span(2.0, 3.0)];
        assert_eq!(reconcile_spans(&spans), [0, 2]);
    }

    #[test]
    fn reconcile_anchor_moves_only_on_keep() {
        // 1 is dropped; 0 is then compared against the start of 2.
        let spans = [span(0.0, 1.5), span(5.0, 6.0), span(2.0, 3.0)];
        assert_eq!(reconcile_spans(&spans), [0, 2]);
    }

    #[test]
    fn reconcile_tolerates_rounding_at_touch_point() {
        let spans = [span(0.0, 1.0 + 1e-12), span(1.0, 2.0)];
        assert_eq!(reconcile_spans(&spans), [0, 1]);

        let spans = [span(0.0, 1.0 + 1e-8), span(1.0, 2.0)];
        assert_eq!(reconcile_spans(&spans), [1]);
    }

    #[test]
    fn layout_concatenates_sections_in_path_order() {
        let arena = arena(vec![
            quad("QUAD2", "NODO", 0.5),
            quad("QUAD1", "FODO", 0.1),
        ]);
        let defs = LatticeDefinitions::new()
            .with_section("FODO", ["QUAD1"])
            .with_section("NODO", ["QUAD2"])
            .with_layout("line1", ["FODO", "NODO"]);
        let (layout, diags) = layout_of(&arena, &defs, "line1");
        let view = layout.view(&arena);

        assert_eq!(view.names(), ["QUAD1", "QUAD2"]);
        assert_eq!(view.sections(), ["FODO", "NODO"]);
        assert_eq!(view.index_of("QUAD2"), Some(1));
        assert_eq!(view.first().map(|e| e.name.as_str()), Some("QUAD1"));
        assert_eq!(view.last().map(|e| e.name.as_str()), Some("QUAD2"));
        assert!(diags.is_empty());
    }

    #[test]
    fn shared_area_elements_off_branch_are_dropped() {
        // INJ holds elements of two branches; line A continues at z = 2.
        let arena = arena(vec![
            quad("INJ-Q1", "INJ", 0.5),
            quad("INJ-QB", "INJ", 5.0),
            quad("A-Q1", "A", 2.0),
        ]);
        let defs = LatticeDefinitions::new()
            .with_section("INJ", ["INJ-Q1", "INJ-QB"])
            .with_section("A", ["A-Q1"])
            .with_layout("lineA", ["INJ", "A"]);
        let (layout, diags) = layout_of(&arena, &defs, "lineA");

        assert_eq!(layout.view(&arena).names(), ["INJ-Q1", "A-Q1"]);
        assert_eq!(
            diags,
            [BuildDiagnostic::DroppedFromPath {
                path: "lineA".into(),
                element: "INJ-QB".into()
            }]
        );
    }

    #[test]
    fn unknown_area_is_reported_and_skipped() {
        let arena = arena(vec![quad("QUAD1", "FODO", 0.1)]);
        let defs = LatticeDefinitions::new()
            .with_section("FODO", ["QUAD1"])
            .with_layout("line1", ["FODO", "MISSING"]);
        let (layout, diags) = layout_of(&arena, &defs, "line1");
        assert_eq!(layout.sections(), ["FODO"]);
        assert_eq!(layout.len(), 1);
        assert!(matches!(
            &diags[..],
            [BuildDiagnostic::UnknownArea { area, .. }] if area == "MISSING"
        ));
    }

    #[test]
    fn elements_between_ranges_and_filters() {
        let arena = arena(vec![
            quad("Q1", "A", 1.0),
            Element::new("BPM1", "A")
                .with_class("diagnostic")
                .with_type("BPM")
                .with_middle([0.0, 0.0, 2.0]),
            quad("Q2", "A", 3.0),
            quad("Q3", "A", 4.0),
        ]);
        let defs = LatticeDefinitions::new()
            .with_section("A", ["Q1", "BPM1", "Q2", "Q3"])
            .with_layout("p", ["A"]);
        let (layout, _) = layout_of(&arena, &defs, "p");
        let view = layout.view(&arena);
        let names = |v: Vec<&Element>| v.into_iter().map(|e| e.name.clone()).collect::<Vec<_>>();

        let all = view.elements_between(None, None, &ElementFilter::any()).unwrap();
        assert_eq!(names(all), ["Q1", "BPM1", "Q2", "Q3"]);

        let mid = view
            .elements_between(Some("BPM1"), Some("Q2"), &ElementFilter::any())
            .unwrap();
        assert_eq!(names(mid), ["BPM1", "Q2"]);

        let quads = view
            .elements_between(None, Some("Q2"), &ElementFilter::quadrupoles())
            .unwrap();
        assert_eq!(names(quads), ["Q1", "Q2"]);

        let reversed = view
            .elements_between(Some("Q3"), Some("Q1"), &ElementFilter::any())
            .unwrap();
        assert!(reversed.is_empty());
    }

    #[test]
    fn elements_between_lookup_failures() {
        let arena = arena(vec![quad("Q1", "A", 1.0), quad("QX", "B", 9.0)]);
        let defs = LatticeDefinitions::new()
            .with_section("A", ["Q1"])
            .with_section("B", ["QX"])
            .with_layout("p", ["A"])
            .with_layout("empty", Vec::<String>::new());
        let (sections, _) = build_sections(&arena, &defs);
        let (layouts, _) = build_layouts(&arena, &sections, &defs);
        let view = layouts["p"].view(&arena);

        assert!(matches!(
            view.elements_between(Some("NOPE"), None, &ElementFilter::any()),
            Err(LatticeError::ElementNotFound { name }) if name == "NOPE"
        ));
        assert!(matches!(
            view.elements_between(None, Some("QX"), &ElementFilter::any()),
            Err(LatticeError::NotInPath { name, path }) if name == "QX" && path == "p"
        ));
        assert!(matches!(
            layouts["empty"]
                .view(&arena)
                .elements_between(None, None, &ElementFilter::any()),
            Err(LatticeError::EmptyPath { .. })
        ));
    }
}
