//! Machine-area sections.
//!
//! A section binds the declared element order of one area to the registered
//! elements of that area. Its member sequence is the declared order filtered
//! to names that are registered *and* carry the area as their
//! `machine_area`. Registered elements the order does not mention are left
//! out.
//!
//! An area that has registered elements but no declared order still gets a
//! section: its elements in registration order, reported as
//! [`BuildDiagnostic::InferredOrder`].

use std::collections::BTreeMap;

use beamline_common::definitions::LatticeDefinitions;
use tracing::debug;

use crate::element::{Element, ElementArena, ElementId};
use crate::error::BuildDiagnostic;

/// Ordered members of one machine area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    order: Vec<String>,
    members: Vec<ElementId>,
}

impl Section {
    /// Resolve `order` against `arena`, reporting names that cannot be used.
    pub fn build(
        name: &str,
        order: &[String],
        arena: &ElementArena,
        diagnostics: &mut Vec<BuildDiagnostic>,
    ) -> Self {
        let mut members = Vec::with_capacity(order.len());
        for element in order {
            match arena.get_full(element.as_str()) {
                None => diagnostics.push(BuildDiagnostic::MissingElement {
                    area: name.to_string(),
                    element: element.clone(),
                }),
                Some((_, _, e)) if e.machine_area != name => {
                    diagnostics.push(BuildDiagnostic::AreaMismatch {
                        area: name.to_string(),
                        element: element.clone(),
                        actual_area: e.machine_area.clone(),
                    })
                }
                Some((index, _, _)) => members.push(ElementId(index)),
            }
        }

        Self {
            name: name.to_string(),
            order: order.to_vec(),
            members,
        }
    }

    /// Section of `area` taken from `arena` in registration order.
    pub fn inferred(area: &str, arena: &ElementArena) -> Self {
        let members: Vec<ElementId> = arena
            .values()
            .enumerate()
            .filter(|(_, e)| e.machine_area == area)
            .map(|(index, _)| ElementId(index))
            .collect();
        let order = members
            .iter()
            .filter_map(|id| arena.get_index(id.0).map(|(name, _)| name.clone()))
            .collect();

        Self {
            name: area.to_string(),
            order,
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared order, including names that did not resolve.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Resolved members in declared order.
    pub fn members(&self) -> &[ElementId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member elements.
    pub fn elements<'a>(&'a self, arena: &'a ElementArena) -> impl Iterator<Item = &'a Element> + 'a {
        self.members.iter().filter_map(move |id| arena.get_index(id.0).map(|(_, e)| e))
    }

    /// Member names.
    pub fn names<'a>(&'a self, arena: &'a ElementArena) -> Vec<&'a str> {
        self.elements(arena).map(|e| e.name.as_str()).collect()
    }
}

/// Build every section declared in `definitions`, plus an inferred section
/// for each registered area that has no declared order.
pub fn build_sections(
    arena: &ElementArena,
    definitions: &LatticeDefinitions,
) -> (BTreeMap<String, Section>, Vec<BuildDiagnostic>) {
    let mut diagnostics = Vec::new();
    let mut sections: BTreeMap<String, Section> = definitions
        .sections
        .iter()
        .map(|(area, order)| {
            let section = Section::build(area, order, arena, &mut diagnostics);
            (area.clone(), section)
        })
        .collect();

    for element in arena.values() {
        let area = element.machine_area.as_str();
        if definitions.sections.contains_key(area) || sections.contains_key(area) {
            continue;
        }
        let section = Section::inferred(area, arena);
        diagnostics.push(BuildDiagnostic::InferredOrder {
            area: area.to_string(),
            elements: section.len(),
        });
        sections.insert(area.to_string(), section);
    }

    debug!(
        sections = sections.len(),
        diagnostics = diagnostics.len(),
        "Built sections"
    );
    (sections, diagnostics)
}
