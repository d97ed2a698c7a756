//! Drift synthesis and cumulative s-positions.
//!
//! Drifts fill the space between consecutive elements of a resolved path.
//! They are never stored in the registry.
//!
//! A drift is named `drift-<left>-<right>`. Hyphenated element names can make
//! that ambiguous, so a name already used on the path gets a numeric suffix.

use std::collections::HashSet;

use beamline_common::consts::{DRIFT_MIN_LENGTH, DRIFT_PREFIX, DRIFT_ROUNDING_DECIMALS};
use beamline_common::geometry::{Position, Rotation};
use indexmap::IndexMap;

use crate::element::Element;
use crate::placement::PhysicalPlacement;

/// Field-free gap between two elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Drift {
    pub name: String,
    /// Area of the downstream neighbour.
    pub machine_area: String,
    pub middle: Position,
    /// Signed by the longitudinal direction of travel.
    pub length: f64,
    /// Yaw aligning the local z-axis with the gap.
    pub rotation: Rotation,
}

impl Drift {
    /// Gap from the exit of `left` to the entry of `right`.
    ///
    /// Returns `None` when the signed gap, rounded to micrometres, is at or
    /// below 1 µm. That covers touching and overlapping neighbours.
    pub fn between(left: &Element, right: &Element) -> Option<Self> {
        let exit = left.end();
        let entry = right.start();
        let delta = entry - exit;
        let length = delta.norm().copysign(delta.z);
        if round_to(length, DRIFT_ROUNDING_DECIMALS) <= DRIFT_MIN_LENGTH {
            return None;
        }

        let axis = delta * (1.0 / length);
        Some(Self {
            name: format!("{DRIFT_PREFIX}-{}-{}", left.name, right.name),
            machine_area: right.machine_area.clone(),
            middle: exit.midpoint(entry),
            length,
            rotation: Rotation::yaw(axis.x.atan2(axis.z)),
        })
    }
}

impl PhysicalPlacement for Drift {
    fn middle(&self) -> Position {
        self.middle
    }

    fn length(&self) -> f64 {
        self.length
    }

    fn rotation(&self) -> Rotation {
        self.rotation
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// A registry element or a synthesised drift.
#[derive(Debug, Clone, PartialEq)]
pub enum LatticeItem<'a> {
    Element(&'a Element),
    Drift(Drift),
}

impl LatticeItem<'_> {
    pub fn name(&self) -> &str {
        match self {
            Self::Element(e) => &e.name,
            Self::Drift(d) => &d.name,
        }
    }

    pub fn machine_area(&self) -> &str {
        match self {
            Self::Element(e) => &e.machine_area,
            Self::Drift(d) => &d.machine_area,
        }
    }

    pub fn is_drift(&self) -> bool {
        matches!(self, Self::Drift(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(e) => Some(*e),
            Self::Drift(_) => None,
        }
    }
}

impl PhysicalPlacement for LatticeItem<'_> {
    fn middle(&self) -> Position {
        match self {
            Self::Element(e) => e.middle(),
            Self::Drift(d) => d.middle(),
        }
    }

    fn length(&self) -> f64 {
        match self {
            Self::Element(e) => e.length(),
            Self::Drift(d) => d.length(),
        }
    }

    fn bend_angle(&self) -> f64 {
        match self {
            Self::Element(e) => e.bend_angle(),
            Self::Drift(d) => d.bend_angle(),
        }
    }

    fn rotation(&self) -> Rotation {
        match self {
            Self::Element(e) => e.rotation(),
            Self::Drift(d) => d.rotation(),
        }
    }

    fn global_rotation(&self) -> Rotation {
        match self {
            Self::Element(e) => e.global_rotation(),
            Self::Drift(d) => d.global_rotation(),
        }
    }
}

/// Interleave `elements` with drifts for every non-zero gap.
///
/// Keys are element and drift names, in beam order. Drift names never
/// collide with each other or with an element on the path.
pub fn insert_drifts<'a>(elements: &[&'a Element]) -> IndexMap<String, LatticeItem<'a>> {
    let reserved: HashSet<&str> = elements.iter().map(|e| e.name.as_str()).collect();
    let mut items = IndexMap::with_capacity(elements.len() * 2);
    let mut iter = elements.iter().peekable();
    while let Some(&element) = iter.next() {
        items.insert(element.name.clone(), LatticeItem::Element(element));
        if let Some(mut drift) = iter.peek().and_then(|next| Drift::between(element, next)) {
            drift.name = unique_name(drift.name, |name| {
                reserved.contains(name) || items.contains_key(name)
            });
            items.insert(drift.name.clone(), LatticeItem::Drift(drift));
        }
    }
    items
}

fn unique_name(base: String, taken: impl Fn(&str) -> bool) -> String {
    if !taken(&base) {
        return base;
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Cumulative s at the exit of each non-drift item.
///
/// Every item (drift or not) advances s by its length.
pub fn s_positions(items: &IndexMap<String, LatticeItem<'_>>) -> IndexMap<String, f64> {
    let mut s = 0.0;
    items
        .values()
        .filter_map(|item| {
            s += item.length();
            (!item.is_drift()).then(|| (item.name().to_string(), s))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn straight(name: &str, z: f64, length: f64) -> Element {
        Element::new(name, "A")
            .with_middle([0.0, 0.0, z])
            .with_length(length)
    }

    #[test]
    fn one_metre_gap_gives_one_drift() {
        let a = straight("A1", 0.0, 1.0);
        let b = Element::new("B1", "B")
            .with_middle([0.0, 0.0, 2.0])
            .with_length(1.0);
        let items = insert_drifts(&[&a, &b]);

        assert_eq!(items.len(), 3);
        let drift = &items[1];
        assert!(drift.is_drift());
        assert_eq!(drift.name(), "drift-A1-B1");
        assert_eq!(drift.machine_area(), "B");
        assert!((drift.length() - 1.0).abs() < EPS);
        assert!(drift.middle().approx_eq(Position::on_axis(1.0), EPS));
        assert!(drift.start().approx_eq(a.end(), EPS));
        assert!(drift.end().approx_eq(b.start(), EPS));
    }

    #[test]
    fn touching_elements_get_no_drift() {
        let a = straight("A1", 0.0, 1.0);
        let b = straight("B1", 1.0, 1.0);
        assert_eq!(insert_drifts(&[&a, &b]).len(), 2);

        let c = straight("C1", 2.0 + 1e-7, 1.0);
        assert!(Drift::between(&b, &c).is_none());
    }

    #[test]
    fn micrometre_gaps_get_no_drift() {
        let a = straight("A1", 0.0, 1.0);
        for gap in [1e-6, 9e-7, 6e-7] {
            let b = straight("B1", 1.0 + gap, 1.0);
            assert!(Drift::between(&a, &b).is_none(), "gap {gap}");
        }

        let b = straight("B1", 1.0 + 2e-6, 1.0);
        let drift = Drift::between(&a, &b).expect("2 µm gap");
        assert!((drift.length - 2e-6).abs() < 1e-9);
    }

    #[test]
    fn hyphenated_names_keep_every_drift() {
        let s1 = straight("S1", 0.0, 0.1);
        let qx = straight("Q-X", 1.0, 0.1);
        let s1q = straight("S1-Q", 2.0, 0.1);
        let x = straight("X", 3.0, 0.1);
        let items = insert_drifts(&[&s1, &qx, &s1q, &x]);

        let names: Vec<&str> = items.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            ["S1", "drift-S1-Q-X", "Q-X", "drift-Q-X-S1-Q", "S1-Q", "drift-S1-Q-X-2", "X"]
        );
        let s = s_positions(&items);
        assert!((s["X"] - 3.1).abs() < 1e-9);
    }

    #[test]
    fn drift_never_replaces_an_element() {
        let a = straight("A", 0.0, 0.1);
        let b = straight("B", 1.0, 0.1);
        let impostor = straight("drift-A-B", 2.0, 0.1);
        let items = insert_drifts(&[&a, &b, &impostor]);

        assert_eq!(items.len(), 5);
        assert!(!items["drift-A-B"].is_drift());
        assert!(items["drift-A-B-2"].is_drift());
    }

    #[test]
    fn overlapping_elements_get_no_drift() {
        let a = straight("A1", 0.0, 1.0);
        let b = straight("B1", 0.5, 1.0);
        assert!(Drift::between(&a, &b).is_none());
    }

    #[test]
    fn transverse_gap_follows_the_line() {
        let turned = Rotation::yaw(std::f64::consts::FRAC_PI_2);
        let a = straight("A1", 0.0, 0.0).with_middle([1.0, 0.0, 0.0]).with_rotation(turned);
        let b = straight("B1", 0.0, 0.0).with_middle([3.0, 0.0, 0.0]).with_rotation(turned);
        let drift = Drift::between(&a, &b).unwrap();
        assert!((drift.length - 2.0).abs() < EPS);
        assert!(drift.start().approx_eq(a.end(), 1e-9));
        assert!(drift.end().approx_eq(b.start(), 1e-9));
    }

    #[test]
    fn s_positions_skip_drifts_but_count_them() {
        let a = straight("A1", 0.1, 0.1);
        let b = straight("B1", 0.5, 0.1);
        let s = s_positions(&insert_drifts(&[&a, &b]));
        assert_eq!(s.keys().collect::<Vec<_>>(), ["A1", "B1"]);
        assert!((s["A1"] - 0.1).abs() < EPS);
        assert!((s["B1"] - 0.5).abs() < EPS);
    }

    #[test]
    fn s_positions_with_zero_length_marker() {
        let a = straight("A1", 0.05, 0.1);
        let m = straight("M1", 0.1, 0.0);
        let b = straight("B1", 0.2, 0.2);
        let items = insert_drifts(&[&a, &m, &b]);
        assert!(items.values().all(|i| !i.is_drift()));

        let s: Vec<f64> = s_positions(&items).values().copied().collect();
        let expected = [0.1, 0.1, 0.3];
        for (got, want) in s.iter().zip(expected) {
            assert!((got - want).abs() < EPS, "{got} != {want}");
        }
    }

    #[test]
    fn empty_and_single() {
        assert!(insert_drifts(&[]).is_empty());
        let a = straight("A1", 0.0, 1.0);
        let items = insert_drifts(&[&a]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_element(), Some(&a));
    }
}
