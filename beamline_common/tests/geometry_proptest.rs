//! Property tests for the survey-frame vector types.

use beamline_common::geometry::{Position, Rotation};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = f64> {
    -1.0e3f64..1.0e3
}

fn position() -> impl Strategy<Value = Position> {
    (coord(), coord(), coord()).prop_map(|(x, y, z)| Position::new(x, y, z))
}

fn rotation() -> impl Strategy<Value = Rotation> {
    (-4.0f64..4.0, -4.0f64..4.0, -4.0f64..4.0).prop_map(|(phi, psi, theta)| Rotation::new(phi, psi, theta))
}

proptest! {
    #[test]
    fn add_then_sub_round_trips(a in position(), b in position()) {
        prop_assert!(((a + b) - b).approx_eq(a, 1e-9));
    }

    #[test]
    fn reflected_sub_matches_sub(a in position(), b in position()) {
        prop_assert_eq!(b.to_array() - a, b - a);
    }

    #[test]
    fn vector_angle_is_antisymmetric(a in position(), b in position(), d in position()) {
        let forward = a.vector_angle(b, d);
        let backward = b.vector_angle(a, d);
        prop_assert!((forward + backward).abs() <= 1e-6 * (1.0 + forward.abs()));
    }

    #[test]
    fn vector_angle_along_beam_axis_is_delta_z(a in position(), b in position()) {
        prop_assert_eq!(a.vector_angle(b, [0.0, 0.0, 1.0]), a.z - b.z);
    }

    #[test]
    fn yaw_preserves_length(v in position(), theta in -10.0f64..10.0) {
        let rotated = Rotation::yaw(theta).apply_yaw(v);
        prop_assert!((rotated.norm() - v.norm()).abs() <= 1e-9 * (1.0 + v.norm()));
        prop_assert_eq!(rotated.y, v.y);
    }

    #[test]
    fn yaw_composes_additively(v in position(), a in -3.0f64..3.0, b in -3.0f64..3.0) {
        let stepwise = Rotation::yaw(b).apply_yaw(Rotation::yaw(a).apply_yaw(v));
        let combined = (Rotation::yaw(a) + Rotation::yaw(b)).apply_yaw(v);
        prop_assert!(stepwise.approx_eq(combined, 1e-9 * (1.0 + v.norm())));
    }

    #[test]
    fn rotation_add_sub_round_trips(a in rotation(), b in rotation()) {
        let back = (a + b) - b;
        prop_assert!((back.phi - a.phi).abs() < 1e-12);
        prop_assert!((back.psi - a.psi).abs() < 1e-12);
        prop_assert!((back.theta - a.theta).abs() < 1e-12);
    }
}
