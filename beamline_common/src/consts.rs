//! Numeric constants for the beamline workspace.
//!
//! Single source of truth for geometry thresholds and default file names.
//! Imported by all crates; no duplication permitted.

/// Bend angles with magnitude at or below this value [rad] are treated as straight.
pub const BEND_ANGLE_EPSILON: f64 = 1e-9;

/// Slack [m] allowed when checking that an element ends before its successor starts.
///
/// Touching elements computed from different middles differ by a few ulps.
pub const ORDER_TOLERANCE: f64 = 1e-9;

/// Gap lengths are rounded to this many decimal places before deciding on a drift.
pub const DRIFT_ROUNDING_DECIMALS: i32 = 6;

/// Rounded gaps [m] at or below this length get no drift.
pub const DRIFT_MIN_LENGTH: f64 = 1e-6;

/// Unit vector along the survey z-axis (beam direction).
pub const BEAM_AXIS: [f64; 3] = [0.0, 0.0, 1.0];

/// Name of the lattice definitions file inside a machine directory.
pub const DEFINITIONS_FILE: &str = "lattice.toml";

/// Sub-directory of a machine directory holding element catalogues.
pub const ELEMENTS_DIR: &str = "elements";

/// Prefix for synthesised drift element names.
pub const DRIFT_PREFIX: &str = "drift";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(BEND_ANGLE_EPSILON > 0.0 && BEND_ANGLE_EPSILON < 1e-6);
        assert!(ORDER_TOLERANCE > 0.0);
        assert!(DRIFT_ROUNDING_DECIMALS > 0);
        assert!(DRIFT_MIN_LENGTH >= 10f64.powi(-DRIFT_ROUNDING_DECIMALS));
        assert!(!DRIFT_PREFIX.is_empty());
    }

    #[test]
    fn beam_axis_is_unit_z() {
        let norm: f64 = BEAM_AXIS.iter().map(|c| c * c).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
        assert_eq!(BEAM_AXIS[2], 1.0);
    }
}
