//! Unit constants shared by the transmissibility kernels and the export
//! conversion step. All kernels run in metric units.

/// Darcy constant for metric units (m, mD, cP, bar, day).
pub const DARCY_METRIC: f64 = 0.008_527;
/// Darcy constant for field units (ft, mD, cP, psi, day).
pub const DARCY_FIELD: f64 = 0.001_127;

/// Non-Darcy alpha coefficient, metric units.
pub const NON_DARCY_ALPHA_METRIC: f64 = 2.244_60e-10;
/// Non-Darcy alpha coefficient, field units.
pub const NON_DARCY_ALPHA_FIELD: f64 = 6.833_52e-8;

pub const FEET_PER_METER: f64 = 3.280_839_895;
pub const METERS_PER_FOOT: f64 = 0.3048;
pub const SQUARE_FEET_PER_SQUARE_METER: f64 = FEET_PER_METER * FEET_PER_METER;

/// rm3/day/bar to rb/day/psi.
pub const FIELD_TRANSMISSIBILITY_PER_METRIC: f64 = 0.433_667;
/// day/sm3 to day/Mscf.
pub const FIELD_D_FACTOR_PER_METRIC: f64 = 28.316_8;

/// Length of the dummy segment representing an ICD valve.
pub const ICD_VALVE_SEGMENT_LENGTH: f64 = 0.1;

/// Fracture cells per axis when an elliptical template is discretized.
pub const ELLIPSE_FRACTURE_CELLS_PER_AXIS: usize = 35;

pub const MIN_INTERSECTION_LENGTH: f64 = 1.0e-6;

#[cfg(test)]
mod tests {
    use super::{
        DARCY_FIELD, DARCY_METRIC, FEET_PER_METER, METERS_PER_FOOT, NON_DARCY_ALPHA_FIELD,
        NON_DARCY_ALPHA_METRIC,
    };

    #[test]
    fn length_factors_are_reciprocal() {
        assert!((FEET_PER_METER * METERS_PER_FOOT - 1.0).abs() < 1.0e-9);
    }

    #[test]
    fn darcy_and_alpha_constants_match_reference_values() {
        assert_eq!(DARCY_METRIC, 0.008527);
        assert_eq!(DARCY_FIELD, 0.001127);
        assert_eq!(NON_DARCY_ALPHA_METRIC, 2.24460e-10);
        assert_eq!(NON_DARCY_ALPHA_FIELD, 6.83352e-8);
    }
}
