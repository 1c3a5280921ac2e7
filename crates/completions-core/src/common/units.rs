use super::constants::{
    FEET_PER_METER, FIELD_D_FACTOR_PER_METRIC, FIELD_TRANSMISSIBILITY_PER_METRIC,
    SQUARE_FEET_PER_SQUARE_METER,
};
use crate::domain::{CompletionData, UnitSystem};

/// Conversion from the internal metric representation to the unit system a
/// table is written in. Applied once, right before formatting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportUnits {
    pub unit_system: UnitSystem,
    length: f64,
    area: f64,
    transmissibility: f64,
    d_factor: f64,
}

impl ExportUnits {
    pub fn for_unit_system(unit_system: UnitSystem) -> Self {
        match unit_system {
            UnitSystem::Metric => Self {
                unit_system,
                length: 1.0,
                area: 1.0,
                transmissibility: 1.0,
                d_factor: 1.0,
            },
            UnitSystem::Field => Self {
                unit_system,
                length: FEET_PER_METER,
                area: SQUARE_FEET_PER_SQUARE_METER,
                transmissibility: FIELD_TRANSMISSIBILITY_PER_METRIC,
                d_factor: FIELD_D_FACTOR_PER_METRIC,
            },
        }
    }

    pub fn is_identity(&self) -> bool {
        self.unit_system == UnitSystem::Metric
    }

    pub fn length(&self, meters: f64) -> f64 {
        meters * self.length
    }

    pub fn area(&self, square_meters: f64) -> f64 {
        square_meters * self.area
    }

    pub fn transmissibility(&self, metric: f64) -> f64 {
        metric * self.transmissibility
    }

    /// Permeability-thickness; permeability stays in mD.
    pub fn kh(&self, metric: f64) -> f64 {
        metric * self.length
    }

    /// Conductivity kf*wf; permeability stays in mD.
    pub fn conductivity(&self, metric: f64) -> f64 {
        metric * self.length
    }

    pub fn d_factor(&self, metric: f64) -> f64 {
        metric * self.d_factor
    }

    pub fn convert_completions(&self, completions: &mut [CompletionData]) {
        if self.is_identity() {
            return;
        }
        for completion in completions {
            completion.transmissibility = self.transmissibility(completion.transmissibility);
            completion.kh = self.kh(completion.kh);
            completion.diameter = self.length(completion.diameter);
            completion.d_factor = completion.d_factor.map(|value| self.d_factor(value));
        }
    }
}

/// Scale factor turning lengths given in `unit_system` into meters.
pub fn meters_per_unit(unit_system: UnitSystem) -> f64 {
    match unit_system {
        UnitSystem::Metric => 1.0,
        UnitSystem::Field => super::constants::METERS_PER_FOOT,
    }
}

#[cfg(test)]
mod tests {
    use super::{ExportUnits, meters_per_unit};
    use crate::domain::{CellAddress, CompletionData, CompletionType, UnitSystem};

    #[test]
    fn metric_conversion_leaves_values_untouched() {
        let units = ExportUnits::for_unit_system(UnitSystem::Metric);
        assert!(units.is_identity());
        assert_eq!(units.length(12.5), 12.5);
        assert_eq!(units.transmissibility(3.0), 3.0);
    }

    #[test]
    fn field_conversion_scales_completion_columns() {
        let units = ExportUnits::for_unit_system(UnitSystem::Field);
        let mut completion = CompletionData::new(
            "P1",
            CellAddress {
                global_cell_index: 0,
                grid_index: 0,
                grid_name: None,
                ijk: [0, 0, 0],
            },
            CompletionType::Perforation,
            100.0,
        );
        completion.transmissibility = 10.0;
        completion.kh = 100.0;
        completion.diameter = 0.2;
        completion.d_factor = Some(1.0e-4);

        units.convert_completions(std::slice::from_mut(&mut completion));

        assert!((completion.transmissibility - 4.33667).abs() < 1.0e-9);
        assert!((completion.kh - 328.0839895).abs() < 1.0e-6);
        assert!((completion.diameter - 0.656167979).abs() < 1.0e-9);
        assert!((completion.d_factor.expect("d-factor") - 2.83168e-3).abs() < 1.0e-12);
    }

    #[test]
    fn field_lengths_convert_to_meters() {
        assert_eq!(meters_per_unit(UnitSystem::Metric), 1.0);
        assert!((meters_per_unit(UnitSystem::Field) * 100.0 - 30.48).abs() < 1.0e-12);
    }
}
