use super::equations::{
    self, cell_main_direction, effective_h, effective_k, total_kh, well_bore_transmissibility,
};
use super::{cell_flow_properties, retain_exportable};
use crate::common::constants::{DARCY_METRIC, NON_DARCY_ALPHA_METRIC};
use crate::domain::{CompletionData, CompletionType, ComputeResult};
use crate::model::completions::{Completion, NonDarcyParameters, PerforationInterval};
use crate::modules::export::ExportContext;
use crate::modules::intersection::{GridCellIntersection, find_intersections_in_range};
use crate::modules::traits::{CompletionGenerator, WellCompletionRequest};

/// Perforated main-bore intervals open at the export time step.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerforationGenerator;

impl CompletionGenerator for PerforationGenerator {
    fn completion_type(&self) -> CompletionType {
        CompletionType::Perforation
    }

    fn generate(
        &self,
        request: &WellCompletionRequest<'_>,
        context: &mut ExportContext<'_>,
    ) -> ComputeResult<Vec<CompletionData>> {
        let time_step = context.settings.time_step;
        let use_lateral_ntg = context.settings.use_lateral_ntg;
        let mut completions = Vec::new();

        for interval in request.completions.iter().filter_map(|completion| match completion {
            Completion::Perforation(interval) if interval.is_active_at(time_step) => Some(interval),
            _ => None,
        }) {
            let intersections = find_intersections_in_range(
                request.grid,
                request.geometry,
                interval.start_md,
                interval.end_md,
            );
            for intersection in &intersections {
                if let Some(completion) =
                    perforation_completion(request, interval, intersection, use_lateral_ntg)
                {
                    completions.push(completion);
                }
            }
        }

        retain_exportable(
            &mut completions,
            context.settings.include_zero_transmissibility_connections,
            &mut context.log,
        );
        tracing::debug!(
            well = request.well_name,
            count = completions.len(),
            "perforation connections"
        );
        Ok(completions)
    }
}

fn perforation_completion(
    request: &WellCompletionRequest<'_>,
    interval: &PerforationInterval,
    intersection: &GridCellIntersection,
    use_lateral_ntg: bool,
) -> Option<CompletionData> {
    let cell = intersection.global_cell_index();
    let properties = cell_flow_properties(request.grid, cell)?;
    let lengths = intersection.lengths_in_cell;
    let well_radius = 0.5 * interval.diameter;

    let transmissibility = well_bore_transmissibility(
        &properties,
        lengths,
        use_lateral_ntg,
        well_radius,
        interval.skin_factor,
        DARCY_METRIC,
    );
    let kh = total_kh(&properties, lengths, use_lateral_ntg);
    let direction = cell_main_direction(properties.dimensions, lengths);

    let mut completion = CompletionData::new(
        request.well_name,
        intersection.cell.clone(),
        CompletionType::Perforation,
        intersection.start_md,
    );
    completion.set_transmissibility_data(
        transmissibility,
        kh,
        interval.skin_factor,
        interval.diameter,
        direction,
    );
    completion.is_main_bore = true;
    completion.d_factor = match request.non_darcy {
        NonDarcyParameters::None => None,
        NonDarcyParameters::UserDefined { d_factor } => Some(*d_factor),
        NonDarcyParameters::Computed {
            inertial_coefficient,
            permeability_scaling,
            porosity_scaling,
            relative_gas_density,
            gas_viscosity,
        } => equations::computed_d_factor(
            NON_DARCY_ALPHA_METRIC,
            *inertial_coefficient,
            *permeability_scaling,
            *porosity_scaling,
            effective_k(&properties, lengths, use_lateral_ntg),
            effective_h(&properties, lengths, use_lateral_ntg),
            request.grid.porosity(cell),
            well_radius,
            *relative_gas_density,
            *gas_viscosity,
        ),
    };
    completion.add_metadata(
        "Perforation Completion",
        format!(
            "MD In: {:.3} - MD Out: {:.3} Transmissibility: {:.4E}",
            intersection.start_md, intersection.end_md, transmissibility
        ),
    );
    Some(completion)
}

#[cfg(test)]
mod tests {
    use super::PerforationGenerator;
    use crate::common::constants::DARCY_METRIC;
    use crate::domain::{CellDirection, CompletionType, ExportSettings, UnitSystem};
    use crate::model::completions::{Completion, NonDarcyParameters, PerforationInterval};
    use crate::model::grid::{CartesianGridSpec, CellProperty, GridCase};
    use crate::model::well_path::{WellPath, WellPathGeometry};
    use crate::modules::export::ExportContext;
    use crate::modules::transmissibility::equations::peaceman_equivalent_radius;
    use crate::modules::{CompletionGenerator, WellCompletionRequest};
    use std::f64::consts::PI;

    fn column_case() -> GridCase {
        GridCase::cartesian(
            "CASE",
            UnitSystem::Metric,
            &CartesianGridSpec::uniform([1, 1, 3], [100.0, 100.0, 10.0], [0.0, 0.0], -1000.0),
        )
        .expect("grid")
    }

    fn vertical_well(perforation: PerforationInterval) -> WellPath {
        let geometry = WellPathGeometry::new(
            vec![[50.0, 50.0, -900.0], [50.0, 50.0, -1100.0]],
            vec![900.0, 1100.0],
        )
        .expect("geometry");
        WellPath::new("W1", UnitSystem::Metric, geometry)
            .with_completion(Completion::Perforation(perforation))
    }

    #[test]
    fn perforation_through_three_layers_gives_one_connection_per_layer() {
        let case = column_case();
        let well = vertical_well(PerforationInterval {
            start_md: 1000.0,
            end_md: 1030.0,
            ..PerforationInterval::default()
        });
        let request = WellCompletionRequest::for_well_path(&case, &well, &[]);
        let mut context = ExportContext::new(Some(&case), ExportSettings::default());

        let completions = PerforationGenerator
            .generate(&request, &mut context)
            .expect("perforations");

        assert_eq!(completions.len(), 3);
        let r0 = peaceman_equivalent_radius(100.0, 100.0, 100.0, 100.0);
        let expected = DARCY_METRIC * 2.0 * PI * 100.0 * 10.0 / (r0 / 0.108).ln();
        for (k, completion) in completions.iter().enumerate() {
            assert_eq!(completion.cell.ijk, [0, 0, k]);
            assert_eq!(completion.completion_type, CompletionType::Perforation);
            assert_eq!(completion.direction, CellDirection::K);
            assert!((completion.transmissibility - expected).abs() < 1.0e-9 * expected);
            assert!((completion.kh - 1000.0).abs() < 1.0e-6);
            assert!(completion.d_factor.is_none());
        }
    }

    #[test]
    fn zero_permeability_cells_are_dropped_unless_requested() {
        let mut case = column_case();
        case.set_property(CellProperty::PermZ, &[10.0, 10.0, 10.0]).expect("permz");
        case.set_property(CellProperty::PermX, &[100.0, 0.0, 100.0]).expect("permx");
        let well = vertical_well(PerforationInterval {
            start_md: 1000.0,
            end_md: 1030.0,
            ..PerforationInterval::default()
        });
        let request = WellCompletionRequest::for_well_path(&case, &well, &[]);

        let mut context = ExportContext::new(Some(&case), ExportSettings::default());
        let kept = PerforationGenerator
            .generate(&request, &mut context)
            .expect("perforations");
        assert_eq!(kept.len(), 2);

        let settings = ExportSettings {
            include_zero_transmissibility_connections: true,
            ..ExportSettings::default()
        };
        let mut context = ExportContext::new(Some(&case), settings);
        let all = PerforationGenerator
            .generate(&request, &mut context)
            .expect("perforations");
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].transmissibility, 0.0);
    }

    #[test]
    fn intervals_closed_at_time_step_are_ignored() {
        let case = column_case();
        let well = vertical_well(PerforationInterval {
            start_md: 1000.0,
            end_md: 1030.0,
            active_from_time_step: Some(2),
            ..PerforationInterval::default()
        });
        let request = WellCompletionRequest::for_well_path(&case, &well, &[]);
        let mut context = ExportContext::new(Some(&case), ExportSettings::default());
        assert!(
            PerforationGenerator
                .generate(&request, &mut context)
                .expect("perforations")
                .is_empty()
        );
    }

    #[test]
    fn user_defined_d_factor_is_attached() {
        let case = column_case();
        let mut well = vertical_well(PerforationInterval {
            start_md: 1000.0,
            end_md: 1010.0,
            ..PerforationInterval::default()
        });
        well.non_darcy = NonDarcyParameters::UserDefined { d_factor: 0.002 };
        let request = WellCompletionRequest::for_well_path(&case, &well, &[]);
        let mut context = ExportContext::new(Some(&case), ExportSettings::default());
        let completions = PerforationGenerator
            .generate(&request, &mut context)
            .expect("perforations");
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].d_factor, Some(0.002));
        assert_eq!(completions[0].metadata[0].name, "Perforation Completion");
    }
}
