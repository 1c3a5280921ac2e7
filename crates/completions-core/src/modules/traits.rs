use crate::domain::{CompletionData, CompletionType, ComputeResult};
use crate::model::completions::{Completion, NonDarcyParameters};
use crate::model::fracture_template::FractureTemplate;
use crate::model::grid::GridProvider;
use crate::model::well_path::{WellPath, WellPathGeometry};
use crate::modules::export::ExportContext;

/// Everything a generator needs to know about one well.
#[derive(Clone, Copy)]
pub struct WellCompletionRequest<'a> {
    pub grid: &'a dyn GridProvider,
    pub well_name: &'a str,
    pub geometry: &'a WellPathGeometry,
    pub completions: &'a [Completion],
    pub non_darcy: &'a NonDarcyParameters,
    pub templates: &'a [FractureTemplate],
}

impl<'a> WellCompletionRequest<'a> {
    pub fn for_well_path(
        grid: &'a dyn GridProvider,
        well_path: &'a WellPath,
        templates: &'a [FractureTemplate],
    ) -> Self {
        Self {
            grid,
            well_name: well_path.well_name_for_export(),
            geometry: &well_path.geometry,
            completions: &well_path.completions,
            non_darcy: &well_path.non_darcy,
            templates,
        }
    }
}

/// Turns one kind of completion on a well into per-cell connection records.
pub trait CompletionGenerator {
    fn completion_type(&self) -> CompletionType;

    fn generate(
        &self,
        request: &WellCompletionRequest<'_>,
        context: &mut ExportContext<'_>,
    ) -> ComputeResult<Vec<CompletionData>>;
}

#[cfg(test)]
mod tests {
    use super::{CompletionGenerator, WellCompletionRequest};
    use crate::domain::{
        CompletionData, CompletionError, CompletionType, ComputeResult, ErrorCategory,
        ExportSettings, UnitSystem,
    };
    use crate::model::grid::{CartesianGridSpec, GridCase};
    use crate::model::well_path::{WellPath, WellPathGeometry};
    use crate::modules::export::ExportContext;

    struct FailingGenerator;

    impl CompletionGenerator for FailingGenerator {
        fn completion_type(&self) -> CompletionType {
            CompletionType::Perforation
        }

        fn generate(
            &self,
            _request: &WellCompletionRequest<'_>,
            _context: &mut ExportContext<'_>,
        ) -> ComputeResult<Vec<CompletionData>> {
            Err(CompletionError::computation(
                "RUN.GENERATOR",
                "generator failed",
            ))
        }
    }

    #[test]
    fn generator_uses_shared_error_types() {
        let case = GridCase::cartesian(
            "CASE",
            UnitSystem::Metric,
            &CartesianGridSpec::uniform([1, 1, 1], [10.0, 10.0, 10.0], [0.0, 0.0], 0.0),
        )
        .expect("grid");
        let geometry =
            WellPathGeometry::from_points(vec![[5.0, 5.0, 0.0], [5.0, 5.0, -10.0]], 0.0)
                .expect("geometry");
        let well_path = WellPath::new("W1", UnitSystem::Metric, geometry);
        let request = WellCompletionRequest::for_well_path(&case, &well_path, &[]);
        let mut context = ExportContext::new(Some(&case), ExportSettings::default());

        let error = FailingGenerator
            .generate(&request, &mut context)
            .expect_err("generator should fail");
        assert_eq!(error.category(), ErrorCategory::ComputationError);
        assert_eq!(error.exit_code(), 4);
        assert_eq!(request.well_name, "W1");
    }
}
