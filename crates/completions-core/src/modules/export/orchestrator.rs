use super::context::{ExportContext, ExportLog};
use super::file_split::{ExportFile, ExportFileKind, WellCompletionSet, plan_completion_files};
use crate::common::units::ExportUnits;
use crate::domain::{
    CompdatExportType, CompletionData, CompletionError, CompletionType, ComputeResult,
    ErrorCategory,
};
use crate::model::completions::{Completion, NonDarcyParameters};
use crate::model::fracture_template::FractureTemplate;
use crate::model::grid::GridProvider;
use crate::model::simulation_well::SimulationWell;
use crate::model::well_path::WellPath;
use crate::modules::aggregation::aggregate_well_completions;
use crate::modules::intersection::find_cell_intersections;
use crate::modules::msw::{
    MswExportInfo, build_fishbones_msw, build_fractures_msw, build_perforations_msw,
};
use crate::modules::serialization::write_text_artifact;
use crate::modules::tables::{
    CompdatOptions, TableDocument, TableFormatter, WellSpecEntry, compdat_table,
    fracture_report_section, msw_document, welspecs_table, wpimult_table,
};
use crate::modules::{CompletionGenerator, WellCompletionRequest};
use crate::modules::transmissibility::{FishbonesGenerator, FractureGenerator, PerforationGenerator};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};

const FRACTURE_DEBUG_FILE: &str = "FractureTransmissibilityExportInformation";

/// Wells and templates handed to one export run.
#[derive(Debug, Clone, Copy)]
pub struct ExportProject<'a> {
    pub well_paths: &'a [WellPath],
    pub simulation_wells: &'a [SimulationWell],
    pub fracture_templates: &'a [FractureTemplate],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    pub files_written: Vec<PathBuf>,
    pub wells_exported: Vec<String>,
    pub wells_skipped: Vec<String>,
    pub completion_count: usize,
}

/// Runs the completion pipeline for every selected well and writes the
/// completion, MSW and debug files into the configured folder.
pub fn export_completions(
    project: &ExportProject<'_>,
    context: &mut ExportContext<'_>,
) -> ComputeResult<ExportSummary> {
    let case = context.case.ok_or_else(|| {
        CompletionError::input_validation(
            "EXPORT.MISSING_CASE",
            "no simulation case is selected for the completion export",
        )
    })?;
    let folder = context.settings.folder.clone();
    fs::create_dir_all(&folder).map_err(|source| {
        CompletionError::io_system(
            "IO.EXPORT_FOLDER",
            format!("cannot create export folder '{}': {source}", folder.display()),
        )
    })?;
    let filter = well_filter(&context.settings.well_filters)?;

    let units = ExportUnits::for_unit_system(case.unit_system());
    let mut summary = ExportSummary::default();
    let mut sets: Vec<WellCompletionSet> = Vec::new();

    let selected: Vec<&WellPath> = project
        .well_paths
        .iter()
        .filter(|well| filter.as_ref().is_none_or(|set| set.is_match(&well.name)))
        .collect();
    context
        .progress
        .begin(3 * selected.len() + project.simulation_wells.len());
    tracing::info!(
        case = %case.case_name(),
        wells = selected.len(),
        simulation_wells = project.simulation_wells.len(),
        "starting completion export"
    );

    let mut exported_wells: Vec<&WellPath> = Vec::new();
    for well in selected {
        context.check_cancelled()?;
        if well.unit_system != case.unit_system() {
            context.log.error(
                "EXPORT.UNIT_MISMATCH",
                format!(
                    "Well path '{}' uses {} units but the case uses {}; well not exported",
                    well.name,
                    well.unit_system,
                    case.unit_system()
                ),
            );
            summary.wells_skipped.push(well.name.clone());
            for _ in 0..3 {
                context.progress.advance();
            }
            continue;
        }

        match well_path_completions(case, well, project.fracture_templates, context) {
            Ok(completions) => {
                exported_wells.push(well);
                if completions.is_empty() {
                    context.log.info(
                        "EXPORT.NO_COMPLETIONS",
                        format!("Well path '{}' has no connections to export", well.name),
                    );
                    continue;
                }
                summary.wells_exported.push(well.name.clone());
                sets.push(WellCompletionSet {
                    well_name: well.well_name_for_export().to_string(),
                    well_spec: well_path_spec(case, well, &units),
                    completions,
                });
            }
            Err(error) if error.category() == ErrorCategory::Cancelled => return Err(error),
            Err(error) => {
                context.log.error(
                    "EXPORT.WELL_FAILED",
                    format!("Well path '{}' not exported: {}", well.name, error.message()),
                );
                summary.wells_skipped.push(well.name.clone());
            }
        }
    }

    for simulation_well in project.simulation_wells {
        context.check_cancelled()?;
        context
            .progress
            .set_stage(format!("{}: fractures", simulation_well.name));
        let result =
            simulation_well_completions(case, simulation_well, project.fracture_templates, context);
        match result {
            Ok((completions, spec)) => {
                if !completions.is_empty() {
                    summary.wells_exported.push(simulation_well.name.clone());
                    sets.push(WellCompletionSet {
                        well_name: simulation_well.name.clone(),
                        well_spec: spec,
                        completions,
                    });
                }
            }
            Err(error) if error.category() == ErrorCategory::Cancelled => return Err(error),
            Err(error) => {
                context.log.error(
                    "EXPORT.WELL_FAILED",
                    format!(
                        "Simulation well '{}' not exported: {}",
                        simulation_well.name,
                        error.message()
                    ),
                );
                summary.wells_skipped.push(simulation_well.name.clone());
            }
        }
        context.progress.advance();
    }

    for set in &mut sets {
        units.convert_completions(&mut set.completions);
        summary.completion_count += set.completions.len();
    }

    let formatter = TableFormatter::default();
    for file in plan_completion_files(&sets, &context.settings, case.case_name()) {
        context.check_cancelled()?;
        write_completion_file(&folder, &file, &sets, &units, &formatter, context, &mut summary)?;
    }

    if context.settings.include_msw {
        write_msw_files(
            case,
            &exported_wells,
            project,
            &units,
            &formatter,
            context,
            &mut summary,
        )?;
    }

    if context.settings.include_fracture_debug_info && !context.fracture_debug.is_empty() {
        let path = folder.join(FRACTURE_DEBUG_FILE);
        let content = context.fracture_debug.join("\n");
        write_export_file(&path, &content, &mut context.log, &mut summary);
    }

    tracing::info!(
        files = summary.files_written.len(),
        connections = summary.completion_count,
        "completion export finished"
    );
    Ok(summary)
}

fn well_filter(patterns: &[String]) -> ComputeResult<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| {
            CompletionError::input_validation(
                "INPUT.WELL_FILTER",
                format!("invalid well filter '{pattern}': {source}"),
            )
        })?;
        builder.add(glob);
    }
    builder.build().map(Some).map_err(|source| {
        CompletionError::input_validation(
            "INPUT.WELL_FILTER",
            format!("invalid well filters: {source}"),
        )
    })
}

/// Perforations, fishbones and fractures of one well, aggregated per cell.
fn well_path_completions(
    case: &dyn GridProvider,
    well: &WellPath,
    templates: &[FractureTemplate],
    context: &mut ExportContext<'_>,
) -> ComputeResult<Vec<CompletionData>> {
    let request = WellCompletionRequest::for_well_path(case, well, templates);
    let generators: [(&dyn CompletionGenerator, bool); 3] = [
        (&PerforationGenerator, context.settings.include_perforations),
        (&FishbonesGenerator, context.settings.include_fishbones),
        (&FractureGenerator, context.settings.include_fractures),
    ];

    let mut completions = Vec::new();
    for (generator, enabled) in generators {
        context.progress.set_stage(format!(
            "{}: {}",
            well.name,
            generator.completion_type().as_str()
        ));
        if enabled {
            completions.extend(generator.generate(&request, context)?);
        }
        context.progress.advance();
    }

    Ok(aggregate_well_completions(
        completions,
        context.settings.combination_mode,
        context.settings.compdat_export,
        case,
        &mut context.log,
    ))
}

fn simulation_well_completions(
    case: &dyn GridProvider,
    simulation_well: &SimulationWell,
    templates: &[FractureTemplate],
    context: &mut ExportContext<'_>,
) -> ComputeResult<(Vec<CompletionData>, Option<WellSpecEntry>)> {
    if !context.settings.include_fractures || simulation_well.fractures.is_empty() {
        return Ok((Vec::new(), None));
    }
    let centerline = simulation_well.centerline(case)?;
    let completions: Vec<Completion> = simulation_well
        .fractures
        .iter()
        .cloned()
        .map(Completion::Fracture)
        .collect();
    let non_darcy = NonDarcyParameters::None;
    let request = WellCompletionRequest {
        grid: case,
        well_name: &simulation_well.name,
        geometry: &centerline,
        completions: &completions,
        non_darcy: &non_darcy,
        templates,
    };
    let generated = FractureGenerator.generate(&request, context)?;
    let aggregated = aggregate_well_completions(
        generated,
        context.settings.combination_mode,
        context.settings.compdat_export,
        case,
        &mut context.log,
    );

    let units = ExportUnits::for_unit_system(case.unit_system());
    let spec = simulation_well.cells.first().map(|ijk| WellSpecEntry {
        well_name: simulation_well.name.clone(),
        group_name: "GROUP1".to_string(),
        grid_name: None,
        i: ijk[0] + 1,
        j: ijk[1] + 1,
        reference_depth: Some(units.length(centerline.tvd_at_md(centerline.start_md()))),
        phase: "OIL".to_string(),
        drainage_radius: None,
    });
    Ok((aggregated, spec))
}

/// Head of the well: first main-grid cell the trajectory enters.
fn well_path_spec(
    case: &dyn GridProvider,
    well: &WellPath,
    units: &ExportUnits,
) -> Option<WellSpecEntry> {
    let geometry = &well.geometry;
    let first = find_cell_intersections(case, geometry.points(), geometry.measured_depths())
        .into_iter()
        .find(|intersection| intersection.cell.is_main_grid())?;
    let [i, j, _] = first.cell.one_based_ijk();
    let reference_depth = well.export.reference_depth.unwrap_or(first.start_tvd());
    Some(WellSpecEntry {
        well_name: well.well_name_for_export().to_string(),
        group_name: well.export.group_name.clone(),
        grid_name: None,
        i,
        j,
        reference_depth: Some(units.length(reference_depth)),
        phase: well.export.preferred_phase.clone(),
        drainage_radius: well.export.drainage_radius.map(|radius| units.length(radius)),
    })
}

/// A file that cannot be written is logged and left out; the export goes on
/// with the remaining files.
fn write_export_file(
    path: &Path,
    content: &str,
    log: &mut ExportLog,
    summary: &mut ExportSummary,
) -> bool {
    match write_text_artifact(path, content) {
        Ok(()) => {
            summary.files_written.push(path.to_path_buf());
            true
        }
        Err(source) => {
            log.error(
                "EXPORT.FILE_WRITE",
                format!("Could not write '{}', file skipped: {source}", path.display()),
            );
            false
        }
    }
}

/// Main-grid records go to `<name>`, LGR records to `<name>_LGR`.
fn write_completion_file(
    folder: &Path,
    file: &ExportFile,
    sets: &[WellCompletionSet],
    units: &ExportUnits,
    formatter: &TableFormatter,
    context: &mut ExportContext<'_>,
    summary: &mut ExportSummary,
) -> ComputeResult<()> {
    debug_assert_eq!(file.kind, ExportFileKind::Completions);
    let settings = &context.settings;
    let options = CompdatOptions {
        export_type: settings.compdat_export,
        data_source_comments: settings.export_data_source_as_comment,
    };
    let wpimult_export =
        settings.compdat_export == CompdatExportType::WpimultAndDefaultConnectionFactors;
    let (main, lgr): (Vec<CompletionData>, Vec<CompletionData>) = file
        .completions
        .iter()
        .cloned()
        .partition(|completion| completion.cell.is_main_grid());

    for (completions, is_lgr) in [(main, false), (lgr, true)] {
        if completions.is_empty() {
            continue;
        }
        let mut document = TableDocument::default();
        let report: Vec<_> = context
            .fracture_report
            .iter()
            .filter(|item| {
                completions.iter().any(|completion| {
                    completion.completion_type == CompletionType::Fracture
                        && completion.well_name == item.well_name
                })
            })
            .cloned()
            .collect();
        if !report.is_empty() {
            document.preamble.push(fracture_report_section(&report, units)?);
        }
        if settings.export_welspecs {
            let specs: Vec<WellSpecEntry> = sets
                .iter()
                .filter(|set| file.well_names.contains(&set.well_name))
                .filter_map(|set| set.well_spec.clone())
                .collect();
            document.push(welspecs_table(&specs, false)?);
        }
        document.push(compdat_table(&completions, is_lgr, options)?);
        if wpimult_export {
            document.push(wpimult_table(&completions, is_lgr)?);
        }

        let name = if is_lgr {
            format!("{}_LGR", file.name)
        } else {
            file.name.clone()
        };
        let path = folder.join(name);
        let content = formatter.render_document(&document);
        if write_export_file(&path, &content, &mut context.log, summary) {
            tracing::info!(file = %path.display(), "wrote completion file");
        }
    }
    Ok(())
}

fn write_msw_files(
    case: &dyn GridProvider,
    wells: &[&WellPath],
    project: &ExportProject<'_>,
    units: &ExportUnits,
    formatter: &TableFormatter,
    context: &mut ExportContext<'_>,
    summary: &mut ExportSummary,
) -> ComputeResult<()> {
    let settings = context.settings.clone();
    let kinds = [
        (ExportFileKind::FishbonesMsw, "Fishbones", settings.include_fishbones),
        (ExportFileKind::FracturesMsw, "Fractures", settings.include_fractures),
        (ExportFileKind::PerforationsMsw, "Perforations", settings.include_perforations),
    ];
    for (kind, label, enabled) in kinds {
        if !enabled {
            continue;
        }
        let mut infos: Vec<MswExportInfo> = Vec::new();
        for well in wells {
            context.check_cancelled()?;
            let log = &mut context.log;
            let built = match kind {
                ExportFileKind::FishbonesMsw => {
                    build_fishbones_msw(case, well, settings.exclude_main_bore_for_fishbones, log)
                }
                ExportFileKind::FracturesMsw => {
                    build_fractures_msw(case, well, project.fracture_templates, log)
                }
                _ => build_perforations_msw(case, well, settings.time_step, log),
            };
            match built {
                Ok(Some(info)) => infos.push(info),
                Ok(None) => {}
                Err(error) => context.log.error(
                    "MSW.BUILD_FAILED",
                    format!("{label} MSW data for '{}' not exported: {}", well.name, error.message()),
                ),
            }
        }
        if infos.is_empty() {
            continue;
        }

        let mut content = Vec::with_capacity(infos.len());
        for info in &infos {
            content.push(formatter.render_document(&msw_document(info, units)?));
        }
        let path = settings
            .folder
            .join(format!("{}_{label}_MSW", case.case_name()));
        if write_export_file(&path, &content.join("\n"), &mut context.log, summary) {
            tracing::info!(file = %path.display(), wells = infos.len(), "wrote MSW file");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ExportProject, export_completions};
    use crate::domain::{ErrorCategory, ExportSettings, FileSplit, UnitSystem};
    use crate::model::completions::{Completion, PerforationInterval};
    use crate::model::grid::{CartesianGridSpec, GridCase};
    use crate::model::well_path::{WellPath, WellPathGeometry};
    use crate::modules::export::{CancellationToken, ExportContext};
    use std::fs;
    use tempfile::TempDir;

    fn case() -> GridCase {
        GridCase::cartesian(
            "CASE",
            UnitSystem::Metric,
            &CartesianGridSpec::uniform([1, 1, 3], [100.0, 100.0, 10.0], [0.0, 0.0], -1000.0),
        )
        .expect("grid")
    }

    fn vertical(name: &str, unit_system: UnitSystem) -> WellPath {
        let geometry = WellPathGeometry::new(
            vec![[50.0, 50.0, -990.0], [50.0, 50.0, -1040.0]],
            vec![990.0, 1040.0],
        )
        .expect("geometry");
        WellPath::new(name, unit_system, geometry).with_completion(Completion::Perforation(
            PerforationInterval {
                start_md: 1000.0,
                end_md: 1030.0,
                ..PerforationInterval::default()
            },
        ))
    }

    fn settings(folder: &std::path::Path) -> ExportSettings {
        ExportSettings {
            folder: folder.to_path_buf(),
            ..ExportSettings::default()
        }
    }

    #[test]
    fn missing_case_fails_before_writing() {
        let temp = TempDir::new().expect("tempdir should be created");
        let output = temp.path().join("out");
        let wells = [vertical("W1", UnitSystem::Metric)];
        let project = ExportProject {
            well_paths: &wells,
            simulation_wells: &[],
            fracture_templates: &[],
        };
        let mut context = ExportContext::new(None, settings(&output));
        let error = export_completions(&project, &mut context).expect_err("no case");
        assert_eq!(error.placeholder(), "EXPORT.MISSING_CASE");
        assert!(!output.exists());
    }

    #[test]
    fn unit_mismatch_and_filters_skip_wells() {
        let temp = TempDir::new().expect("tempdir should be created");
        let grid = case();
        let wells = [
            vertical("W1", UnitSystem::Metric),
            vertical("W2", UnitSystem::Field),
            vertical("OTHER", UnitSystem::Metric),
        ];
        let project = ExportProject {
            well_paths: &wells,
            simulation_wells: &[],
            fracture_templates: &[],
        };
        let mut export_settings = settings(temp.path());
        export_settings.well_filters = vec!["W*".to_string()];
        let mut context = ExportContext::new(Some(&grid), export_settings);
        let summary = export_completions(&project, &mut context).expect("export");

        assert_eq!(summary.wells_exported, vec!["W1"]);
        assert_eq!(summary.wells_skipped, vec!["W2"]);
        assert_eq!(context.log.entries_with_code("EXPORT.UNIT_MISMATCH").count(), 1);
        assert_eq!(summary.completion_count, 3);
        let content = fs::read_to_string(temp.path().join("UnifiedCompletions_CASE"))
            .expect("unified file");
        assert!(content.contains("W1"));
        assert!(!content.contains("W2"));
    }

    #[test]
    fn cancelled_export_writes_nothing() {
        let temp = TempDir::new().expect("tempdir should be created");
        let grid = case();
        let wells = [vertical("W1", UnitSystem::Metric)];
        let project = ExportProject {
            well_paths: &wells,
            simulation_wells: &[],
            fracture_templates: &[],
        };
        let token = CancellationToken::new();
        token.cancel();
        let mut context =
            ExportContext::new(Some(&grid), settings(temp.path())).with_cancellation(token);
        let error = export_completions(&project, &mut context).expect_err("cancelled");
        assert_eq!(error.category(), ErrorCategory::Cancelled);
        assert_eq!(fs::read_dir(temp.path()).expect("folder").count(), 0);
    }

    #[test]
    fn unwritable_file_is_logged_and_other_wells_are_written() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::create_dir(temp.path().join("A_CASE")).expect("blocking directory");
        let grid = case();
        let wells = [vertical("A", UnitSystem::Metric), vertical("B", UnitSystem::Metric)];
        let project = ExportProject {
            well_paths: &wells,
            simulation_wells: &[],
            fracture_templates: &[],
        };
        let export_settings = ExportSettings {
            file_split: FileSplit::SplitOnWell,
            ..settings(temp.path())
        };
        let mut context = ExportContext::new(Some(&grid), export_settings);
        let summary = export_completions(&project, &mut context).expect("export");

        assert_eq!(summary.files_written, vec![temp.path().join("B_CASE")]);
        assert_eq!(context.log.entries_with_code("EXPORT.FILE_WRITE").count(), 1);
        let content = fs::read_to_string(temp.path().join("B_CASE")).expect("B file");
        assert!(content.contains("COMPDAT"));
    }
}
