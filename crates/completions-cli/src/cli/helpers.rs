use super::CliError;
use completions_core::domain::CompletionError;
use completions_core::model::completions::Completion;
use completions_core::model::grid::GridProvider;
use completions_core::model::project::{Project, ProjectLoadError, load_project};
use completions_core::modules::export::{ExportLog, ExportSummary, LogLevel};
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over `--verbose` when set.
pub(super) fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn load_project_file(path: &Path) -> Result<Project, CliError> {
    load_project(path).map_err(|error| {
        let message = error.to_string();
        let completion_error = match error {
            ProjectLoadError::Io { .. } => CompletionError::io_system("IO.PROJECT_READ", message),
            ProjectLoadError::Parse { .. } => {
                CompletionError::input_validation("INPUT.PROJECT_PARSE", message)
            }
            ProjectLoadError::Invalid(inner) => inner,
        };
        CliError::Compute(completion_error)
    })
}

pub(super) fn render_export_summary(summary: &ExportSummary, log: &ExportLog) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Exported {} connection(s) for {} well(s)",
        summary.completion_count,
        summary.wells_exported.len()
    ));
    if !summary.wells_skipped.is_empty() {
        lines.push(format!("Skipped wells: {}", summary.wells_skipped.join(", ")));
    }
    for path in &summary.files_written {
        lines.push(format!("  wrote {}", path.display()));
    }
    for entry in log.entries() {
        let level = match entry.level {
            LogLevel::Info => continue,
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        };
        lines.push(format!("{level} [{}] {}", entry.code, entry.message));
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InspectReport {
    pub(super) case_name: String,
    pub(super) unit_system: String,
    pub(super) dimensions: [usize; 3],
    pub(super) lgr_count: usize,
    pub(super) wells: Vec<InspectWell>,
    pub(super) simulation_wells: Vec<InspectWell>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InspectWell {
    pub(super) name: String,
    pub(super) md_range: Option<[f64; 2]>,
    pub(super) perforations: usize,
    pub(super) fishbones: usize,
    pub(super) fractures: usize,
    pub(super) valves: usize,
}

pub(super) fn inspect_project(project: &Project) -> InspectReport {
    let case = &project.case;
    let wells = project
        .well_paths
        .iter()
        .map(|well| {
            let mut entry = InspectWell {
                name: well.name.clone(),
                md_range: Some([well.geometry.start_md(), well.geometry.end_md()]),
                perforations: 0,
                fishbones: 0,
                fractures: 0,
                valves: 0,
            };
            for completion in &well.completions {
                match completion {
                    Completion::Perforation(_) => entry.perforations += 1,
                    Completion::Fishbones(_) => entry.fishbones += 1,
                    Completion::Fracture(_) => entry.fractures += 1,
                    Completion::IcdValve(_) => entry.valves += 1,
                }
            }
            entry
        })
        .collect();
    let simulation_wells = project
        .simulation_wells
        .iter()
        .map(|well| InspectWell {
            name: well.name.clone(),
            md_range: None,
            perforations: 0,
            fishbones: 0,
            fractures: well.fractures.len(),
            valves: 0,
        })
        .collect();

    InspectReport {
        case_name: case.case_name().to_string(),
        unit_system: case.unit_system().to_string(),
        dimensions: case.grid_dimensions(0),
        lgr_count: case.grid_count().saturating_sub(1),
        wells,
        simulation_wells,
    }
}

pub(super) fn render_inspect_report(report: &InspectReport) -> String {
    let [ni, nj, nk] = report.dimensions;
    let mut lines = vec![format!(
        "Case {} ({}), {ni} x {nj} x {nk} cells, {} LGR(s)",
        report.case_name, report.unit_system, report.lgr_count
    )];
    for well in &report.wells {
        let range = well
            .md_range
            .map(|[start, end]| format!(" MD {start:.1}-{end:.1}"))
            .unwrap_or_default();
        lines.push(format!(
            "  well path {}{range}: {} perforation(s), {} fishbones, {} fracture(s), {} valve(s)",
            well.name, well.perforations, well.fishbones, well.fractures, well.valves
        ));
    }
    for well in &report.simulation_wells {
        lines.push(format!(
            "  simulation well {}: {} fracture(s)",
            well.name, well.fractures
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::render_export_summary;
    use completions_core::modules::export::{ExportLog, ExportSummary};
    use std::path::PathBuf;

    #[test]
    fn summary_lists_files_and_problems_but_not_info() {
        let summary = ExportSummary {
            files_written: vec![PathBuf::from("out/UnifiedCompletions_CASE")],
            wells_exported: vec!["P1".to_string()],
            wells_skipped: vec!["P2".to_string()],
            completion_count: 4,
        };
        let mut log = ExportLog::default();
        log.info("EXPORT.NO_COMPLETIONS", "quiet");
        log.error("EXPORT.UNIT_MISMATCH", "P2 uses FIELD units");

        let rendered = render_export_summary(&summary, &log);
        assert_eq!(
            rendered,
            "Exported 4 connection(s) for 1 well(s)\n\
             Skipped wells: P2\n  \
             wrote out/UnifiedCompletions_CASE\n\
             ERROR [EXPORT.UNIT_MISMATCH] P2 uses FIELD units"
        );
    }
}
