use super::CliError;
use super::helpers::*;
use anyhow::Context;
use completions_core::domain::{CombinationMode, CompdatExportType, ExportSettings, FileSplit};
use completions_core::model::grid::GridProvider;
use completions_core::modules::export::{ExportContext, ExportProject, export_completions};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub(super) enum FileSplitArg {
    /// All wells in one file
    Unified,
    /// One file per well
    Well,
    /// One file per well and completion type
    WellAndType,
}

impl From<FileSplitArg> for FileSplit {
    fn from(value: FileSplitArg) -> Self {
        match value {
            FileSplitArg::Unified => Self::UnifiedFile,
            FileSplitArg::Well => Self::SplitOnWell,
            FileSplitArg::WellAndType => Self::SplitOnWellAndCompletionType,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub(super) enum CompdatArg {
    /// Write computed transmissibility and kh
    Transmissibilities,
    /// Default TR and KH and write WPIMULT multipliers
    Wpimult,
}

impl From<CompdatArg> for CompdatExportType {
    fn from(value: CompdatArg) -> Self {
        match value {
            CompdatArg::Transmissibilities => Self::TransmissibilitiesAndDefaults,
            CompdatArg::Wpimult => Self::WpimultAndDefaultConnectionFactors,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub(super) enum CombinationArg {
    Individually,
    Combined,
}

impl From<CombinationArg> for CombinationMode {
    fn from(value: CombinationArg) -> Self {
        match value {
            CombinationArg::Individually => Self::Individually,
            CombinationArg::Combined => Self::Combined,
        }
    }
}

#[derive(clap::Args)]
pub(super) struct ExportArgs {
    /// Project JSON with case, wells and export settings
    #[arg(value_name = "PROJECT")]
    project: PathBuf,

    /// Folder the tables are written to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// How completion tables are distributed over files
    #[arg(long, value_enum)]
    file_split: Option<FileSplitArg>,

    /// COMPDAT variant
    #[arg(long, value_enum)]
    compdat: Option<CompdatArg>,

    /// How records of different completion types in one cell are merged
    #[arg(long, value_enum)]
    combination: Option<CombinationArg>,

    /// File name used instead of UnifiedCompletions_<case>
    #[arg(long)]
    file_name: Option<String>,

    /// Only export well paths whose name matches this glob (repeatable)
    #[arg(long = "well", value_name = "PATTERN")]
    wells: Vec<String>,

    /// Time step used to select active perforations
    #[arg(long)]
    time_step: Option<usize>,

    #[command(flatten)]
    toggles: ExportToggles,
}

#[derive(clap::Args, Default)]
pub(super) struct ExportToggles {
    /// Skip perforation intervals
    #[arg(long)]
    no_perforations: bool,

    /// Skip fishbones subs
    #[arg(long)]
    no_fishbones: bool,

    /// Skip fractures
    #[arg(long)]
    no_fractures: bool,

    /// Write WELSEGS, COMPSEGS and WSEGVALV files
    #[arg(long)]
    msw: bool,

    /// Write a WELSPECS table ahead of COMPDAT
    #[arg(long)]
    welspecs: bool,

    /// Omit the comment lines naming the source of each record
    #[arg(long)]
    no_source_comments: bool,

    /// Write the per-cell fracture transmissibility breakdown
    #[arg(long)]
    fracture_debug: bool,

    /// Leave fishbones main bore cells out of COMPDAT and MSW
    #[arg(long)]
    exclude_main_bore: bool,
}

#[derive(clap::Args)]
pub(super) struct InspectArgs {
    /// Project JSON with case, wells and export settings
    #[arg(value_name = "PROJECT")]
    project: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

impl ExportArgs {
    /// Command line values override what the project file sets.
    fn apply(&self, settings: &mut ExportSettings) {
        if let Some(output) = &self.output {
            settings.folder = output.clone();
        }
        if let Some(split) = self.file_split {
            settings.file_split = split.into();
        }
        if let Some(compdat) = self.compdat {
            settings.compdat_export = compdat.into();
        }
        if let Some(combination) = self.combination {
            settings.combination_mode = combination.into();
        }
        if let Some(file_name) = &self.file_name {
            settings.custom_file_name = Some(file_name.clone());
        }
        if !self.wells.is_empty() {
            settings.well_filters = self.wells.clone();
        }
        if let Some(time_step) = self.time_step {
            settings.time_step = time_step;
        }

        let toggles = &self.toggles;
        settings.include_perforations &= !toggles.no_perforations;
        settings.include_fishbones &= !toggles.no_fishbones;
        settings.include_fractures &= !toggles.no_fractures;
        settings.include_msw |= toggles.msw;
        settings.export_welspecs |= toggles.welspecs;
        settings.export_data_source_as_comment &= !toggles.no_source_comments;
        settings.include_fracture_debug_info |= toggles.fracture_debug;
        settings.exclude_main_bore_for_fishbones |= toggles.exclude_main_bore;
    }
}

pub(super) fn run_export_command(args: ExportArgs) -> Result<i32, CliError> {
    let mut project = load_project_file(&args.project)?;
    args.apply(&mut project.settings);

    let export_project = ExportProject {
        well_paths: &project.well_paths,
        simulation_wells: &project.simulation_wells,
        fracture_templates: &project.fracture_templates,
    };
    let case: &dyn GridProvider = &project.case;
    let mut context = ExportContext::new(Some(case), project.settings.clone());
    let summary = export_completions(&export_project, &mut context).map_err(CliError::Compute)?;

    println!("{}", render_export_summary(&summary, &context.log));
    Ok(0)
}

pub(super) fn run_inspect_command(args: InspectArgs) -> Result<i32, CliError> {
    let project = load_project_file(&args.project)?;
    let report = inspect_project(&project);
    if args.json {
        let json = serde_json::to_string_pretty(&report).with_context(|| {
            format!("failed to serialize inspect report for '{}'", args.project.display())
        })?;
        println!("{json}");
    } else {
        println!("{}", render_inspect_report(&report));
    }
    tracing::debug!(case = %project.case.case_name(), "inspected project");
    Ok(0)
}
