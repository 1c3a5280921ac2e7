mod context;
mod file_split;
mod orchestrator;

pub use context::{
    CancellationToken, ExportContext, ExportLog, LogEntry, LogLevel, ProgressTracker,
};
pub use file_split::{ExportFile, ExportFileKind, WellCompletionSet, plan_completion_files};
pub use orchestrator::{ExportProject, ExportSummary, export_completions};
