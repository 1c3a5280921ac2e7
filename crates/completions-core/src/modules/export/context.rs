use crate::domain::{CompletionError, ComputeResult, ExportSettings};
use crate::model::grid::GridProvider;
use crate::modules::transmissibility::fracture::FractureReportItem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub code: &'static str,
    pub message: String,
}

/// Messages collected during one export, mirrored to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct ExportLog {
    entries: Vec<LogEntry>,
}

impl ExportLog {
    pub fn info(&mut self, code: &'static str, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(code, "{message}");
        self.push(LogLevel::Info, code, message);
    }

    pub fn warning(&mut self, code: &'static str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(code, "{message}");
        self.push(LogLevel::Warning, code, message);
    }

    pub fn error(&mut self, code: &'static str, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(code, "{message}");
        self.push(LogLevel::Error, code, message);
    }

    fn push(&mut self, level: LogLevel, code: &'static str, message: String) {
        self.entries.push(LogEntry {
            level,
            code,
            message,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.level == LogLevel::Error)
    }

    pub fn entries_with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a LogEntry> {
        self.entries.iter().filter(move |entry| entry.code == code)
    }
}

/// Shared flag for cooperative cancellation from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressTracker {
    total_steps: usize,
    completed_steps: usize,
    current_stage: String,
}

impl ProgressTracker {
    pub fn begin(&mut self, total_steps: usize) {
        self.total_steps = total_steps;
        self.completed_steps = 0;
        self.current_stage.clear();
    }

    pub fn set_stage(&mut self, stage: impl Into<String>) {
        self.current_stage = stage.into();
        tracing::debug!(stage = %self.current_stage, "export stage");
    }

    pub fn advance(&mut self) {
        self.completed_steps = (self.completed_steps + 1).min(self.total_steps);
    }

    pub fn fraction(&self) -> f64 {
        if self.total_steps == 0 {
            1.0
        } else {
            self.completed_steps as f64 / self.total_steps as f64
        }
    }

    pub fn current_stage(&self) -> &str {
        &self.current_stage
    }
}

/// State threaded through one export run.
pub struct ExportContext<'a> {
    pub case: Option<&'a dyn GridProvider>,
    pub settings: ExportSettings,
    pub log: ExportLog,
    pub progress: ProgressTracker,
    pub cancellation: CancellationToken,
    pub fracture_report: Vec<FractureReportItem>,
    /// Per-cell fracture breakdown, filled when debug info is requested.
    pub fracture_debug: Vec<String>,
}

impl<'a> ExportContext<'a> {
    pub fn new(case: Option<&'a dyn GridProvider>, settings: ExportSettings) -> Self {
        Self {
            case,
            settings,
            log: ExportLog::default(),
            progress: ProgressTracker::default(),
            cancellation: CancellationToken::default(),
            fracture_report: Vec::new(),
            fracture_debug: Vec::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn check_cancelled(&self) -> ComputeResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(CompletionError::cancelled("completion export was cancelled"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CancellationToken, ExportContext, ExportLog, LogLevel, ProgressTracker};
    use crate::domain::{ErrorCategory, ExportSettings};

    #[test]
    fn log_keeps_entries_in_order() {
        let mut log = ExportLog::default();
        log.info("EXPORT.START", "starting");
        log.warning("AGGREGATION.DUPLICATE", "merged");
        log.error("EXPORT.UNIT_MISMATCH", "skipped");

        let levels: Vec<LogLevel> = log.entries().iter().map(|entry| entry.level).collect();
        assert_eq!(levels, vec![LogLevel::Info, LogLevel::Warning, LogLevel::Error]);
        assert!(log.has_errors());
        assert_eq!(log.entries_with_code("AGGREGATION.DUPLICATE").count(), 1);
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let context =
            ExportContext::new(None, ExportSettings::default()).with_cancellation(token.clone());
        assert!(context.check_cancelled().is_ok());

        token.cancel();
        let error = context.check_cancelled().expect_err("cancelled");
        assert_eq!(error.category(), ErrorCategory::Cancelled);
    }

    #[test]
    fn progress_fraction_saturates() {
        let mut progress = ProgressTracker::default();
        progress.begin(2);
        progress.set_stage("W1: perforations");
        progress.advance();
        assert_eq!(progress.fraction(), 0.5);
        progress.advance();
        progress.advance();
        assert_eq!(progress.fraction(), 1.0);
        assert_eq!(progress.current_stage(), "W1: perforations");
    }
}
